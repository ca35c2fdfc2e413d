pub mod live_ws_handler;
