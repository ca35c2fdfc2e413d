// 数据库实体定义（SeaORM）
//
// 每个实体对应一张 SQLite 表，表结构由 `Schema::create_table_from_entity` 生成

pub mod test_record;
pub mod import_batch;
pub mod device;
pub mod simulation_config;
pub mod alert;
pub mod system_config;
pub mod analysis_result;

/// JSON 值序列化为文本列
pub(crate) fn json_to_text(value: &Option<serde_json::Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

/// 文本列解析为 JSON 值，解析失败视为空
pub(crate) fn text_to_json(text: &Option<String>) -> Option<serde_json::Value> {
    text.as_ref().and_then(|s| serde_json::from_str(s).ok())
}
