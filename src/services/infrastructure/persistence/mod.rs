/// 数据持久化模块
///
/// 基于 SeaORM + SQLite 的存储实现，以及测试记录的查询条件构建

pub mod query;
pub mod sqlite_orm_persistence_service;


pub use sqlite_orm_persistence_service::SqliteOrmPersistenceService;
