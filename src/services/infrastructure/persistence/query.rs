// 测试记录查询条件构建

use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Select};

use crate::models::entities::test_record;
use crate::models::structs::{AlertFilter, RecordQuery};
use crate::models::entities::alert;

/// 取文本开头的整数部分，无数字时为 None
///
/// 搜索框输入 "12号" 时按地址 12 匹配
pub fn leading_integer(text: &str) -> Option<i32> {
    let text = text.trim_start();
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        let sign_ok = idx == 0 && (ch == '-' || ch == '+');
        if ch.is_ascii_digit() || sign_ok {
            end = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    text[..end].parse().ok()
}

/// 由查询条件生成过滤条件（不含分页）
pub fn record_condition(query: &RecordQuery) -> Condition {
    let mut cond = Condition::all();

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        // 设备类型模糊匹配，或设备地址等于输入的整数值（非数字按0处理）
        let address = leading_integer(term).unwrap_or(0);
        cond = cond.add(
            Condition::any()
                .add(test_record::Column::DeviceType.contains(term))
                .add(test_record::Column::DeviceAddress.eq(address)),
        );
    }
    if let Some(device_type) = &query.device_type {
        cond = cond.add(test_record::Column::DeviceType.eq(device_type.clone()));
    }
    if let Some(address) = query.device_address {
        cond = cond.add(test_record::Column::DeviceAddress.eq(address));
    }
    if let Some(result) = &query.test_result {
        cond = cond.add(test_record::Column::TestResult.eq(result.clone()));
    }
    if let Some(batch_id) = &query.batch_id {
        cond = cond.add(test_record::Column::BatchId.eq(batch_id.clone()));
    }
    if let Some(from) = query.date_from {
        cond = cond.add(test_record::Column::TestDate.gte(from));
    }
    if let Some(to) = query.date_to {
        cond = cond.add(test_record::Column::TestDate.lte(to));
    }
    cond
}

/// 带过滤和排序的查询
pub fn record_select(query: &RecordQuery) -> Select<test_record::Entity> {
    let select = test_record::Entity::find().filter(record_condition(query));
    if query.ascending {
        select.order_by_asc(test_record::Column::TestDate)
    } else {
        select.order_by_desc(test_record::Column::TestDate)
    }
}

/// 告警过滤，按告警时间降序
pub fn alert_select(filter: &AlertFilter) -> Select<alert::Entity> {
    let mut cond = Condition::all();
    if let Some(severity) = filter.severity {
        cond = cond.add(alert::Column::Severity.eq(severity.to_string()));
    }
    if let Some(acknowledged) = filter.acknowledged {
        cond = cond.add(alert::Column::Acknowledged.eq(acknowledged));
    }
    if let Some(resolved) = filter.resolved {
        cond = cond.add(alert::Column::Resolved.eq(resolved));
    }
    alert::Entity::find()
        .filter(cond)
        .order_by_desc(alert::Column::AlertTime)
}

/// 页码从1开始，0按1处理
pub fn page_offset(page: u64, page_size: u64) -> u64 {
    page.max(1).saturating_sub(1).saturating_mul(page_size)
}
