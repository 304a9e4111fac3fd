// ==========================================
// 订单齐套放行分析系统 - 输入关系映射器
// ==========================================
// 职责: 原始行 → 强类型记录 + 必需列校验
// 规则:
// - 必需列缺失 → MissingColumns（致命）
// - 单元格无法解析 → 记录为缺失/非法值, 由引擎按行级缺陷处理
// ==========================================

use crate::domain::relations::{
    ComponentDemandRecord, DemandRecord, InputRelations, LaborStandardRecord, RawRelation,
    RawRelations, RawRow, RelationKind, StockRecord, SupplyRecord,
};
use crate::domain::types::{qty_to_f64, QtyCell};
use crate::importer::error::{ImportError, ImportResult};
use chrono::{NaiveDate, NaiveDateTime};

/// 支持的日期格式
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

pub struct RelationMapper;

impl RelationMapper {
    // ==========================================
    // Schema 校验
    // ==========================================

    /// 校验所有关系的必需列
    ///
    /// 既无表头也无数据行的关系视为空关系, 不做校验
    pub fn validate(relations: &RawRelations) -> ImportResult<()> {
        for kind in RelationKind::ALL {
            Self::validate_relation(kind, relations.get(kind))?;
        }
        Ok(())
    }

    fn validate_relation(kind: RelationKind, relation: &RawRelation) -> ImportResult<()> {
        if relation.columns.is_empty() && relation.rows.is_empty() {
            return Ok(());
        }

        let missing: Vec<String> = kind
            .required_columns()
            .iter()
            .filter(|c| !relation.has_column(c))
            .map(|c| c.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns {
                relation: kind.as_str().to_string(),
                columns: missing,
            })
        }
    }

    // ==========================================
    // 映射
    // ==========================================

    /// 校验后映射全部关系
    pub fn map(relations: &RawRelations) -> ImportResult<InputRelations> {
        Self::validate(relations)?;

        Ok(InputRelations {
            demand: relations.demand.rows.iter().map(Self::map_demand).collect(),
            planned_demand: relations
                .planned_demand
                .rows
                .iter()
                .map(Self::map_component_demand)
                .collect(),
            committed_demand: relations
                .committed_demand
                .rows
                .iter()
                .map(Self::map_component_demand)
                .collect(),
            stock: relations.stock.rows.iter().filter_map(Self::map_stock).collect(),
            labor_standards: relations
                .labor_standards
                .rows
                .iter()
                .filter_map(Self::map_labor_standard)
                .collect(),
            purchase_orders: relations
                .purchase_orders
                .rows
                .iter()
                .filter_map(Self::map_supply)
                .collect(),
        })
    }

    pub fn map_demand(row: &RawRow) -> DemandRecord {
        DemandRecord {
            order_id: get_string(row, "SO No").map(|s| normalize_order_id(&s)),
            part: get_string(row, "Part No"),
            planner: get_string(row, "Planner"),
            start_date: get_string(row, "Start Date").and_then(|s| parse_date(&s)),
            demand_qty: QtyCell::parse(row.get("Rev Qty Due").map(String::as_str)),
        }
    }

    pub fn map_component_demand(row: &RawRow) -> ComponentDemandRecord {
        ComponentDemandRecord {
            order_id: get_string(row, "SO Number").map(|s| normalize_order_id(&s)),
            component_part: get_string(row, "Component Part Number"),
            required_qty: QtyCell::parse(row.get("Component Qty Required").map(String::as_str)),
        }
    }

    /// 无物料号的库存行丢弃; 非法数量按 0 并告警
    pub fn map_stock(row: &RawRow) -> Option<StockRecord> {
        let part = get_string(row, "PART_NO")?;
        let cell = QtyCell::parse(row.get("Available Qty").map(String::as_str));
        if let QtyCell::Invalid(raw) = &cell {
            tracing::warn!(part = %part, value = %raw, "库存数量无法解析, 按 0 处理");
        }
        Some(StockRecord {
            part,
            available_qty: cell.or_zero(),
        })
    }

    pub fn map_labor_standard(row: &RawRow) -> Option<LaborStandardRecord> {
        let part = get_string(row, "PART_NO")?;
        let cell = QtyCell::parse(row.get("Hours per Unit").map(String::as_str));
        if let QtyCell::Invalid(raw) = &cell {
            tracing::warn!(part = %part, value = %raw, "单位工时无法解析, 按 0 处理");
        }
        Some(LaborStandardRecord {
            part,
            hours_per_unit: qty_to_f64(cell.or_zero()),
        })
    }

    /// 日期或数量不可用的到货行丢弃
    pub fn map_supply(row: &RawRow) -> Option<SupplyRecord> {
        let part = get_string(row, "Part Number")?;
        let promised_date = get_string(row, "Promised Due Date").and_then(|s| parse_date(&s))?;
        let qty_due = match QtyCell::parse(row.get("Qty Due").map(String::as_str)) {
            QtyCell::Value(v) => v,
            _ => return None,
        };
        Some(SupplyRecord {
            po_number: get_string(row, "PO Number").map(|s| normalize_order_id(&s)),
            part,
            qty_due,
            promised_date,
        })
    }
}

// ==========================================
// 字段解析辅助
// ==========================================

/// 提取字符串字段（空白/NaN/None 视为缺失）
pub fn get_string(row: &RawRow, key: &str) -> Option<String> {
    let value = row.get(key)?.trim();
    if value.is_empty()
        || value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("none")
        || value.eq_ignore_ascii_case("null")
    {
        None
    } else {
        Some(value.to_string())
    }
}

/// 规范化订单号: 去除表格软件把整数写成浮点后的 ".0" 尾巴
pub fn normalize_order_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(head) = trimmed.strip_suffix(".0") {
        if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) {
            return head.to_string();
        }
    }
    trimmed.to_string()
}

/// 解析日期（无法解析返回 None）
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}
