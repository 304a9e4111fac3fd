// ==========================================
// 订单齐套放行分析系统 - 领域类型定义
// ==========================================
// 数量统一使用带符号定点数: 可用量允许为负（已承诺需求超过库存）
// 工时只用于展示与比较, 仍为 f64
// ==========================================

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 数量（库存/需求/到货）
pub type Quantity = Decimal;

/// 数量文本: 去掉末尾多余的 0
pub fn format_qty(qty: Quantity) -> String {
    qty.normalize().to_string()
}

/// 数量转 f64（指标/工时计算用）
pub fn qty_to_f64(qty: Quantity) -> f64 {
    qty.to_f64().unwrap_or(0.0)
}

// ==========================================
// 放行状态 (Allocation Status)
// ==========================================
// 终态: 同一轮运行内一经产生不再修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Released, // 全部组件齐套,已预留
    Held,     // 存在缺料,整单挂起
    Skipped,  // 输入无效,不参与分配
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Released => "RELEASED",
            AllocationStatus::Held => "HELD",
            AllocationStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 数量单元格 (Quantity Cell)
// ==========================================
// 原始关系中的数量字段: 可能缺失, 也可能无法解析
// 是否致命由使用方决定（需求数量按 0 处理, BOM 数量按行级缺陷处理）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QtyCell {
    Value(Quantity),
    Missing,
    Invalid(String),
}

impl QtyCell {
    /// 从原始文本解析（允许千分位逗号）
    pub fn parse(raw: Option<&str>) -> Self {
        let text = match raw.map(str::trim) {
            Some(t) if !t.is_empty() && !t.eq_ignore_ascii_case("nan") => t,
            _ => return QtyCell::Missing,
        };

        let digits = text.replace(',', "");
        match Decimal::from_str(&digits).or_else(|_| Decimal::from_scientific(&digits)) {
            Ok(v) => QtyCell::Value(v),
            Err(_) => QtyCell::Invalid(text.to_string()),
        }
    }

    /// 缺失按 0, 非法值按 0
    pub fn or_zero(&self) -> Quantity {
        match self {
            QtyCell::Value(v) => *v,
            _ => Decimal::ZERO,
        }
    }
}

impl fmt::Display for QtyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QtyCell::Value(v) => write!(f, "{}", v),
            QtyCell::Missing => write!(f, "<missing>"),
            QtyCell::Invalid(raw) => write!(f, "<invalid:{}>", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> Quantity {
        text.parse().unwrap()
    }

    #[test]
    fn test_qty_cell_parse() {
        assert_eq!(QtyCell::parse(Some(" 12 ")), QtyCell::Value(q("12")));
        assert_eq!(QtyCell::parse(Some("1,250.5")), QtyCell::Value(q("1250.5")));
        assert_eq!(QtyCell::parse(Some("1.5e2")), QtyCell::Value(q("150")));
        assert_eq!(QtyCell::parse(Some("")), QtyCell::Missing);
        assert_eq!(QtyCell::parse(Some("NaN")), QtyCell::Missing);
        assert_eq!(QtyCell::parse(None), QtyCell::Missing);
        assert_eq!(
            QtyCell::parse(Some("abc")),
            QtyCell::Invalid("abc".to_string())
        );
    }

    #[test]
    fn test_format_qty() {
        assert_eq!(format_qty(q("4.00")), "4");
        assert_eq!(format_qty(q("-3")), "-3");
        assert_eq!(format_qty(q("2.50")), "2.5");
    }

    #[test]
    fn test_decimal_subtraction_is_exact() {
        let left = q("0.3") - q("0.1");
        assert_eq!(left, q("0.2"));
        assert!(left >= q("0.2"));
        assert_eq!(qty_to_f64(q("0.25")), 0.25);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AllocationStatus::Released.to_string(), "RELEASED");
        assert_eq!(AllocationStatus::Held.to_string(), "HELD");
        assert_eq!(AllocationStatus::Skipped.to_string(), "SKIPPED");
    }
}
