// ==========================================
// 订单齐套放行分析系统 - 指标格式化
// ==========================================
// number: 千分位（整数不带小数）
// hours: 千分位 + 1 位小数
// percentage: 1 位小数 + "%"
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFormat {
    Number,
    Hours,
    Percentage,
}

/// 格式化指标值（非有限值输出 "0"）
pub fn format_metric(value: f64, format: MetricFormat) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    match format {
        MetricFormat::Number => {
            if value.fract() == 0.0 {
                group_thousands(&format!("{:.0}", value))
            } else {
                group_thousands(&value.to_string())
            }
        }
        MetricFormat::Hours => group_thousands(&format!("{:.1}", value)),
        MetricFormat::Percentage => format!("{:.1}%", value),
    }
}

/// 占比（分母为 0 时为 0）
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// 整数部分插入千分位逗号
fn group_thousands(formatted: &str) -> String {
    let (sign, body) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match body.find('.') {
        Some(pos) => body.split_at(pos),
        None => (body, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", sign, grouped, frac_part)
}
