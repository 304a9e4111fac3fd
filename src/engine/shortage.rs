// ==========================================
// 订单齐套放行分析系统 - 缺料到货匹配
// ==========================================
// 策略: 首次适配 (first-fit)
// - 到货记录按承诺日期升序, 排除基准日之前的记录
// - 返回第一条 到货数量 >= 缺口 的记录
// - 不做日期/数量的全局权衡
// ==========================================

use crate::domain::allocation::SupplyRef;
use crate::domain::relations::SupplyRecord;
use crate::domain::types::Quantity;
use chrono::NaiveDate;
use std::collections::HashMap;

// ==========================================
// ShortageResolver - 只读到货索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ShortageResolver {
    by_part: HashMap<String, Vec<SupplyRecord>>,
    as_of: Option<NaiveDate>,
}

impl ShortageResolver {
    /// 构建到货索引
    ///
    /// # 参数
    /// - `records`: 采购到货记录（顺序不限）
    /// - `as_of`: 基准日, 承诺日期早于该日的记录被排除
    pub fn new(records: &[SupplyRecord], as_of: NaiveDate) -> Self {
        let mut by_part: HashMap<String, Vec<SupplyRecord>> = HashMap::new();
        for record in records.iter().filter(|r| r.promised_date >= as_of) {
            by_part
                .entry(record.part.clone())
                .or_default()
                .push(record.clone());
        }

        // 稳定排序: 同日记录保持输入顺序
        for list in by_part.values_mut() {
            list.sort_by_key(|r| r.promised_date);
        }

        Self {
            by_part,
            as_of: Some(as_of),
        }
    }

    /// 无到货数据（所有缺口均无匹配）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_of(&self) -> Option<NaiveDate> {
        self.as_of
    }

    /// 物料的有效到货记录（升序）
    pub fn supply_for(&self, part: &str) -> &[SupplyRecord] {
        self.by_part.get(part).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 查找第一条可覆盖缺口的到货
    pub fn resolve(&self, part: &str, shortfall: Quantity) -> Option<SupplyRef> {
        self.supply_for(part)
            .iter()
            .find(|r| r.qty_due >= shortfall)
            .map(|r| SupplyRef {
                po_number: r.po_number.clone(),
                qty_due: r.qty_due,
                promised_date: r.promised_date,
            })
    }
}
