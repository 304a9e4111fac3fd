// ==========================================
// 订单齐套放行分析系统 - 库存台账
// ==========================================
// 单轮运行内唯一的共享可变资源
// 每轮运行持有独立副本（snapshot），不同运行之间互不可见
// ==========================================

use crate::domain::types::Quantity;
use std::collections::HashMap;

// ==========================================
// StockLedger - 物料号 → 可用量
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockLedger {
    quantities: HashMap<String, Quantity>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由在库库存与已承诺需求构建初始台账
    ///
    /// 可用量 = Σ在库 - Σ已承诺; 仅有承诺而无库存的物料为负数
    pub fn seed(
        on_hand: &HashMap<String, Quantity>,
        committed: &HashMap<String, Quantity>,
    ) -> Self {
        let mut quantities = on_hand.clone();
        for (part, qty) in committed {
            *quantities.entry(part.clone()).or_insert(Quantity::ZERO) -= *qty;
        }
        Self { quantities }
    }

    /// 可用量（未登记的物料为 0）
    pub fn get(&self, part: &str) -> Quantity {
        self.quantities.get(part).copied().unwrap_or(Quantity::ZERO)
    }

    /// 扣减可用量（原地修改）
    ///
    /// 调用方必须先完成可行性检查
    pub fn decrement(&mut self, part: &str, qty: Quantity) {
        *self.quantities.entry(part.to_string()).or_insert(Quantity::ZERO) -= qty;
    }

    /// 独立副本（新一轮运行使用）
    pub fn snapshot(&self) -> StockLedger {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Quantity)> {
        self.quantities.iter()
    }
}

impl FromIterator<(String, Quantity)> for StockLedger {
    fn from_iter<I: IntoIterator<Item = (String, Quantity)>>(iter: I) -> Self {
        let mut quantities = HashMap::new();
        for (part, qty) in iter {
            *quantities.entry(part).or_insert(Quantity::ZERO) += qty;
        }
        Self { quantities }
    }
}
