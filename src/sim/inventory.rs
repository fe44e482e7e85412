use std::collections::HashMap;

use crate::types::{SkuId, SkuParams};
use crate::utils::prelude::*;

/// Stock state of one SKU, derived from its quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    /// quantity above the reorder point
    Stocked,
    /// quantity positive but at or below the reorder point
    Low,
    /// nothing on hand
    Empty,
}

/// Outcome of a fulfillment request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fulfillment {
    /// SKU has no ledger entry; treated as unlimited virtual stock
    Untracked,
    /// full requested quantity decremented
    Full,
    /// only this many were on hand; they were consumed
    Partial(u32),
    /// nothing on hand, nothing consumed
    Empty,
}

#[derive(Debug, Clone)]
struct Slot {
    sku: SkuId,
    on_hand: u32,
    max_pieces: u32,
    reorder_point: u32,
}

impl Slot {
    fn level(&self) -> StockLevel {
        if self.on_hand == 0 {
            StockLevel::Empty
        } else if self.on_hand <= self.reorder_point {
            StockLevel::Low
        } else {
            StockLevel::Stocked
        }
    }
}

/// Per-SKU stock ledger. The id -> index table is built once at
/// construction; the pick path then works on a fixed indexed array.
/// Invariant on every path: `0 <= on_hand <= max_pieces`.
#[derive(Debug, Clone)]
pub struct Inventory {
    index: HashMap<SkuId, usize>,
    slots: Vec<Slot>,
}

impl Inventory {
    pub fn new(params: impl IntoIterator<Item = SkuParams>) -> Result<Self> {
        let mut index = HashMap::new();
        let mut slots = Vec::new();
        for p in params {
            if p.max_pieces == 0 {
                return Err(Error::Model(format!("sku {}: max quantity must be positive", p.sku)));
            }
            if p.reorder_point >= p.max_pieces {
                return Err(Error::Model(format!(
                    "sku {}: reorder point {} must be below max {}",
                    p.sku, p.reorder_point, p.max_pieces
                )));
            }
            if p.initial_pieces > p.max_pieces {
                return Err(Error::Model(format!(
                    "sku {}: initial quantity {} exceeds max {}",
                    p.sku, p.initial_pieces, p.max_pieces
                )));
            }
            if index.insert(p.sku.clone(), slots.len()).is_some() {
                return Err(Error::Model(format!("sku {}: duplicate parameter record", p.sku)));
            }
            slots.push(Slot {
                sku: p.sku,
                on_hand: p.initial_pieces,
                max_pieces: p.max_pieces,
                reorder_point: p.reorder_point,
            });
        }
        Ok(Self { index, slots })
    }

    /// Atomic check-and-decrement for one pick. The cooperative scheduler
    /// guarantees no other process runs between the check and the
    /// decrement, since this never crosses a suspension point.
    pub fn check_and_pick(&mut self, sku: &SkuId, quantity: u32) -> Fulfillment {
        let idx = match self.index.get(sku) {
            Some(idx) => *idx,
            None => return Fulfillment::Untracked,
        };
        let slot = &mut self.slots[idx];
        if slot.on_hand >= quantity {
            slot.on_hand -= quantity;
            Fulfillment::Full
        } else if slot.on_hand > 0 {
            let granted = slot.on_hand;
            slot.on_hand = 0;
            Fulfillment::Partial(granted)
        } else {
            Fulfillment::Empty
        }
    }

    /// Restock every SKU at or below its reorder point to max. Returns the
    /// SKUs touched, in ledger order.
    pub(crate) fn restock_below_reorder(&mut self) -> Vec<SkuId> {
        self.slots
            .iter_mut()
            .filter(|s| s.on_hand <= s.reorder_point)
            .map(|s| {
                s.on_hand = s.max_pieces;
                s.sku.clone()
            })
            .collect()
    }

    pub fn level(&self, sku: &SkuId) -> Option<StockLevel> {
        self.index.get(sku).map(|idx| self.slots[*idx].level())
    }

    pub fn on_hand(&self, sku: &SkuId) -> Option<u32> {
        self.index.get(sku).map(|idx| self.slots[*idx].on_hand)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True when every slot satisfies `0 <= on_hand <= max_pieces`
    pub fn invariant_holds(&self) -> bool {
        self.slots.iter().all(|s| s.on_hand <= s.max_pieces)
    }
}
