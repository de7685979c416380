use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::world::resources::ResourceKind;

/// Village store. Every resource kind shares one per-kind capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stockpile {
    capacity: f64,
    amounts: BTreeMap<ResourceKind, f64>,
}

impl Stockpile {
    pub fn new(capacity: f64) -> Self {
        Self {
            capacity: capacity.max(0.0),
            amounts: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Change the per-kind limit; stored amounts above it are cut down.
    pub fn set_capacity(&mut self, capacity: f64) {
        self.capacity = capacity.max(0.0);
        for amount in self.amounts.values_mut() {
            *amount = amount.min(self.capacity);
        }
    }

    pub fn amount(&self, kind: ResourceKind) -> f64 {
        self.amounts.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn free_space(&self, kind: ResourceKind) -> f64 {
        (self.capacity - self.amount(kind)).max(0.0)
    }

    /// Store up to `amount`; returns what fit.
    pub fn deposit(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        let accepted = amount.max(0.0).min(self.free_space(kind));
        if accepted > 0.0 {
            *self.amounts.entry(kind).or_insert(0.0) += accepted;
        }
        accepted
    }

    /// Remove up to `amount`; returns what was available.
    pub fn consume(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        let used = amount.max(0.0).min(self.amount(kind));
        if used > 0.0 {
            *self.amounts.entry(kind).or_insert(0.0) -= used;
        }
        used
    }

    pub fn total(&self) -> f64 {
        self.amounts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_clamps_to_capacity() {
        let mut s = Stockpile::new(50.0);
        assert_eq!(s.deposit(ResourceKind::Wood, 30.0), 30.0);
        assert_eq!(s.deposit(ResourceKind::Wood, 30.0), 20.0);
        assert_eq!(s.amount(ResourceKind::Wood), 50.0);
        assert_eq!(s.deposit(ResourceKind::Wood, 1.0), 0.0);
        // Capacity is per kind.
        assert_eq!(s.deposit(ResourceKind::Stone, 10.0), 10.0);
    }

    #[test]
    fn consume_never_goes_negative() {
        let mut s = Stockpile::new(100.0);
        s.deposit(ResourceKind::Food, 12.0);
        assert_eq!(s.consume(ResourceKind::Food, 5.0), 5.0);
        assert_eq!(s.consume(ResourceKind::Food, 50.0), 7.0);
        assert_eq!(s.amount(ResourceKind::Food), 0.0);
        assert_eq!(s.consume(ResourceKind::Water, 1.0), 0.0);
    }

    #[test]
    fn shrinking_capacity_trims_stock() {
        let mut s = Stockpile::new(100.0);
        s.deposit(ResourceKind::Wood, 80.0);
        s.deposit(ResourceKind::Food, 10.0);
        s.set_capacity(40.0);
        assert_eq!(s.amount(ResourceKind::Wood), 40.0);
        assert_eq!(s.amount(ResourceKind::Food), 10.0);
        assert_eq!(s.free_space(ResourceKind::Wood), 0.0);
    }

    #[test]
    fn negative_amounts_are_ignored() {
        let mut s = Stockpile::new(10.0);
        assert_eq!(s.deposit(ResourceKind::Stone, -4.0), 0.0);
        s.deposit(ResourceKind::Stone, 4.0);
        assert_eq!(s.consume(ResourceKind::Stone, -4.0), 0.0);
        assert_eq!(s.total(), 4.0);
    }
}
