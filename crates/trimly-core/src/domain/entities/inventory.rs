//! Stock items held by a salon.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{InventoryItemId, SalonId, TrimlyError, TrimlyResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub salon_id: SalonId,
    pub name: String,
    /// Unique within the salon.
    pub sku: String,
    pub unit: String,
    pub quantity: i32,
    pub reorder_level: i32,
    pub unit_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        salon_id: SalonId,
        name: String,
        sku: String,
        unit: String,
        quantity: i32,
        reorder_level: i32,
        unit_cost: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InventoryItemId::new(),
            salon_id,
            name,
            sku,
            unit,
            quantity,
            reorder_level,
            unit_cost,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity after a stock movement, or `None` when it would drop below zero.
    pub fn quantity_after(&self, delta: i32) -> TrimlyResult<Option<i32>> {
        let next = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| TrimlyError::validation("Stock adjustment out of range"))?;
        Ok((next >= 0).then_some(next))
    }

    /// Rejection for a movement larger than the stock on hand.
    #[must_use]
    pub fn insufficient_stock(&self, delta: i32) -> TrimlyError {
        TrimlyError::business_rule(format!(
            "Insufficient stock for {}: have {}, requested {}",
            self.sku,
            self.quantity,
            delta.unsigned_abs()
        ))
    }

    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item() -> InventoryItem {
        InventoryItem::new(
            SalonId::new(),
            "Shampoo".into(),
            "SH-500".into(),
            "bottle".into(),
            10,
            3,
            dec!(4.50),
            Utc::now(),
        )
    }

    #[test]
    fn test_quantity_after_movement() {
        let item = item();
        assert_eq!(item.quantity_after(-7).unwrap(), Some(3));
        assert_eq!(item.quantity_after(-10).unwrap(), Some(0));
        assert_eq!(item.quantity_after(-11).unwrap(), None);
        assert_eq!(item.quantity_after(i32::MAX).unwrap_err().status_code(), 400);

        let err = item.insufficient_stock(-11);
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("have 10, requested 11"));
    }

    #[test]
    fn test_low_stock_threshold() {
        let mut item = item();
        assert!(!item.is_low_stock());
        item.quantity = 3;
        assert!(item.is_low_stock());
    }
}
