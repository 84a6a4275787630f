//! Delivery eligibility

use crate::{cart::DeliveryType, catalog::Restaurant};

/// Result of the minimum-order check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryCheck {
    /// Whether the order may be placed with this delivery type
    pub met: bool,

    /// How much more (after discount) the customer must spend, in minor units
    pub shortfall: u64,
}

impl DeliveryCheck {
    /// A check that always passes.
    pub const MET: Self = Self {
        met: true,
        shortfall: 0,
    };
}

/// Compare the discounted subtotal against the restaurant's delivery minimum.
///
/// Collection orders always pass.
pub fn check_minimum(
    delivery_type: DeliveryType,
    restaurant: &Restaurant,
    subtotal_after_discount: u64,
) -> DeliveryCheck {
    match delivery_type {
        DeliveryType::Collection => DeliveryCheck::MET,
        DeliveryType::Delivery => {
            let shortfall = restaurant
                .minimum_delivery
                .saturating_sub(subtotal_after_discount);

            DeliveryCheck {
                met: shortfall == 0,
                shortfall,
            }
        }
    }
}

/// Fee charged for `delivery_type`. Collection is free.
pub fn delivery_fee(delivery_type: DeliveryType, restaurant: &Restaurant) -> u64 {
    match delivery_type {
        DeliveryType::Delivery => restaurant.delivery_fee,
        DeliveryType::Collection => 0,
    }
}
