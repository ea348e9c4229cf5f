//! Coin rewards for confirmed receipts.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::shared::Money;

/// Minimum coins granted per completed sub-order.
pub const REWARD_FLOOR: u32 = 10;
/// Maximum coins granted per completed sub-order.
pub const REWARD_CAP: u32 = 500;
/// Fraction of the sub-order total converted to coins.
const REWARD_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Coins for one completed sub-order: `min(500, max(10, floor(total * 0.01)))`.
#[must_use]
pub fn coin_reward(total: Money) -> u32 {
    let raw = (total.amount() * REWARD_RATE).floor();
    let coins = raw.to_u32().unwrap_or(REWARD_CAP);
    coins.clamp(REWARD_FLOOR, REWARD_CAP)
}
