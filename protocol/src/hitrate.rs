//! Hit-rate math shared by every protocol and the team resolver

use rand::Rng;

use crate::types::Attribute;

/// Raw power granted to the advantaged side (DM20 family and DMX)
pub const ATTRIBUTE_POWER_BONUS: u32 = 32;

/// Hit-rate points granted or removed by attribute (DMC and team battles)
pub const ATTRIBUTE_HIT_POINTS: f64 = 5.0;

/// `power * 100 / (power + opponent_power) + adjustment - handicap`,
/// clamped to `[0, 100]`. Two powerless combatants split evenly.
pub fn hit_rate(power: u32, opponent_power: u32, adjustment: f64, handicap: u32) -> f64 {
    let total = power as f64 + opponent_power as f64;
    let base = if total == 0.0 {
        50.0
    } else {
        power as f64 * 100.0 / total
    };
    (base + adjustment - handicap as f64).clamp(0.0, 100.0)
}

/// Flat adjustment for `own` attacking `opponent`: +5, -5 or 0
pub fn attribute_points(own: Attribute, opponent: Attribute) -> f64 {
    if own.beats(opponent) {
        ATTRIBUTE_HIT_POINTS
    } else if opponent.beats(own) {
        -ATTRIBUTE_HIT_POINTS
    } else {
        0.0
    }
}

/// Powers after the advantaged side receives [`ATTRIBUTE_POWER_BONUS`]
pub fn advantaged_powers(
    own_power: u32,
    own: Attribute,
    opponent_power: u32,
    opponent: Attribute,
) -> (u32, u32) {
    if own.beats(opponent) {
        (own_power.saturating_add(ATTRIBUTE_POWER_BONUS), opponent_power)
    } else if opponent.beats(own) {
        (own_power, opponent_power.saturating_add(ATTRIBUTE_POWER_BONUS))
    } else {
        (own_power, opponent_power)
    }
}

/// Hit rate for the DM20 family and DMX (power bonus model)
pub fn bonus_hit_rate(
    own_power: u32,
    own: Attribute,
    opponent_power: u32,
    opponent: Attribute,
    handicap: u32,
) -> f64 {
    let (own_power, opponent_power) = advantaged_powers(own_power, own, opponent_power, opponent);
    hit_rate(own_power, opponent_power, 0.0, handicap)
}

/// Hit rate for DMC and team battles (flat points model)
pub fn points_hit_rate(
    own_power: u32,
    own: Attribute,
    opponent_power: u32,
    opponent: Attribute,
    handicap: u32,
) -> f64 {
    hit_rate(
        own_power,
        opponent_power,
        attribute_points(own, opponent),
        handicap,
    )
}

/// Draw `uniform(0, 99)` and compare against the hit rate
pub fn roll_hit<R: Rng + ?Sized>(rng: &mut R, hitrate: f64) -> bool {
    (rng.gen_range(0..100u32) as f64) < hitrate
}
