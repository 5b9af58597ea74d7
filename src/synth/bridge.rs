//! Brownian bridge tick path generator
//!
//! B(i) = open + W(i) - (i/T) * (W(T) - (close - open))
//! where W is a discrete Wiener path built from standard-normal increments.
//! The correction term removes the walk's net drift mismatch so the path
//! lands on the close exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use statrs::distribution::Normal;

/// Generates intra-bar tick prices constrained to a bar's OHLC envelope.
///
/// The path starts exactly at `open`, ends exactly at `close`, and every
/// intermediate tick is clamped into `[low, high]`. Prices are rounded to
/// two decimal places.
pub struct TickSynthesizer {
    rng: StdRng,
    normal: Normal,
}

impl TickSynthesizer {
    /// Create a synthesizer with a fresh random source
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a seeded synthesizer producing a reproducible path
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let normal = Normal::new(0.0, 1.0).expect("unit normal is a valid distribution");
        Self { rng, normal }
    }

    /// Generate `tick_count` prices bridging `open` to `close`.
    ///
    /// Callers pass `tick_count >= 2`; the bridge needs both endpoints. A
    /// degenerate count collapses to the close price.
    pub fn generate(
        &mut self,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        tick_count: usize,
    ) -> Vec<Decimal> {
        if tick_count < 2 {
            return vec![close.round_dp(2); tick_count];
        }

        let open_f: f64 = open.try_into().unwrap_or(0.0);
        let high_f: f64 = high.try_into().unwrap_or(0.0);
        let low_f: f64 = low.try_into().unwrap_or(0.0);
        let close_f: f64 = close.try_into().unwrap_or(0.0);

        // Wiener path; first increment forced to zero so W(0) = 0
        let mut walk = Vec::with_capacity(tick_count);
        let mut acc = 0.0;
        walk.push(acc);
        for _ in 1..tick_count {
            acc += self.rng.sample(self.normal);
            walk.push(acc);
        }

        let span = (tick_count - 1) as f64;
        let drift_excess = walk[tick_count - 1] - (close_f - open_f);

        let mut ticks: Vec<Decimal> = walk
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let bridged = open_f + w - (i as f64 / span) * drift_excess;
                let bounded = bridged.min(high_f).max(low_f);
                Decimal::try_from(bounded).unwrap_or(open).round_dp(2)
            })
            .collect();

        // Endpoints forced after clamping so they stay exact
        ticks[0] = open.round_dp(2);
        ticks[tick_count - 1] = close.round_dp(2);

        ticks
    }
}

impl Default for TickSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
