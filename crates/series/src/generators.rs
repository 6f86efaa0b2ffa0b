use crate::candle::Candle;

/// Seeded random-walk candle series.
///
/// Close and RSI both wander; high/low straddle the close by a random
/// half-range. The same seed always yields the same series.
#[derive(Debug, Clone)]
pub struct CandleGenerator {
    state: u64,
    close: f64,
    rsi: f64,
    max_step: f64,
    tick: u64,
}

impl CandleGenerator {
    pub fn new(seed: u64, start_price: f64, max_step: f64) -> Self {
        assert!(
            start_price.is_finite() && start_price > 0.0,
            "start_price must be finite and positive"
        );
        assert!(
            max_step.is_finite() && max_step >= 0.0,
            "max_step must be finite and non-negative"
        );

        Self {
            state: seed,
            close: start_price,
            rsi: 50.0,
            max_step,
            tick: 0,
        }
    }

    pub fn next_candle(&mut self) -> Candle {
        let delta = (next_unit(&mut self.state) * 2.0 - 1.0) * self.max_step;
        self.close = (self.close + delta).max(0.01);
        self.rsi = (self.rsi + (next_unit(&mut self.state) * 2.0 - 1.0) * 12.0).clamp(0.0, 100.0);

        let half_range = next_unit(&mut self.state) * self.max_step;
        let high = self.close + half_range;
        let low = (self.close - half_range).max(0.0);
        let time = format!("bar-{}", self.tick);
        self.tick += 1;

        match Candle::new(time, high, low, self.close, self.rsi) {
            Ok(candle) => candle,
            Err(err) => unreachable!("generator produced an invalid candle: {err}"),
        }
    }

    pub fn take_series(&mut self, len: usize) -> Vec<Candle> {
        (0..len).map(|_| self.next_candle()).collect()
    }
}

fn next_u64(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn next_unit(state: &mut u64) -> f64 {
    let value = next_u64(state);
    (value as f64) / (u64::MAX as f64)
}
