use std::collections::VecDeque;

use series::Candle;

use crate::{
    divergence::{DivergenceEvent, DivergenceKind},
    error::StrategyError,
    extrema::{is_extremum, ExtremumKind, DEFAULT_ORDER},
};

pub const MIN_PAIR_DISTANCE: usize = 10;
pub const MAX_PAIR_DISTANCE: usize = 60;
pub const BEARISH_RSI_ZONE: f64 = 65.0;
pub const BULLISH_RSI_ZONE: f64 = 35.0;

/// Emit on the first qualifying pair. Call sites that want the stricter
/// double-confirmation policy must ask for it explicitly.
pub const DEFAULT_CONFIRMATION_COUNT: usize = 1;

/// Evaluation order for a single position: bearish (peaks) before bullish
/// (troughs).
const KINDS: [DivergenceKind; 2] = [DivergenceKind::Bearish, DivergenceKind::Bullish];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    order: usize,
    confirmation_count: usize,
}

impl MatcherConfig {
    pub fn new(order: usize, confirmation_count: usize) -> Result<Self, StrategyError> {
        if order == 0 {
            return Err(StrategyError::InvalidOrder);
        }
        if confirmation_count == 0 {
            return Err(StrategyError::InvalidConfirmationCount);
        }

        Ok(Self {
            order,
            confirmation_count,
        })
    }

    pub fn with_confirmation_count(self, confirmation_count: usize) -> Result<Self, StrategyError> {
        Self::new(self.order, confirmation_count)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of qualifying older extrema a current extremum must pair with
    /// before a divergence is reported for it.
    pub fn confirmation_count(&self) -> usize {
        self.confirmation_count
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            confirmation_count: DEFAULT_CONFIRMATION_COUNT,
        }
    }
}

/// Previously confirmed extrema, oldest first, bounded to the pairing band.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtremaHistory {
    peaks: VecDeque<usize>,
    troughs: VecDeque<usize>,
}

impl ExtremaHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indices(&self, kind: ExtremumKind) -> &VecDeque<usize> {
        match kind {
            ExtremumKind::Peak => &self.peaks,
            ExtremumKind::Trough => &self.troughs,
        }
    }

    pub fn len(&self) -> usize {
        self.peaks.len() + self.troughs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, kind: ExtremumKind, index: usize) {
        match kind {
            ExtremumKind::Peak => self.peaks.push_back(index),
            ExtremumKind::Trough => self.troughs.push_back(index),
        }
    }

    /// Drops entries that can no longer pair with `current` or anything after it.
    pub fn prune(&mut self, current: usize) {
        for indices in [&mut self.peaks, &mut self.troughs] {
            while indices
                .front()
                .is_some_and(|oldest| current.saturating_sub(*oldest) > MAX_PAIR_DISTANCE)
            {
                indices.pop_front();
            }
        }
    }
}

/// Source of a single divergence decision for one series position.
pub trait DivergenceQuery {
    fn divergence_at(&self, series: &[Candle], index: usize) -> Option<DivergenceEvent>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DivergenceMatcher {
    config: MatcherConfig,
}

impl DivergenceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> MatcherConfig {
        self.config
    }

    /// Evaluates every position once, in order, and returns all confirmed
    /// pairs. A single current extremum may contribute several events.
    pub fn scan(&self, series: &[Candle]) -> Vec<DivergenceEvent> {
        let order = self.config.order;
        let skip = self.config.confirmation_count - 1;
        let mut history = ExtremaHistory::new();
        let mut events = Vec::new();

        for index in 0..series.len() {
            history.prune(index);
            for kind in KINDS {
                let extremum = kind.extremum();
                if !is_extremum(series, index, order, extremum) {
                    continue;
                }
                events.extend(confirmed_pairs(
                    series,
                    index,
                    kind,
                    history.indices(extremum),
                    skip,
                ));
                history.push(extremum, index);
            }
        }

        events
    }

    /// Evaluates one position against every earlier extremum in the series
    /// and returns the first pair that reaches the confirmation count.
    pub fn query(&self, series: &[Candle], index: usize) -> Option<DivergenceEvent> {
        if index >= series.len() {
            return None;
        }

        let order = self.config.order;
        let skip = self.config.confirmation_count - 1;
        let history = preceding_extrema(series, index, order);

        KINDS.into_iter().find_map(|kind| {
            if !is_extremum(series, index, order, kind.extremum()) {
                return None;
            }
            confirmed_pairs(series, index, kind, history.indices(kind.extremum()), skip).next()
        })
    }
}

impl DivergenceQuery for DivergenceMatcher {
    fn divergence_at(&self, series: &[Candle], index: usize) -> Option<DivergenceEvent> {
        self.query(series, index)
    }
}

fn preceding_extrema(series: &[Candle], index: usize, order: usize) -> ExtremaHistory {
    let mut history = ExtremaHistory::new();
    for old in index.saturating_sub(MAX_PAIR_DISTANCE)..index {
        if is_extremum(series, old, order, ExtremumKind::Peak) {
            history.push(ExtremumKind::Peak, old);
        }
        if is_extremum(series, old, order, ExtremumKind::Trough) {
            history.push(ExtremumKind::Trough, old);
        }
    }
    history
}

/// Newest-to-oldest walk over `candidates`; the first `skip` qualifying
/// pairs are counted but not reported.
fn confirmed_pairs<'a>(
    series: &'a [Candle],
    current: usize,
    kind: DivergenceKind,
    candidates: &'a VecDeque<usize>,
    skip: usize,
) -> impl Iterator<Item = DivergenceEvent> + 'a {
    let cur = &series[current];

    candidates
        .iter()
        .rev()
        .copied()
        .take_while(move |old| current.saturating_sub(*old) <= MAX_PAIR_DISTANCE)
        .filter(move |old| current.saturating_sub(*old) >= MIN_PAIR_DISTANCE)
        .filter(move |old| {
            let old = &series[*old];
            in_rsi_zone(kind, cur, old) && diverges(kind, cur, old)
        })
        .skip(skip)
        .map(move |old| DivergenceEvent::new(old, current, kind))
}

fn in_rsi_zone(kind: DivergenceKind, cur: &Candle, old: &Candle) -> bool {
    match kind {
        DivergenceKind::Bearish => cur.rsi() > BEARISH_RSI_ZONE || old.rsi() > BEARISH_RSI_ZONE,
        DivergenceKind::Bullish => cur.rsi() < BULLISH_RSI_ZONE || old.rsi() < BULLISH_RSI_ZONE,
    }
}

fn diverges(kind: DivergenceKind, cur: &Candle, old: &Candle) -> bool {
    match kind {
        DivergenceKind::Bearish => cur.high() > old.high() && cur.rsi() < old.rsi(),
        DivergenceKind::Bullish => cur.low() < old.low() && cur.rsi() > old.rsi(),
    }
}
