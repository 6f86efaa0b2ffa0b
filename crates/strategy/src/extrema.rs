use series::Candle;

pub const DEFAULT_ORDER: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Peak,
    Trough,
}

/// True when no candle within `order` positions on either side has a
/// strictly higher `high`. Positions without a full window are never peaks.
pub fn is_peak(series: &[Candle], index: usize, order: usize) -> bool {
    match window(series, index, order) {
        Some((before, after)) => {
            let high = series[index].high();
            before.iter().chain(after).all(|candle| candle.high() <= high)
        }
        None => false,
    }
}

/// Mirror of [`is_peak`] on `low`.
pub fn is_trough(series: &[Candle], index: usize, order: usize) -> bool {
    match window(series, index, order) {
        Some((before, after)) => {
            let low = series[index].low();
            before.iter().chain(after).all(|candle| candle.low() >= low)
        }
        None => false,
    }
}

pub fn is_extremum(series: &[Candle], index: usize, order: usize, kind: ExtremumKind) -> bool {
    match kind {
        ExtremumKind::Peak => is_peak(series, index, order),
        ExtremumKind::Trough => is_trough(series, index, order),
    }
}

fn window(series: &[Candle], index: usize, order: usize) -> Option<(&[Candle], &[Candle])> {
    if order == 0 || index < order {
        return None;
    }
    let end = index.checked_add(order)?;
    if end >= series.len() {
        return None;
    }

    Some((&series[index - order..index], &series[index + 1..=end]))
}
