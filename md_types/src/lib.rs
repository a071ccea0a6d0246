use std::sync::Arc;

pub const FIXED_POINT_MULTIPLIER: i64 = 100_000_000;

#[inline(always)]
pub fn to_fixed_point(value: f64) -> i64 {
    (value * FIXED_POINT_MULTIPLIER as f64).round() as i64
}

#[inline(always)]
pub fn from_fixed_point(value: i64) -> f64 {
    value as f64 / FIXED_POINT_MULTIPLIER as f64
}

/// Fixed-point number wrapper for cleaner API
/// Internally uses i64 with 8 decimal places (satoshi precision)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FixedPoint(pub i64);

impl FixedPoint {
    #[inline(always)]
    pub fn from_f64(value: f64) -> Self {
        FixedPoint(to_fixed_point(value))
    }

    #[inline(always)]
    pub fn from_int(value: i64) -> Self {
        FixedPoint(value * FIXED_POINT_MULTIPLIER)
    }

    #[inline(always)]
    pub fn to_f64(self) -> f64 {
        from_fixed_point(self.0)
    }
}

impl std::ops::Add for FixedPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        FixedPoint(self.0 + rhs.0)
    }
}

impl std::ops::Sub for FixedPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        FixedPoint(self.0 - rhs.0)
    }
}

impl std::ops::Mul for FixedPoint {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        // Fixed-point multiplication: (a * b) / MULTIPLIER
        let result = (self.0 as i128 * rhs.0 as i128) / FIXED_POINT_MULTIPLIER as i128;
        FixedPoint(result as i64)
    }
}

impl std::ops::Div for FixedPoint {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        // Fixed-point division: (a * MULTIPLIER) / b
        let result = (self.0 as i128 * FIXED_POINT_MULTIPLIER as i128) / rhs.0 as i128;
        FixedPoint(result as i64)
    }
}

impl std::fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

/// One per-symbol quote/trade update as delivered by the upstream feed
///
/// Immutable once constructed. The core performs no validation on the
/// contents; malformed prices or timestamps pass through untouched.
#[derive(Debug, Clone)]
pub struct MarketDataUpdate {
    pub symbol: Arc<str>,
    pub bid: FixedPoint,
    pub ask: FixedPoint,
    pub last: FixedPoint,
    /// Exchange-side timestamp in milliseconds since epoch
    pub source_timestamp: u64,
}

impl MarketDataUpdate {
    pub fn new(
        symbol: impl Into<Arc<str>>,
        bid: FixedPoint,
        ask: FixedPoint,
        last: FixedPoint,
        source_timestamp: u64,
    ) -> Self {
        Self { symbol: symbol.into(), bid, ask, last, source_timestamp }
    }

    /// Calculate mid-price
    pub fn mid(&self) -> FixedPoint {
        (self.bid + self.ask) / FixedPoint::from_int(2)
    }

    /// Calculate spread in basis points
    pub fn spread_bps(&self) -> f64 {
        let spread = self.ask - self.bid;
        let mid = self.mid();
        (spread.to_f64() / mid.to_f64()) * 10000.0
    }
}
