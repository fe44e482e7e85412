use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Deref, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A time point in simulation, in minutes from the start of the replication
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Time(pub f64);

/// A duration of time in simulation, in minutes
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Duration(pub f64);

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// The event queue needs a total order on time. NaN never survives config
// validation, total_cmp keeps the impl honest anyway.
impl Eq for Time {}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Duration {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0 - rhs.0)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Self::Output {
        Duration(self.0 + rhs.0)
    }
}

impl Mul<f64> for Duration {
    type Output = Duration;

    fn mul(self, rhs: f64) -> Self::Output {
        Duration(self.0 * rhs)
    }
}

/// Part number identifying one stock keeping unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkuId(pub String);

impl fmt::Display for SkuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SkuId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// One order line to pick. Immutable once created; consumed by exactly one
/// pick process.
#[derive(Debug, Clone, PartialEq)]
pub struct PickTask {
    pub sku: SkuId,
    pub quantity: u32,
    /// shipment day key from the source data, e.g. 20110901
    pub day: u32,
    /// arrival offset within the shift
    pub time_of_day: Duration,
    /// resolved one-way distance to the slot, meters
    pub slot_distance: f64,
}

impl fmt::Display for PickTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pick({}, x{}, day {})", self.sku, self.quantity, self.day)
    }
}

/// Stocking parameters for one SKU in the fixed pick area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuParams {
    pub sku: SkuId,
    pub max_pieces: u32,
    pub reorder_point: u32,
    pub initial_pieces: u32,
}
