use rand::Rng;
use rand_distr::{Distribution, Triangular};
use serde::{Deserialize, Serialize};

use crate::utils::prelude::*;

/// Parameters of a triangular distribution, as they appear in config files
/// and in the activity-time lookup table.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tri {
    pub min: f64,
    pub mode: f64,
    pub max: f64,
}

impl Tri {
    pub fn new(min: f64, mode: f64, max: f64) -> Self {
        Self { min, mode, max }
    }

    pub fn validate(&self, what: &str) -> Result<()> {
        if !(self.min.is_finite() && self.mode.is_finite() && self.max.is_finite()) {
            return Err(Error::Model(format!("{}: non-finite triangular parameters {:?}", what, self)));
        }
        if self.min < 0.0 {
            return Err(Error::Model(format!("{}: negative minimum in {:?}", what, self)));
        }
        if !(self.min <= self.mode && self.mode <= self.max) {
            return Err(Error::Model(format!(
                "{}: mode outside [min, max] in {:?}",
                what, self
            )));
        }
        Ok(())
    }

    pub fn sampler(&self, what: &str) -> Result<Sampler> {
        self.validate(what)?;
        Ok(Sampler::from_valid(*self))
    }
}

/// One draw source. A triple collapsed to a point (min == mode == max, the
/// "no search time" case) yields exactly that constant and consumes no
/// randomness, so degenerate activities do not perturb the stream.
#[derive(Debug, Copy, Clone)]
pub enum Sampler {
    Point(f64),
    Triangular(Triangular<f64>),
}

impl Sampler {
    fn from_valid(tri: Tri) -> Self {
        if tri.max - tri.min < f64::EPSILON {
            Self::Point(tri.mode)
        } else {
            // validated above: min < max and min <= mode <= max
            let dist = Triangular::new(tri.min, tri.max, tri.mode)
                .expect("validated triangular parameters");
            Self::Triangular(dist)
        }
    }

    /// Sampler for a slot distance known up to a symmetric variation
    /// fraction, e.g. 0.2 for +/- 20%. `variation` is validated with the
    /// scenario config; non-positive distances collapse to zero.
    pub fn around(distance: f64, variation: f64) -> Self {
        if distance <= 0.0 {
            return Self::Point(0.0);
        }
        Self::from_valid(Tri::new(
            distance * (1.0 - variation),
            distance,
            distance * (1.0 + variation),
        ))
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        match self {
            Self::Point(v) => *v,
            Self::Triangular(dist) => dist.sample(rng),
        }
    }
}
