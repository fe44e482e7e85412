use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::randvars::{Sampler, Tri};
use crate::types::Duration;
use crate::utils::app_config::AppConfig;
use crate::utils::prelude::*;

/// Which picking policy a run models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, FromStr)]
pub enum ScenarioKind {
    /// random storage: wide walks, nonzero search time, no stock limits
    Random,
    /// fixed pick area: slot-distance walks, no search, ledger enforced
    Slotted,
}

/// Triangular activity times, minutes (distances in meters for walks)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub check_pick: Tri,
    pub per_box: Tri,
    pub scan: Tri,
    pub restock: Tri,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockConfig {
    /// poll interval of a stocked-out pick
    pub retry_minutes: f64,
    /// period of the replenishment scan
    pub replenish_minutes: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RandomStorageConfig {
    /// one-way walking distance, meters
    pub walk_distance: Tri,
    pub search_time: Tri,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlottedConfig {
    /// symmetric walk-distance variation around the slot distance, e.g. 0.2
    pub distance_variation: f64,
}

/// The whole `[sim]` section. Deserialized once, validated, then frozen
/// into `ModelParams` before any replication starts; nothing reads global
/// mutable state after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: Option<String>,
    pub pickers: usize,
    /// fraction of the shift a picker is actually available
    pub effective_fraction: f64,
    pub shift_minutes: f64,
    pub days_per_replication: usize,
    pub replications: usize,
    /// meters per minute
    pub walk_speed: f64,
    pub pieces_per_box: u32,
    pub monitor_minutes: f64,
    pub scenario: ScenarioKind,
    pub activity: ActivityConfig,
    pub stock: StockConfig,
    pub random_storage: RandomStorageConfig,
    pub slotted: SlottedConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: None,
            pickers: 40,
            effective_fraction: 8.0 / 9.0,
            shift_minutes: 480.0,
            days_per_replication: 1,
            replications: 5,
            walk_speed: 100.0,
            pieces_per_box: 10,
            monitor_minutes: 10.0,
            scenario: ScenarioKind::Slotted,
            activity: ActivityConfig {
                check_pick: Tri::new(0.3, 0.4, 0.6),
                per_box: Tri::new(0.08, 0.1, 0.15),
                scan: Tri::new(0.05, 0.083, 0.12),
                restock: Tri::new(2.0, 3.0, 5.0),
            },
            stock: StockConfig {
                retry_minutes: 1.0,
                replenish_minutes: 30.0,
            },
            random_storage: RandomStorageConfig {
                walk_distance: Tri::new(10.0, 25.0, 50.0),
                search_time: Tri::new(1.0, 2.21, 4.0),
            },
            slotted: SlottedConfig {
                distance_variation: 0.2,
            },
        }
    }
}

impl SimConfig {
    pub fn seed(&self) -> &str {
        self.seed.as_deref().unwrap_or("aisle nine")
    }

    /// Reject anything a replication could choke on, before it starts
    pub fn validate(&self) -> Result<()> {
        fn positive(v: f64, what: &str) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::Model(format!("{} must be positive, got {}", what, v)))
            }
        }

        if self.pickers == 0 {
            return Err(Error::Model("worker pool capacity must be positive".into()));
        }
        if !(self.effective_fraction > 0.0 && self.effective_fraction <= 1.0) {
            return Err(Error::Model(format!(
                "effective_fraction must be in (0, 1], got {}",
                self.effective_fraction
            )));
        }
        positive(self.shift_minutes, "shift_minutes")?;
        if self.days_per_replication == 0 {
            return Err(Error::Model("days_per_replication must be positive".into()));
        }
        if self.replications == 0 {
            return Err(Error::Model("replications must be positive".into()));
        }
        positive(self.walk_speed, "walk_speed")?;
        if self.pieces_per_box == 0 {
            return Err(Error::Model("pieces_per_box must be positive".into()));
        }
        positive(self.monitor_minutes, "monitor_minutes")?;
        positive(self.stock.retry_minutes, "stock.retry_minutes")?;
        positive(self.stock.replenish_minutes, "stock.replenish_minutes")?;
        self.activity.check_pick.validate("activity.check_pick")?;
        self.activity.per_box.validate("activity.per_box")?;
        self.activity.scan.validate("activity.scan")?;
        self.activity.restock.validate("activity.restock")?;
        self.random_storage.walk_distance.validate("random_storage.walk_distance")?;
        self.random_storage.search_time.validate("random_storage.search_time")?;
        if !(0.0..1.0).contains(&self.slotted.distance_variation) {
            return Err(Error::Model(format!(
                "slotted.distance_variation must be in [0, 1), got {}",
                self.slotted.distance_variation
            )));
        }
        Ok(())
    }

    /// Freeze one scenario's runtime parameters
    pub fn model_params(&self, kind: ScenarioKind) -> Result<ModelParams> {
        self.validate()?;
        let scenario = match kind {
            ScenarioKind::Random => ScenarioParams::Random {
                walk_distance: self
                    .random_storage
                    .walk_distance
                    .sampler("random_storage.walk_distance")?,
                search_time: self
                    .random_storage
                    .search_time
                    .sampler("random_storage.search_time")?,
            },
            ScenarioKind::Slotted => ScenarioParams::Slotted {
                variation: self.slotted.distance_variation,
            },
        };
        Ok(ModelParams {
            pickers: self.pickers,
            day_len: Duration(self.shift_minutes),
            duration: Duration(self.shift_minutes * self.days_per_replication as f64),
            effective_fraction: self.effective_fraction,
            walk_speed: self.walk_speed,
            pieces_per_box: self.pieces_per_box,
            check_pick: self.activity.check_pick.sampler("activity.check_pick")?,
            per_box: self.activity.per_box.sampler("activity.per_box")?,
            scan: self.activity.scan.sampler("activity.scan")?,
            restock: self.activity.restock.sampler("activity.restock")?,
            retry: Duration(self.stock.retry_minutes),
            replenish_every: Duration(self.stock.replenish_minutes),
            monitor_every: Duration(self.monitor_minutes),
            scenario,
        })
    }
}

/// Immutable runtime parameters of one replication
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub pickers: usize,
    pub day_len: Duration,
    pub duration: Duration,
    pub effective_fraction: f64,
    pub walk_speed: f64,
    pub pieces_per_box: u32,
    pub check_pick: Sampler,
    pub per_box: Sampler,
    pub scan: Sampler,
    pub restock: Sampler,
    pub retry: Duration,
    pub replenish_every: Duration,
    pub monitor_every: Duration,
    pub scenario: ScenarioParams,
}

#[derive(Debug, Clone, Copy)]
pub enum ScenarioParams {
    Random {
        walk_distance: Sampler,
        search_time: Sampler,
    },
    Slotted {
        variation: f64,
    },
}

/// Where the pick-line and SKU CSV files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub pick_lines: PathBuf,
    pub sku_params: PathBuf,
}

/// Cabinet-number -> one-way distance table, meters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CabinetConfig {
    /// distance used for cabinets missing from the table
    pub fallback: f64,
    #[serde(default)]
    pub distances: HashMap<String, f64>,
}

impl CabinetConfig {
    pub fn distance(&self, cabinet: Option<u32>) -> f64 {
        cabinet
            .and_then(|c| self.distances.get(&c.to_string()))
            .copied()
            .unwrap_or(self.fallback)
    }
}

/// Workforce sizes for the sensitivity sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub pickers: Vec<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OutputDir(PathBuf);

impl OutputDir {
    pub fn file(&self, name: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(&self.0)?;
        Ok(self.0.join(name))
    }
}

pub(crate) trait AppConfigExt {
    fn sim(&self) -> Result<SimConfig>;
    fn data(&self) -> Result<DataConfig>;
    fn cabinets(&self) -> Result<CabinetConfig>;
    fn sweep(&self) -> Result<SweepConfig>;
    fn output_dir(&self) -> Result<OutputDir>;
}

impl AppConfigExt for AppConfig {
    fn sim(&self) -> Result<SimConfig> {
        self.get("sim")
    }

    fn data(&self) -> Result<DataConfig> {
        self.get("data")
    }

    fn cabinets(&self) -> Result<CabinetConfig> {
        self.get("cabinets")
    }

    fn sweep(&self) -> Result<SweepConfig> {
        self.get("sweep")
    }

    fn output_dir(&self) -> Result<OutputDir> {
        self.get("output_dir")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let cfg = SimConfig::default();
        cfg.validate().unwrap();
        cfg.model_params(ScenarioKind::Random).unwrap();
        cfg.model_params(ScenarioKind::Slotted).unwrap();
    }

    #[test]
    fn rejects_zero_capacity() {
        let cfg = SimConfig {
            pickers: 0,
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_mode_outside_support() {
        let mut cfg = SimConfig::default();
        cfg.activity.scan = Tri::new(0.1, 0.5, 0.2);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_variation() {
        let mut cfg = SimConfig::default();
        cfg.slotted.distance_variation = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn scenario_kind_round_trips_through_str() {
        for kind in [ScenarioKind::Random, ScenarioKind::Slotted] {
            let parsed: ScenarioKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn cabinet_distance_falls_back() {
        let mut distances = HashMap::new();
        distances.insert("3".to_string(), 0.99);
        let cabinets = CabinetConfig {
            fallback: 5.7,
            distances,
        };
        assert_eq!(cabinets.distance(Some(3)), 0.99);
        assert_eq!(cabinets.distance(Some(99)), 5.7);
        assert_eq!(cabinets.distance(None), 5.7);
    }
}
