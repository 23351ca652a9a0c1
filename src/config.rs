// Squad configuration loading and validation (squad.toml).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::pool::Position;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Minimum and maximum starter counts for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub min: usize,
    pub max: usize,
}

/// Immutable parameters for one selection run.
#[derive(Debug, Clone, PartialEq)]
pub struct SquadConfig {
    /// Total budget for the whole squad, in cost units.
    pub total_budget: f64,
    /// Maximum selected players (starters + substitutes) from one club.
    pub max_per_club: usize,
    /// Number of starters in the lineup.
    pub starting_size: usize,
    /// Number of substitutes on the bench.
    pub bench_size: usize,
    /// Starter quotas per position.
    pub gk: Quota,
    pub def: Quota,
    pub mid: Quota,
    pub fwd: Quota,
    /// Objective weight applied to substitutes' projected points. The
    /// historical behavior counts bench points at full weight (1.0); set
    /// lower to discount bench value.
    pub bench_weight: f64,
    /// Wall-clock budget for one solver call, in milliseconds.
    pub solver_time_limit_ms: u64,
}

impl Default for SquadConfig {
    fn default() -> Self {
        SquadConfig {
            total_budget: 100.0,
            max_per_club: 3,
            starting_size: 11,
            bench_size: 4,
            gk: Quota { min: 1, max: 1 },
            def: Quota { min: 3, max: 5 },
            mid: Quota { min: 3, max: 5 },
            fwd: Quota { min: 1, max: 3 },
            bench_weight: 1.0,
            solver_time_limit_ms: 10_000,
        }
    }
}

impl SquadConfig {
    /// Starter quota for the given position.
    pub fn quota(&self, position: Position) -> Quota {
        match position {
            Position::Goalkeeper => self.gk,
            Position::Defender => self.def,
            Position::Midfielder => self.mid,
            Position::Forward => self.fwd,
        }
    }

    /// Total squad size (starters + substitutes).
    pub fn squad_size(&self) -> usize {
        self.starting_size + self.bench_size
    }

    /// Wall-clock budget for one solver call.
    pub fn solver_time_limit(&self) -> Duration {
        Duration::from_millis(self.solver_time_limit_ms)
    }
}

// ---------------------------------------------------------------------------
// squad.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[squad]` table in squad.toml.
#[derive(Debug, Clone, Deserialize)]
struct SquadFile {
    squad: SquadSection,
}

/// Raw deserialization target for the `[squad]` table. Every field falls
/// back to the engine default when omitted.
#[derive(Debug, Clone, Deserialize)]
struct SquadSection {
    #[serde(default = "default_total_budget")]
    total_budget: f64,
    #[serde(default = "default_max_per_club")]
    max_per_club: usize,
    #[serde(default = "default_starting_size")]
    starting_size: usize,
    #[serde(default = "default_bench_size")]
    bench_size: usize,
    #[serde(default)]
    quotas: QuotasSection,
    #[serde(default = "default_bench_weight")]
    bench_weight: f64,
    #[serde(default = "default_solver_time_limit_ms")]
    solver_time_limit_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct QuotasSection {
    #[serde(default = "default_gk_quota")]
    gk: Quota,
    #[serde(default = "default_def_quota")]
    def: Quota,
    #[serde(default = "default_mid_quota")]
    mid: Quota,
    #[serde(default = "default_fwd_quota")]
    fwd: Quota,
}

impl Default for QuotasSection {
    fn default() -> Self {
        QuotasSection {
            gk: default_gk_quota(),
            def: default_def_quota(),
            mid: default_mid_quota(),
            fwd: default_fwd_quota(),
        }
    }
}

fn default_total_budget() -> f64 {
    100.0
}
fn default_max_per_club() -> usize {
    3
}
fn default_starting_size() -> usize {
    11
}
fn default_bench_size() -> usize {
    4
}
fn default_bench_weight() -> f64 {
    1.0
}
fn default_solver_time_limit_ms() -> u64 {
    10_000
}
fn default_gk_quota() -> Quota {
    Quota { min: 1, max: 1 }
}
fn default_def_quota() -> Quota {
    Quota { min: 3, max: 5 }
}
fn default_mid_quota() -> Quota {
    Quota { min: 3, max: 5 }
}
fn default_fwd_quota() -> Quota {
    Quota { min: 1, max: 3 }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate a squad configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SquadConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    parse_config(&text, path)
}

/// Parse a squad configuration from TOML text. Split out from `load_config`
/// so tests can exercise parsing without touching the filesystem.
pub(crate) fn parse_config(text: &str, path: &Path) -> Result<SquadConfig, ConfigError> {
    let file: SquadFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let section = file.squad;
    let config = SquadConfig {
        total_budget: section.total_budget,
        max_per_club: section.max_per_club,
        starting_size: section.starting_size,
        bench_size: section.bench_size,
        gk: section.quotas.gk,
        def: section.quotas.def,
        mid: section.quotas.mid,
        fwd: section.quotas.fwd,
        bench_weight: section.bench_weight,
        solver_time_limit_ms: section.solver_time_limit_ms,
    };

    validate(&config)?;

    Ok(config)
}

/// Validate cross-field invariants of a squad configuration.
pub fn validate(config: &SquadConfig) -> Result<(), ConfigError> {
    fn field_error(field: &str, message: impl Into<String>) -> ConfigError {
        ConfigError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    if !config.total_budget.is_finite() || config.total_budget < 0.0 {
        return Err(field_error(
            "total_budget",
            format!("must be a finite non-negative number, got {}", config.total_budget),
        ));
    }
    if config.max_per_club == 0 {
        return Err(field_error("max_per_club", "must be at least 1"));
    }
    if config.starting_size == 0 {
        return Err(field_error("starting_size", "must be at least 1"));
    }
    if config.bench_size == 0 {
        return Err(field_error("bench_size", "must be at least 1"));
    }
    if !config.bench_weight.is_finite() || config.bench_weight < 0.0 {
        return Err(field_error(
            "bench_weight",
            format!("must be a finite non-negative number, got {}", config.bench_weight),
        ));
    }
    if config.solver_time_limit_ms == 0 {
        return Err(field_error("solver_time_limit_ms", "must be at least 1"));
    }

    let mut min_sum = 0usize;
    let mut max_sum = 0usize;
    for position in Position::ALL {
        let quota = config.quota(position);
        if quota.min > quota.max {
            return Err(field_error(
                "quotas",
                format!(
                    "{} quota has min {} greater than max {}",
                    position, quota.min, quota.max
                ),
            ));
        }
        min_sum += quota.min;
        max_sum += quota.max;
    }
    if min_sum > config.starting_size {
        return Err(field_error(
            "quotas",
            format!(
                "quota minimums sum to {} which exceeds starting_size {}",
                min_sum, config.starting_size
            ),
        ));
    }
    if max_sum < config.starting_size {
        return Err(field_error(
            "quotas",
            format!(
                "quota maximums sum to {} which cannot fill starting_size {}",
                max_sum, config.starting_size
            ),
        ));
    }

    Ok(())
}
