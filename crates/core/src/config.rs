//! Experiment configuration.
//!
//! Values come from a TOML file, then `OPTIBENCH_*` environment overrides,
//! then validation. Everything is read once at startup and stays immutable
//! for the whole run; components receive the config by reference instead of
//! consulting global state.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Decimal separator used when serializing numeric result fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalSeparator {
    #[default]
    Point,
    Comma,
}

impl FromStr for DecimalSeparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "point" => Ok(Self::Point),
            "comma" => Ok(Self::Comma),
            other => Err(format!("expected 'point' or 'comma', got '{other}'")),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment name; the output file is `<output.dir>/<experiment>.csv`.
    #[serde(default = "default_experiment")]
    pub experiment: String,
    /// Seed shared by every work unit of the run.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Run every unit inline on the submitting thread.
    #[serde(default)]
    pub sequential: bool,
    /// Upper bound on worker threads.
    #[serde(default = "default_cores")]
    pub cores: usize,
    /// Percentage of available hardware parallelism the pool may use.
    #[serde(default = "default_core_percent")]
    pub core_percent: u8,
    /// Optional per-unit soft time budget, forwarded to `run_bounded`.
    #[serde(default)]
    pub time_budget_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory scanned recursively for instance files.
    #[serde(default = "default_input_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub decimal: DecimalSeparator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl ExperimentConfig {
    /// Parse config from a TOML string, apply environment overrides, and
    /// validate the result.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Number of worker threads this run may use.
    pub fn effective_workers(&self) -> usize {
        self.pool.effective_workers()
    }

    /// Destination file for this experiment's rows.
    pub fn output_path(&self) -> PathBuf {
        self.output.dir.join(format!("{}.csv", self.experiment))
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply environment variable overrides.
    ///
    /// Convention: `OPTIBENCH_SECTION_KEY` overrides `section.key`.
    /// Examples:
    /// - `OPTIBENCH_SEED` -> `seed`
    /// - `OPTIBENCH_POOL_SEQUENTIAL` -> `pool.sequential` (`true`/`false`)
    /// - `OPTIBENCH_POOL_CORES` -> `pool.cores`
    /// - `OPTIBENCH_POOL_CORE_PERCENT` -> `pool.core_percent`
    /// - `OPTIBENCH_INPUT_ROOT` -> `input.root`
    /// - `OPTIBENCH_OUTPUT_DECIMAL` -> `output.decimal`
    ///
    /// A set variable that fails to parse is an error rather than a silent
    /// fallback to the file value.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("OPTIBENCH_EXPERIMENT") {
            self.experiment = v;
        }
        if let Some(v) = parse_env("OPTIBENCH_SEED")? {
            self.seed = v;
        }
        if let Some(v) = parse_env("OPTIBENCH_POOL_SEQUENTIAL")? {
            self.pool.sequential = v;
        }
        if let Some(v) = parse_env("OPTIBENCH_POOL_CORES")? {
            self.pool.cores = v;
        }
        if let Some(v) = parse_env("OPTIBENCH_POOL_CORE_PERCENT")? {
            self.pool.core_percent = v;
        }
        if let Some(v) = parse_env("OPTIBENCH_POOL_TIME_BUDGET_SECS")? {
            self.pool.time_budget_secs = Some(v);
        }
        if let Ok(v) = std::env::var("OPTIBENCH_INPUT_ROOT") {
            self.input.root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("OPTIBENCH_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = parse_env("OPTIBENCH_OUTPUT_DELIMITER")? {
            self.output.delimiter = v;
        }
        if let Some(v) = parse_env("OPTIBENCH_OUTPUT_DECIMAL")? {
            self.output.decimal = v;
        }
        if let Ok(v) = std::env::var("OPTIBENCH_LOG_LEVEL") {
            self.log.level = v;
        }
        Ok(())
    }

    // ── Validation ──────────────────────────────────────────────────

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_experiment()?;
        self.validate_pool()?;
        self.validate_output()?;
        self.validate_log_level()?;
        Ok(())
    }

    fn validate_experiment(&self) -> Result<(), ConfigError> {
        if self.experiment.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "experiment name must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn validate_pool(&self) -> Result<(), ConfigError> {
        if self.pool.cores == 0 {
            return Err(ConfigError::Invalid("pool.cores must be at least 1".into()));
        }
        if self.pool.core_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "pool.core_percent must be 0-100, got {}",
                self.pool.core_percent
            )));
        }
        Ok(())
    }

    fn validate_output(&self) -> Result<(), ConfigError> {
        match self.output.delimiter {
            '"' | '\n' | '\r' => Err(ConfigError::Invalid(
                "output.delimiter must not be a quote or newline".into(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_log_level(&self) -> Result<(), ConfigError> {
        match self.log.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "invalid log level '{other}', expected trace|debug|info|warn|error"
            ))),
        }
    }
}

impl PoolConfig {
    /// Resolve the worker thread count against the machine's hardware
    /// parallelism. Sequential mode is always exactly one.
    pub fn effective_workers(&self) -> usize {
        if self.sequential {
            return 1;
        }
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        effective_worker_count(self.cores, self.core_percent, available)
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs.map(Duration::from_secs)
    }
}

/// Pool sizing policy: the explicit core cap and the percentage of available
/// hardware both bound the pool; the result is clamped to at least one.
pub fn effective_worker_count(cores: usize, core_percent: u8, available: usize) -> usize {
    let allowed = available.saturating_mul(core_percent as usize) / 100;
    cores.min(allowed).max(1)
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigError::Invalid(format!(
                "environment variable {name} has invalid value '{raw}'"
            ))
        }),
        Err(_) => Ok(None),
    }
}

// ── Defaults ────────────────────────────────────────────────────────

fn default_experiment() -> String {
    "experiment".into()
}

fn default_seed() -> u64 {
    42
}

fn default_cores() -> usize {
    1
}

fn default_core_percent() -> u8 {
    80
}

fn default_input_root() -> PathBuf {
    PathBuf::from("instances")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_delimiter() -> char {
    ','
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment: default_experiment(),
            seed: default_seed(),
            pool: PoolConfig::default(),
            input: InputConfig::default(),
            output: OutputConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            sequential: false,
            cores: default_cores(),
            core_percent: default_core_percent(),
            time_budget_secs: None,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            root: default_input_root(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            delimiter: default_delimiter(),
            decimal: DecimalSeparator::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
