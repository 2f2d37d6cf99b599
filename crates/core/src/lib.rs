pub mod algorithm;
pub mod config;
pub mod instance;
pub mod loader;
pub mod solution;

pub use algorithm::{Algorithm, SolveError};
pub use config::{
    ConfigError, DecimalSeparator, ExperimentConfig, InputConfig, LogConfig, OutputConfig,
    PoolConfig, effective_worker_count, load_dotenv,
};
pub use instance::{Edge, LoadError, ProblemInstance};
pub use loader::{EdgeListLoader, InstanceLoader};
pub use solution::Solution;
