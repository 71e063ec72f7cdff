//! Process-level plumbing shared by the server binary and the modules:
//! layered configuration, logging setup, home directory resolution, signal
//! handling and the per-module context handed to modules during wiring.

pub mod config;
pub mod context;
pub mod logging;
pub mod paths;
pub mod shutdown;

pub use config::{
    AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig, StoreBackend,
};
pub use context::{ConfigProvider, ModuleCtx};
