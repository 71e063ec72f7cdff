use anyhow::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

impl ConfigProvider for AppConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.modules.get(module_name)
    }
}

/// Everything a module needs while it is being wired into the server.
#[derive(Clone)]
pub struct ModuleCtx {
    config_provider: Arc<dyn ConfigProvider>,
    db: Option<sea_orm::DatabaseConnection>,
    cancellation_token: CancellationToken,
}

impl ModuleCtx {
    pub fn new(config_provider: Arc<dyn ConfigProvider>, cancellation_token: CancellationToken) -> Self {
        Self {
            config_provider,
            db: None,
            cancellation_token,
        }
    }

    pub fn with_db(mut self, db: sea_orm::DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    /// SeaORM connection handle (cheap to clone), when a database is configured.
    pub fn db(&self) -> Option<sea_orm::DatabaseConnection> {
        self.db.clone()
    }

    /// Process-wide shutdown token; cancelled once on SIGINT/SIGTERM.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    /// Typed module config; defaults when the module has no section.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.config_provider.get_module_config(module_name) {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
                anyhow::anyhow!("Invalid configuration for module '{module_name}': {e}")
            }),
        }
    }
}
