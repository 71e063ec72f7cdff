use std::sync::Arc;

use anyhow::Context;
use runtime::ModuleCtx;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::UsersInfoConfig;
use crate::contract::client::UsersInfoApi;
use crate::domain::repo::UsersRepository;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::UsersInfoLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{InMemoryUsersRepository, SeaOrmUsersRepository};

pub const MODULE_NAME: &str = "users_info";

/// Users module: owns the domain service and wires it to storage, REST and the local client.
#[derive(Default)]
pub struct UsersInfo {
    // Keep the domain service behind ArcSwap for cheap read-mostly access.
    service: arc_swap::ArcSwapOption<Service>,
}

impl Clone for UsersInfo {
    fn clone(&self) -> Self {
        Self {
            service: arc_swap::ArcSwapOption::new(self.service.load_full()),
        }
    }
}

impl UsersInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read config, pick storage and build the service.
    ///
    /// With a database in `ctx` migrations run first and the SeaORM store is used;
    /// otherwise users live in process memory.
    pub async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing users_info module");

        let cfg: UsersInfoConfig = ctx.module_config(MODULE_NAME)?;
        debug!("Loaded users_info config: min_age_years={}", cfg.min_age_years);

        let repo: Arc<dyn UsersRepository> = match ctx.db() {
            Some(conn) => {
                info!("Running users_info database migrations");
                Migrator::up(&conn, None)
                    .await
                    .context("users_info migrations failed")?;
                info!("Users database migrations completed successfully");
                Arc::new(SeaOrmUsersRepository::new(conn))
            }
            None => {
                info!("No database configured, using in-memory users store");
                Arc::new(InMemoryUsersRepository::new())
            }
        };

        let service = Service::new(
            repo,
            ServiceConfig {
                min_age_years: cfg.min_age_years,
            },
        );
        self.service.store(Some(Arc::new(service)));
        Ok(())
    }

    pub fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process client for other modules.
    pub fn client(&self) -> anyhow::Result<Arc<dyn UsersInfoApi>> {
        Ok(Arc::new(UsersInfoLocalClient::new(self.service()?)))
    }

    pub fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering users_info REST routes");

        let router = routes::register_routes(router, self.service()?);
        info!("Users REST routes registered successfully");
        Ok(router)
    }
}
