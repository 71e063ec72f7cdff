use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use axum::{middleware::from_fn, routing::get, Router};
use runtime::ModuleCtx;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::{ApiIngressConfig, DEFAULT_BODY_LIMIT_BYTES};

pub const MODULE_NAME: &str = "api_ingress";

/// Used when `server.timeout_sec` is 0.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn request_timeout(timeout_sec: u64) -> Duration {
    if timeout_sec == 0 {
        DEFAULT_REQUEST_TIMEOUT
    } else {
        Duration::from_secs(timeout_sec)
    }
}

/// HTTP host: wraps module routers with the shared middleware stack and serves them.
pub struct ApiIngress {
    // Lock-free config using arc-swap for read-mostly access
    config: ArcSwap<ApiIngressConfig>,
    request_timeout: Duration,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default(), DEFAULT_REQUEST_TIMEOUT)
    }
}

impl ApiIngress {
    /// Create a new ApiIngress instance with the given configuration
    pub fn new(config: ApiIngressConfig, request_timeout: Duration) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            request_timeout,
        }
    }

    /// Reload `modules.api_ingress` from the context.
    pub fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg: ApiIngressConfig = ctx.module_config(MODULE_NAME)?;
        tracing::debug!(
            module = MODULE_NAME,
            cors_enabled = cfg.cors_enabled,
            body_limit_bytes = cfg.body_limit_bytes,
            "Module initialized with context"
        );
        self.config.store(std::sync::Arc::new(cfg));
        Ok(())
    }

    /// Get the current configuration (cheap clone from ArcSwap)
    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Merge `api` with `/health` and wrap everything in the middleware stack.
    pub fn build_router(&self, api: Router) -> Router {
        tracing::debug!("Building router");
        let config = self.get_config();
        let x_request_id = crate::request_id::header();

        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .merge(api);

        // Layers are listed innermost first:
        // BodyLimit <- CORS <- Timeout <- request id extension <- Trace <- Propagate <- SetRequestId
        router = router.layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router.layer(TimeoutLayer::new(self.request_timeout));

        // Put request_id into extensions and the request span
        router = router.layer(from_fn(crate::request_id::push_req_id_to_extensions));

        // Trace with request_id/status/latency
        router = router.layer(crate::request_id::create_trace_layer());

        // Echo x-request-id back to the client
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));

        // Generate x-request-id when missing
        router.layer(SetRequestIdLayer::new(
            x_request_id,
            crate::request_id::MakeReqId,
        ))
    }

    /// Bind `addr` and serve until `cancel` fires.
    pub async fn serve(&self, addr: SocketAddr, router: Router, cancel: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server on {addr}"))?;
        Self::serve_on(listener, router, cancel).await
    }

    /// Serve on an already bound listener until `cancel` fires.
    pub async fn serve_on(listener: TcpListener, router: Router, cancel: CancellationToken) -> Result<()> {
        let local = listener.local_addr().context("listener has no local address")?;
        tracing::info!("HTTP server bound on {}", local);

        // Graceful shutdown on cancel
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
