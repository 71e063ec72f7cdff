use crate::api::rest::handlers;
use crate::domain::service::Service;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

pub const USERS_PATH: &str = "/v1/users";
pub const USER_PATH: &str = "/v1/users/{id}";

/// Mount the users resource on `router`. The service is shared with handlers via `Extension`.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        // GET /v1/users?from&to - list, POST /v1/users - create
        .route(
            USERS_PATH,
            get(handlers::list_users).post(handlers::create_user),
        )
        // GET/PUT/PATCH/DELETE /v1/users/{id}
        .route(
            USER_PATH,
            get(handlers::get_user)
                .put(handlers::replace_user)
                .patch(handlers::patch_user)
                .delete(handlers::delete_user),
        )
        .layer(Extension(service))
}
