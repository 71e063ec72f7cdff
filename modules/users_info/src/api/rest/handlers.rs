use std::sync::Arc;

use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Json},
    Extension,
};
use tracing::{error, info};

use crate::api::rest::dto::{DataEnvelope, RangeQuery, UserDto, UserPatchReq, UserReq};
use crate::api::rest::error::{from_violations, map_domain_error, ErrorsResponse};
use crate::api::rest::extract::{JsonBody, QueryParams, UserId};
use crate::contract::model::{DateRange, NewUser, UserPatch};
use crate::domain::service::Service;

type ApiResult<T> = Result<T, ErrorsResponse>;

fn found_or_not(done: bool) -> StatusCode {
    if done {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// List users, optionally filtered by a `from`/`to` birth-date window
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    QueryParams(query): QueryParams<RangeQuery>,
) -> ApiResult<Json<DataEnvelope<Vec<UserDto>>>> {
    info!("Listing users with query: {:?}", query);

    let range = DateRange::try_from(query).map_err(|v| from_violations(&v))?;

    match svc.list_users(range).await {
        Ok(users) => {
            let dtos = users.into_iter().map(UserDto::from).collect();
            Ok(Json(DataEnvelope::new(Some(dtos))))
        }
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

/// Get a specific user by ID; an unknown id yields `{"data": null}`
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    UserId(id): UserId,
) -> ApiResult<Json<DataEnvelope<UserDto>>> {
    info!("Getting user with id: {}", id);

    match svc.get_user(id).await {
        Ok(user) => Ok(Json(DataEnvelope::new(user.map(UserDto::from)))),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

/// Create a new user; answers 201 with a `Location` header and no body
pub async fn create_user(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    JsonBody(body): JsonBody<DataEnvelope<UserReq>>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating user: {:?}", body.data);

    let new_user = body
        .require()
        .and_then(NewUser::try_from)
        .map_err(|v| from_violations(&v))?;

    match svc.create_user(new_user).await {
        Ok(user) => {
            let location = format!("{}/{}", uri.path().trim_end_matches('/'), user.id);
            Ok((StatusCode::CREATED, [(header::LOCATION, location)]))
        }
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

/// Overwrite an existing user; the path id wins over any id in the body
pub async fn replace_user(
    Extension(svc): Extension<Arc<Service>>,
    UserId(id): UserId,
    JsonBody(body): JsonBody<DataEnvelope<UserReq>>,
) -> ApiResult<StatusCode> {
    info!("Replacing user {} with: {:?}", id, body.data);

    let user = body
        .require()
        .and_then(NewUser::try_from)
        .map_err(|v| from_violations(&v))?;

    match svc.replace_user(id, user).await {
        Ok(replaced) => Ok(found_or_not(replaced)),
        Err(e) => {
            error!("Failed to replace user {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

/// Update a user with partial data
pub async fn patch_user(
    Extension(svc): Extension<Arc<Service>>,
    UserId(id): UserId,
    JsonBody(body): JsonBody<DataEnvelope<UserPatchReq>>,
) -> ApiResult<StatusCode> {
    info!("Patching user {} with: {:?}", id, body.data);

    let patch = body
        .require()
        .and_then(UserPatch::try_from)
        .map_err(|v| from_violations(&v))?;

    match svc.patch_user(id, patch).await {
        Ok(patched) => Ok(found_or_not(patched)),
        Err(e) => {
            error!("Failed to patch user {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

/// Delete a user by ID: 200 when deleted, 204 when there was nothing to delete
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    UserId(id): UserId,
) -> ApiResult<StatusCode> {
    info!("Deleting user: {}", id);

    match svc.delete_user(id).await {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}
