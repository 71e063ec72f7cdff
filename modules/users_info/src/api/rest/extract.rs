//! Extractors that answer with the module's `{ "errors": [...] }` body on failure.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::api::rest::error::{
    from_json_rejection, from_query_rejection, from_violations, ErrorsResponse,
};
use crate::domain::validation::Violation;

/// Numeric `{id}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub i64);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ErrorsResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mismatch = || from_violations(&[Violation::param_type("id", "integer")]);
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| mismatch())?;
        raw.parse::<i64>().map(UserId).map_err(|_| mismatch())
    }
}

/// `Json<T>` with decode failures mapped to `Request body is not valid.`
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ErrorsResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(%rejection, "Rejected request body");
                Err(from_json_rejection(&rejection))
            }
        }
    }
}

/// `Query<T>` with decode failures answered as an errors body.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ErrorsResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => {
                tracing::debug!(%rejection, "Rejected query string");
                Err(from_query_rejection(&rejection))
            }
        }
    }
}
