use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::validation::Violation;

/// One entry of the `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub status: u16,
    pub message: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsBody {
    pub errors: Vec<ErrorDetail>,
}

/// `{ "errors": [...] }` response with its HTTP status.
#[derive(Debug)]
pub struct ErrorsResponse {
    pub status: StatusCode,
    pub body: ErrorsBody,
}

impl IntoResponse for ErrorsResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl ErrorsResponse {
    pub fn single(status: StatusCode, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorsBody {
                errors: vec![ErrorDetail {
                    status: status.as_u16(),
                    message: message.into(),
                    detail: detail.into(),
                }],
            },
        }
    }

    pub fn internal() -> Self {
        Self::single(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error",
            "An internal error occurred",
        )
    }
}

fn violation_detail(v: &Violation, status: StatusCode) -> ErrorDetail {
    let (message, detail) = match v {
        Violation::FieldInvalid { field, message } => {
            (format!("Field [{field}] is not valid."), message.clone())
        }
        Violation::DateFormat { input, reason } => (
            format!("Input date [{input}] is not valid or has a wrong format."),
            reason.clone(),
        ),
        Violation::RangeInvalid => (v.to_string(), String::new()),
        Violation::ParamTypeMismatch { name, expected } => (
            format!("Param [{name}] is not valid"),
            format!("Param is expected to be {expected}"),
        ),
    };
    ErrorDetail {
        status: status.as_u16(),
        message,
        detail,
    }
}

/// 400 with one entry per violation, in order.
pub fn from_violations(violations: &[Violation]) -> ErrorsResponse {
    let status = StatusCode::BAD_REQUEST;
    ErrorsResponse {
        status,
        body: ErrorsBody {
            errors: violations
                .iter()
                .map(|v| violation_detail(v, status))
                .collect(),
        },
    }
}

pub fn map_domain_error(e: &DomainError) -> ErrorsResponse {
    match e {
        DomainError::Validation { violations } => from_violations(violations),
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            ErrorsResponse::internal()
        }
    }
}

/// Undecodable JSON is a 400; transport failures (content type, body limit) keep
/// the status axum assigned.
pub fn from_json_rejection(rejection: &JsonRejection) -> ErrorsResponse {
    let status = match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            StatusCode::BAD_REQUEST
        }
        other => other.status(),
    };
    ErrorsResponse::single(status, "Request body is not valid.", rejection.body_text())
}

pub fn from_query_rejection(rejection: &QueryRejection) -> ErrorsResponse {
    ErrorsResponse::single(
        StatusCode::BAD_REQUEST,
        "Request parameters are not valid.",
        rejection.body_text(),
    )
}
