use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{pages, response::ApiResponse};

pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Please correct the highlighted fields")]
    Validation(FieldErrors),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("{0} is no longer available")]
    ProductUnavailable(String),

    #[error("Login required")]
    LoginRequired,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::EmptyCart
            | AppError::InsufficientStock(_)
            | AppError::ProductUnavailable(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LoginRequired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stock and availability problems send the shopper back to the cart.
    pub fn is_stock_problem(&self) -> bool {
        matches!(
            self,
            AppError::InsufficientStock(_) | AppError::ProductUnavailable(_)
        )
    }

    pub fn is_unexpected(&self) -> bool {
        self.status().is_server_error()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::Validation(fields)
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_unexpected() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let mut data = ErrorData {
            error: message.clone(),
            fields: None,
            login_required: None,
            login_url: None,
        };
        match self {
            AppError::Validation(fields) => data.fields = Some(fields),
            AppError::LoginRequired => {
                data.login_required = Some(true);
                data.login_url = Some(pages::LOGIN);
            }
            _ => {}
        }

        (status, axum::Json(ApiResponse::failure(message, data))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "Enter a valid email address"))]
        email: String,
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::LoginRequired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Conflict("busy".into()).status(),
            StatusCode::CONFLICT
        );
        assert!(AppError::Internal(anyhow::anyhow!("boom")).is_unexpected());
        assert!(AppError::InsufficientStock("Mug".into()).is_stock_problem());
    }

    #[test]
    fn validation_errors_are_keyed_by_field() {
        let err: AppError = Probe {
            email: "nope".into(),
        }
        .validate()
        .unwrap_err()
        .into();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields["email"], vec!["Enter a valid email address"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        assert_eq!(
            AppError::InsufficientStock("Ferris Mug".into()).to_string(),
            "Insufficient stock for Ferris Mug"
        );
    }
}
