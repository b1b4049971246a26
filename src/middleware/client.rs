//! Browser navigation vs. programmatic calls.
//!
//! Programmatic clients (`X-Requested-With: XMLHttpRequest`) get the JSON
//! envelope. Everyone else is redirected with a flash message left in the
//! session.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderMap, Uri, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::{
    error::AppError,
    pages,
    response::ApiResponse,
    session::{FlashLevel, Session},
};

pub const REQUESTED_WITH: &str = "x-requested-with";
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

#[derive(Debug, Clone)]
pub struct Client {
    ajax: bool,
    referer: Option<String>,
    path: String,
}

impl Client {
    pub fn from_headers(headers: &HeaderMap, uri: &Uri) -> Self {
        let ajax = headers
            .get(REQUESTED_WITH)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == XML_HTTP_REQUEST);
        let referer = headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .and_then(local_path);
        Self {
            ajax,
            referer,
            path: uri.path().to_string(),
        }
    }

    pub fn is_ajax(&self) -> bool {
        self.ajax
    }

    /// Where to send a browser afterwards: `next`, then the referer, then `fallback`.
    pub fn back_to(&self, next: Option<&str>, fallback: &str) -> String {
        next.and_then(local_path)
            .or_else(|| self.referer.clone())
            .unwrap_or_else(|| fallback.to_string())
    }

    pub async fn success<T: Serialize>(
        &self,
        session: &Session,
        level: FlashLevel,
        body: ApiResponse<T>,
        location: &str,
    ) -> Response {
        if self.ajax {
            return Json(body).into_response();
        }
        if let Err(err) = session.flash(level, body.message).await {
            tracing::warn!(error = %err, "failed to store flash message");
        }
        Redirect::to(location).into_response()
    }

    pub async fn failure(&self, session: &Session, err: AppError, location: &str) -> Response {
        self.failure_as(session, err, location, "Something went wrong, please try again")
            .await
    }

    /// Like [`Client::failure`], with `generic` shown in place of unexpected errors.
    pub async fn failure_as(
        &self,
        session: &Session,
        err: AppError,
        location: &str,
        generic: &str,
    ) -> Response {
        if self.ajax || matches!(err, AppError::NotFound) {
            return err.into_response();
        }
        if matches!(err, AppError::LoginRequired) {
            return Redirect::to(&pages::login_with_next(&self.path)).into_response();
        }
        let (level, text) = match &err {
            AppError::EmptyCart => (FlashLevel::Warning, err.to_string()),
            AppError::Validation(fields) => (
                FlashLevel::Error,
                fields
                    .iter()
                    .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            e if e.is_unexpected() => {
                tracing::error!(error = ?e, "request failed");
                (FlashLevel::Error, generic.to_string())
            }
            e => (FlashLevel::Error, e.to_string()),
        };
        if let Err(flash_err) = session.flash(level, text).await {
            tracing::warn!(error = %flash_err, "failed to store flash message");
        }
        Redirect::to(location).into_response()
    }
}

impl<S> FromRequestParts<S> for Client
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // nested routers strip their prefix from `parts.uri`
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);
        Ok(Client::from_headers(&parts.headers, uri))
    }
}

/// Keep only same-site paths so redirects cannot leave the storefront.
fn local_path(raw: &str) -> Option<String> {
    let uri: Uri = raw.parse().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();
    if !path_and_query.starts_with('/') || path_and_query.starts_with("//") {
        return None;
    }
    Some(path_and_query.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn client(headers: &[(&'static str, &'static str)]) -> Client {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_static(value));
        }
        Client::from_headers(&map, &"/api/cart/add/x".parse().unwrap())
    }

    #[test]
    fn detects_programmatic_calls() {
        assert!(client(&[(REQUESTED_WITH, XML_HTTP_REQUEST)]).is_ajax());
        assert!(!client(&[]).is_ajax());
    }

    #[test]
    fn next_wins_over_referer() {
        let c = client(&[("referer", "http://shop.local/products/?page=2")]);
        assert_eq!(c.back_to(Some("/wishlist/"), pages::CART), "/wishlist/");
        assert_eq!(c.back_to(None, pages::CART), "/products/?page=2");
    }

    #[test]
    fn offsite_targets_fall_back() {
        let c = client(&[]);
        assert_eq!(c.back_to(Some("https://evil.example/"), pages::CART), "/");
        assert_eq!(c.back_to(Some("//evil.example/"), pages::CART), pages::CART);
        assert_eq!(c.back_to(None, pages::HOME), pages::HOME);
    }
}
