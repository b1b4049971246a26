//! Request bodies that may be JSON, a browser form, or missing entirely.
//!
//! Unlike `Json<T>`, this extractor never rejects the request. A bad body is
//! handed to the handler as an [`AppError`] so it can run its own checks
//! first and answer browsers with a redirect.

use std::convert::Infallible;

use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

pub struct Payload<T>(AppResult<Option<T>>);

impl<T> Payload<T> {
    /// The parsed body, `None` when the request had no body.
    pub fn into_inner(self) -> AppResult<Option<T>> {
        self.0
    }
}

impl<T: Default> Payload<T> {
    /// The parsed body, falling back to `T::default()` when it was absent.
    pub fn or_default(self) -> AppResult<T> {
        self.0.map(Option::unwrap_or_default)
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

fn malformed(detail: String) -> AppError {
    AppError::BadRequest(format!("Malformed request body: {detail}"))
}

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let parsed = Form::<T>::from_request(req, state)
                .await
                .map(|Form(body)| Some(body))
                .map_err(|rejection| malformed(rejection.body_text()));
            return Ok(Self(parsed));
        }

        let bytes = match Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(rejection) => return Ok(Self(Err(malformed(rejection.body_text())))),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Ok(None)));
        }
        let parsed = Json::<T>::from_bytes(&bytes)
            .map(|Json(body)| Some(body))
            .map_err(|rejection| malformed(rejection.body_text()));
        Ok(Self(parsed))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Qty {
        quantity: i32,
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> AppResult<Option<Qty>> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body)).unwrap();
        let Ok(payload) = Payload::<Qty>::from_request(req, &()).await;
        payload.into_inner()
    }

    #[tokio::test]
    async fn missing_body_is_none() {
        assert_eq!(extract(None, "").await.unwrap(), None);
        assert_eq!(extract(Some("application/json"), "  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_and_form_bodies_parse() {
        let json = extract(Some("application/json"), r#"{"quantity":3}"#).await.unwrap();
        assert_eq!(json, Some(Qty { quantity: 3 }));

        let form = extract(Some("application/x-www-form-urlencoded"), "quantity=2").await.unwrap();
        assert_eq!(form, Some(Qty { quantity: 2 }));
    }

    #[tokio::test]
    async fn garbage_is_a_bad_request() {
        let err = extract(Some("application/json"), "{not json").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
