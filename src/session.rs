//! Visitor sessions: the cart, pending flash messages and recently placed orders.

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    cart::Cart,
    error::{AppError, AppResult},
    state::AppState,
};

pub const SESSION_HEADER: &str = "x-session-id";
pub const SESSION_COOKIE: &str = "sessionid";

/// Orders remembered per session for the confirmation page.
const MAX_PLACED_ORDERS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let from_header = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse);
        from_header.or_else(|| {
            headers
                .get_all(header::COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(|v| v.split(';'))
                .filter_map(|pair| pair.trim().split_once('='))
                .find(|(name, _)| *name == SESSION_COOKIE)
                .and_then(|(_, value)| Self::parse(value))
        })
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub cart: Cart,
    pub messages: Vec<FlashMessage>,
    pub placed_orders: Vec<Uuid>,
}

impl SessionData {
    pub fn remember_order(&mut self, order_id: Uuid) {
        self.placed_orders.push(order_id);
        if self.placed_orders.len() > MAX_PLACED_ORDERS {
            let overflow = self.placed_orders.len() - MAX_PLACED_ORDERS;
            self.placed_orders.drain(..overflow);
        }
    }

    pub fn placed(&self, order_id: Uuid) -> bool {
        self.placed_orders.contains(&order_id)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session, returning an empty one when it is unknown or expired.
    async fn load(&self, id: SessionId) -> AppResult<SessionData>;

    async fn store(&self, id: SessionId, data: SessionData) -> AppResult<()>;

    /// Drop sessions idle past their time to live. Returns how many were removed.
    async fn purge_expired(&self) -> AppResult<usize>;
}

struct Entry {
    data: SessionData,
    touched: Instant,
}

pub struct MemorySessionStore {
    entries: DashMap<SessionId, Entry>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: SessionId) -> AppResult<SessionData> {
        let expired = match self.entries.get_mut(&id) {
            Some(mut entry) if entry.touched.elapsed() <= self.ttl => {
                entry.touched = Instant::now();
                return Ok(entry.data.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(&id);
        }
        Ok(SessionData::default())
    }

    async fn store(&self, id: SessionId, data: SessionData) -> AppResult<()> {
        self.entries.insert(
            id,
            Entry {
                data,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn purge_expired(&self) -> AppResult<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.touched.elapsed() <= self.ttl);
        Ok(before.saturating_sub(self.entries.len()))
    }
}

/// Handle to the current request's session.
#[derive(Clone)]
pub struct Session {
    id: SessionId,
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(id: SessionId, store: Arc<dyn SessionStore>) -> Self {
        Self { id, store }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn load(&self) -> AppResult<SessionData> {
        self.store.load(self.id).await
    }

    pub async fn save(&self, data: SessionData) -> AppResult<()> {
        self.store.store(self.id, data).await
    }

    /// Load, mutate and save in one step. Nothing is written when `f` leaves the data as it was.
    pub async fn update<F, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut SessionData) -> R + Send,
        R: Send,
    {
        let before = self.load().await?;
        let mut data = before.clone();
        let out = f(&mut data);
        if data != before {
            self.save(data).await?;
        }
        Ok(out)
    }

    pub async fn flash(&self, level: FlashLevel, text: impl Into<String>) -> AppResult<()> {
        let text = text.into();
        self.update(|data| data.messages.push(FlashMessage { level, text }))
            .await
    }

    pub async fn take_messages(&self) -> AppResult<Vec<FlashMessage>> {
        self.update(|data| std::mem::take(&mut data.messages)).await
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<SessionId>()
            .copied()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session layer is not installed")))?;
        Ok(Session::new(id, state.sessions.clone()))
    }
}

/// Middleware that resolves (or issues) the session id and echoes it on the response.
pub async fn attach(mut request: Request, next: Next) -> Response {
    let existing = SessionId::from_headers(request.headers());
    let id = existing.unwrap_or_else(SessionId::generate);
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        headers.insert(SESSION_HEADER, value);
    }
    if existing.is_none() {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(header::SET_COOKIE, value);
        }
        tracing::debug!(session_id = %id, "issued new session");
    }
    response
}

/// Periodically purge idle sessions.
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired sessions removed"),
                Err(err) => tracing::warn!(error = %err, "session sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn session(ttl: Duration) -> (Session, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new(ttl));
        (Session::new(SessionId::generate(), store.clone()), store)
    }

    #[tokio::test]
    async fn unknown_session_loads_empty() {
        let (session, _) = session(Duration::from_secs(60));
        let data = session.load().await.unwrap();
        assert!(data.cart.is_empty());
        assert!(data.messages.is_empty());
    }

    #[tokio::test]
    async fn cart_survives_between_loads() {
        let (session, _) = session(Duration::from_secs(60));
        let product = Uuid::new_v4();
        session
            .update(|data| data.cart.add(product, Decimal::new(500, 2), 2))
            .await
            .unwrap();

        let data = session.load().await.unwrap();
        assert_eq!(data.cart.quantity_of(product), 2);
    }

    #[tokio::test]
    async fn flash_messages_are_drained_once() {
        let (session, _) = session(Duration::from_secs(60));
        session.flash(FlashLevel::Success, "Cart cleared").await.unwrap();

        let messages = session.take_messages().await.unwrap();
        assert_eq!(
            messages,
            vec![FlashMessage {
                level: FlashLevel::Success,
                text: "Cart cleared".into()
            }]
        );
        assert!(session.take_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reading_a_fresh_session_stores_nothing() {
        let (session, store) = session(Duration::from_secs(60));

        assert!(session.take_messages().await.unwrap().is_empty());
        session.update(|data| data.cart.len()).await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_sessions_are_purged() {
        let (session, store) = session(Duration::ZERO);
        session
            .update(|data| data.remember_order(Uuid::new_v4()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn placed_orders_are_bounded() {
        let mut data = SessionData::default();
        let first = Uuid::new_v4();
        data.remember_order(first);
        for _ in 0..MAX_PLACED_ORDERS {
            data.remember_order(Uuid::new_v4());
        }
        assert_eq!(data.placed_orders.len(), MAX_PLACED_ORDERS);
        assert!(!data.placed(first));
    }

    #[test]
    fn session_id_is_read_from_header_or_cookie() {
        let id = SessionId::generate();

        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(SessionId::from_headers(&headers), Some(id));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("csrftoken=abc; {SESSION_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(SessionId::from_headers(&headers), Some(id));

        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(SessionId::from_headers(&headers), None);
    }
}
