//! Cookie-identified browser sessions.
//!
//! Each session owns its own comment history and pending flash messages.
//! The store only maps ids to sessions; nothing in one session is visible
//! from another.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::history::CommentHistory;

pub const SESSION_COOKIE: &str = "sentiment_sid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Error,
    Success,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug)]
pub struct SessionData {
    pub history: CommentHistory,
    flashes: Vec<Flash>,
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        Self {
            history: CommentHistory::new(),
            flashes: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flashes.push(Flash {
            level,
            message: message.into(),
        });
    }

    /// Returns pending flashes and forgets them.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    /// Whether there is anything worth keeping for the next request.
    fn holds_state(&self) -> bool {
        !self.history.is_empty() || !self.flashes.is_empty()
    }
}

type SharedSession = Arc<Mutex<SessionData>>;

fn lock(data: &SharedSession) -> MutexGuard<'_, SessionData> {
    data.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session registry with idle expiry
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, SharedSession>> {
        self.sessions.read().unwrap_or_else(|poisoned| {
            tracing::warn!("⚠️ Session store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, SharedSession>> {
        self.sessions.write().unwrap_or_else(|poisoned| {
            tracing::warn!("⚠️ Session store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Looks up a live session and marks it as used.
    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        let data = self.read().get(id).cloned()?;

        let expired = {
            let mut guard = lock(&data);
            if guard.last_seen.elapsed() >= self.ttl {
                true
            } else {
                guard.last_seen = Instant::now();
                false
            }
        };

        if expired {
            self.write().remove(id);
            tracing::debug!("Session {} expired", id);
            return None;
        }
        Some(data)
    }

    /// Registers a session, sweeping expired ones first.
    pub fn insert(&self, id: Uuid, data: SharedSession) {
        self.sweep_expired();
        self.write().insert(id, data);
        tracing::debug!("🍪 New session {}", id);
    }

    /// Removes idle sessions; returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, data| lock(data).last_seen.elapsed() < ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to the current request's session, inserted by [`session_layer`].
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    data: SharedSession,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Locks the session data. Do not hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, SessionData> {
        lock(&self.data)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session layer is not installed",
        ))
    }
}

/// Reads the session id from the `Cookie` header(s).
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// Middleware: attaches a [`Session`] to the request. Browsers without a
/// live session get a fresh one, which is only stored (and its cookie set)
/// once a handler has put something in it.
pub async fn session_layer(
    State(store): State<Arc<SessionStore>>,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = session_id_from_headers(req.headers())
        .and_then(|id| store.get(&id).map(|data| (id, data)));

    let (id, data, is_new) = match existing {
        Some((id, data)) => (id, data, false),
        None => (Uuid::new_v4(), Arc::new(Mutex::new(SessionData::new())), true),
    };

    req.extensions_mut().insert(Session {
        id,
        data: data.clone(),
    });
    let mut response = next.run(req).await;

    if is_new && lock(&data).holds_state() {
        store.insert(id, data);
        if let Ok(value) = HeaderValue::from_str(&session_cookie(id)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::score;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use tower::ServiceExt;

    fn add_session(store: &SessionStore) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let data = Arc::new(Mutex::new(SessionData::new()));
        store.insert(id, data.clone());
        (id, data)
    }

    #[test]
    fn test_cookie_parsing() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}; other=1", SESSION_COOKIE, id)).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));

        let mut bad = HeaderMap::new();
        bad.insert(header::COOKIE, HeaderValue::from_static("sentiment_sid=not-a-uuid"));
        assert_eq!(session_id_from_headers(&bad), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (a, data_a) = add_session(&store);
        let (b, _) = add_session(&store);
        assert_ne!(a, b);

        lock(&data_a).history.append("only in a", score("only in a"));

        let data_b = store.get(&b).unwrap();
        assert!(lock(&data_b).history.is_empty());
        assert_eq!(lock(&store.get(&a).unwrap()).history.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new(Duration::ZERO);
        let (id, _) = add_session(&store);
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_sweep_removes_idle_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        {
            let mut sessions = store.write();
            for _ in 0..2 {
                sessions.insert(Uuid::new_v4(), Arc::new(Mutex::new(SessionData::new())));
            }
        }
        assert_eq!(store.sweep_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_sweeps_expired_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        add_session(&store);
        add_session(&store);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_poisoned_store_still_saves_sessions() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.sessions.write().unwrap();
            panic!("poison the store");
        })
        .join();
        assert!(store.sessions.is_poisoned());

        let (id, _) = add_session(&store);
        assert!(store.get(&id).is_some());
    }

    #[test]
    fn test_flashes_are_taken_once() {
        let mut data = SessionData::new();
        assert!(!data.holds_state());
        data.flash(FlashLevel::Error, "Comment not found.");
        assert!(data.holds_state());
        assert_eq!(data.take_flashes().len(), 1);
        assert!(data.take_flashes().is_empty());
    }

    async fn whoami(session: Session) -> String {
        session.id().to_string()
    }

    async fn remember(session: Session) -> String {
        session.lock().flash(FlashLevel::Success, "saved");
        session.id().to_string()
    }

    fn test_router(store: Arc<SessionStore>) -> Router {
        Router::new()
            .route("/", get(whoami))
            .route("/remember", get(remember))
            .layer(axum::middleware::from_fn_with_state(store, session_layer))
    }

    #[tokio::test]
    async fn test_read_only_requests_do_not_store_sessions() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let app = test_router(store.clone());

        let resp = app
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_layer_sets_cookie_once_state_is_written() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let app = test_router(store.clone());

        let first = app
            .clone()
            .oneshot(HttpRequest::builder().uri("/remember").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = first
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with(SESSION_COOKIE));
        assert!(cookie.contains("HttpOnly"));

        let pair = cookie.split(';').next().unwrap().to_string();
        let second = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(header::COOKIE, pair.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(second.headers().get(header::SET_COOKIE).is_none());

        let body = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert_eq!(format!("{}={}", SESSION_COOKIE, String::from_utf8_lossy(&body)), pair);
        assert_eq!(store.len(), 1);
    }
}
