use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use tracing::debug;

pub const SESSION_HEADER: &str = "x-session-id";
/// Shared by every caller that omits the header.
pub const ANONYMOUS_SESSION: &str = "anonymous";

/// Opaque, client chosen cart scope. Not an identity: nothing is verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session(pub String);

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Session {
        let id = headers
            .get(SESSION_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(ANONYMOUS_SESSION);
        Session(id.to_owned())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

pub async fn session_middleware(mut req: Request, next: Next) -> Response {
    let session = Session::from_headers(req.headers());
    debug!(session_id = %session.id(), "Resolved session");
    req.extensions_mut().insert(session);
    next.run(req).await
}
