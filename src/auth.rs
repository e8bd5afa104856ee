use crate::config::Config;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Identity of an authenticated caller, attached as a request extension.
/// Requests without a resolvable identity carry no extension and are
/// treated as anonymous downstream.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Identity resolution middleware.
///
/// Best-effort by contract: a missing Authorization header, a malformed
/// scheme, or an unknown token never rejects the request. The analytics
/// path reads the extension if present and falls back to an anonymous
/// profile otherwise.
pub async fn identity_middleware(
    State(config): State<Arc<Config>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(identity) = resolve_identity(&config, &req) {
        tracing::debug!(user_id = %identity.id, "Resolved caller identity");
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}

fn resolve_identity(config: &Config, req: &Request) -> Option<Identity> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())?;

    let token = extract_bearer_token(auth_header)?;

    config
        .users
        .iter()
        .find(|u| u.token == token)
        .map(|u| Identity {
            id: u.id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
        })
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    const BEARER_PREFIX: &str = "Bearer ";

    let token = auth_header.strip_prefix(BEARER_PREFIX)?;

    if token.is_empty() {
        return None;
    }

    Some(token)
}
