//! Usage payload assembly for the analytics collector.

use crate::analytics::logbuf::{LogBuffer, LogEntry};
use crate::auth::Identity;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Request-side facts captured by the middleware before the inner
/// handler runs. Held by value so building the payload never touches
/// the live request.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub identity: Option<Identity>,
}

/// One completed request cycle, in the collector's wire shape.
/// Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePayload {
    pub id: String,
    pub created_at: i64,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub duration_ms: i64,
    pub product: String,
    pub request: RequestSnapshot,
    pub response: ResponseSnapshot,
    pub user_agent: String,
    pub user_id: String,
    pub server_logs: Vec<LogEntry>,
    pub user_details: UserDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, String>>,
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<BTreeMap<String, String>>,
    pub ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub headers: BTreeMap<String, String>,
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<BTreeMap<String, String>>,
}

/// Denormalized caller profile. Every field has an explicit anonymous
/// placeholder so the payload shape is stable with or without identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub last_login: String,
    pub profile: UserProfile,
    pub preferences: UserPreferences,
    pub subscription: UserSubscription,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub avatar: String,
    pub bio: String,
    pub location: String,
    pub website: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub theme: String,
    pub notifications: NotificationPreferences,
    pub language: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSubscription {
    pub plan: String,
    pub status: String,
    pub expires_at: Option<String>,
}

impl UserDetails {
    fn from_identity(identity: Option<&Identity>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: identity.map_or_else(|| "anonymous".to_string(), |u| u.id.clone()),
            email: identity.map_or_else(|| "unknown@example.com".to_string(), |u| u.email.clone()),
            name: identity
                .map(|u| u.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Anonymous User".to_string()),
            role: "user".to_string(),
            status: "active".to_string(),
            created_at: now.clone(),
            last_login: now,
            profile: UserProfile {
                avatar: String::new(),
                bio: String::new(),
                location: String::new(),
                website: String::new(),
            },
            preferences: UserPreferences {
                theme: "light".to_string(),
                notifications: NotificationPreferences {
                    email: false,
                    push: false,
                    sms: false,
                },
                language: "en".to_string(),
                timezone: "UTC".to_string(),
            },
            subscription: UserSubscription {
                plan: "free".to_string(),
                status: "active".to_string(),
                expires_at: None,
            },
            permissions: Vec::new(),
        }
    }
}

/// Assemble a payload for one completed request cycle.
///
/// Reads the wall clock and drains the log buffer; otherwise a pure
/// function of its inputs, which it does not mutate.
pub fn build_payload(
    request: &CapturedRequest,
    status: StatusCode,
    response_headers: &HeaderMap,
    start_time_ms: i64,
    response_body: Option<Value>,
    product: &str,
    logs: &LogBuffer,
) -> UsagePayload {
    let now = chrono::Utc::now().timestamp_millis();
    let id = format!("req_{}_{}", now, short_suffix());

    let ip = header_value(&request.headers, "x-forwarded-for")
        .or_else(|| header_value(&request.headers, "x-real-ip"))
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent = header_value(&request.headers, "user-agent")
        .unwrap_or_else(|| "unknown".to_string());

    let identity = request.identity.as_ref();

    UsagePayload {
        id,
        created_at: now,
        method: request.method.clone(),
        url: request.url.clone(),
        status: status.as_u16(),
        duration_ms: now - start_time_ms,
        product: product.to_string(),
        request: RequestSnapshot {
            headers: header_map(&request.headers),
            query: query_map(&request.url),
            body: request.body.clone().unwrap_or(Value::Null),
            cookies: None,
            ip,
        },
        response: ResponseSnapshot {
            headers: header_map(response_headers),
            body: response_body.unwrap_or(Value::Null),
            cookies: None,
        },
        user_agent,
        user_id: identity.map_or_else(|| "anonymous".to_string(), |u| u.id.clone()),
        server_logs: logs.drain(),
        user_details: UserDetails::from_identity(identity),
    }
}

fn short_suffix() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..9].to_string()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect()
}

fn query_map(url: &str) -> Option<BTreeMap<String, String>> {
    let query = url.split_once('?')?.1;
    let map: BTreeMap<String, String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}
