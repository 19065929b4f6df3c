//! Security audit logging for authentication events
//!
//! All audit events are logged at INFO level with the "audit" target,
//! so they can be filtered and routed apart from application logs.
//! Passwords, raw tokens, and the signing secret never appear in an event.
//!
//! # Example
//!
//! ```ignore
//! use studybuddy_api::audit::{audit_log, AuditEvent, RequestContext};
//!
//! let ctx = RequestContext::from_headers(request.headers());
//! audit_log(&AuditEvent::LoginFailure {
//!     email: "user@example.com".to_string(),
//!     ip_address: ctx.ip_address,
//!     user_agent: ctx.user_agent,
//! });
//! ```

use axum::http::{header::USER_AGENT, HeaderMap};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Account created and auto-logged-in
    SignupSuccess {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Signup rejected by validation
    SignupFailure {
        email: String,
        reasons: Vec<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    LoginSuccess {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Unknown email or wrong password; deliberately not distinguished
    LoginFailure {
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Token added to the denylist
    Logout {
        user_id: Uuid,
        email: String,
        jti: String,
        ip_address: Option<String>,
    },

    /// Malformed, forged, expired, or orphaned token presented
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },

    /// Revoked token presented
    RevokedToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::SignupSuccess { .. } => "Signup successful",
            AuditEvent::SignupFailure { .. } => "Signup failed",
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::Logout { .. } => "User logout",
            AuditEvent::InvalidToken { .. } => "Invalid token rejected",
            AuditEvent::RevokedToken { .. } => "Revoked token rejected",
        }
    }
}

/// Client details pulled from request headers
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event
///
/// The event travels as a JSON string field, e.g.
/// `{"event_type":"revoked_token","ip_address":"10.0.0.7","user_agent":null}`.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    info!(
        target: "audit",
        timestamp = %timestamp,
        event = %event_json,
        "{}",
        event.summary()
    );
}

/// Client IP from proxy headers
///
/// The first `X-Forwarded-For` hop wins over `X-Real-IP`.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    forwarded
        .or_else(|| header_str(headers, "x-real-ip").map(str::trim))
        .map(str::to_string)
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    header_str(headers, USER_AGENT.as_str()).map(str::to_string)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
