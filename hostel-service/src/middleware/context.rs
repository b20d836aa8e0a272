//! Caller identity for every request.
//!
//! The gateway in front of this service authenticates the user and forwards
//! who they are in `X-User-ID`, `X-User-Role` and, for managers and students,
//! `X-Hostel-ID`. Handlers receive it as an explicit [`RequestContext`]
//! argument; nothing about the caller is kept in shared state.

use crate::models::{Hostel, Role};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
pub const HOSTEL_ID_HEADER: &str = "X-Hostel-ID";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: String,
    pub role: Role,
    /// Home hostel for managers and students.
    pub hostel_id: Option<String>,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>, role: Role, hostel_id: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            hostel_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// Fails with `Forbidden` when the caller's role is below `required`.
    pub fn require(&self, required: Role) -> Result<(), AppError> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "{} role required, caller is {}",
                required, self.role
            )))
        }
    }

    /// Whether `hostel` lies inside the caller's tenant scope.
    pub fn can_access(&self, hostel: &Hostel) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Owner => hostel.owner_id == self.user_id,
            Role::Manager | Role::Student => self.hostel_id.as_deref() == Some(hostel.id.as_str()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        };

        let user_id = header(USER_ID_HEADER).ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing {} header", USER_ID_HEADER))
        })?;

        let role: Role = header(USER_ROLE_HEADER)
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing {} header", USER_ROLE_HEADER))
            })?
            .parse()
            .map_err(|e: String| AppError::Unauthorized(anyhow::anyhow!(e)))?;

        let hostel_id = header(HOSTEL_ID_HEADER);

        if matches!(role, Role::Manager | Role::Student) && hostel_id.is_none() {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Missing {} header for {} role",
                HOSTEL_ID_HEADER,
                role
            )));
        }

        let span = tracing::Span::current();
        span.record("user_id", user_id.as_str());
        span.record("role", role.as_str());
        if let Some(ref hid) = hostel_id {
            span.record("hostel_id", hid.as_str());
        }

        Ok(RequestContext::new(user_id, role, hostel_id))
    }
}
