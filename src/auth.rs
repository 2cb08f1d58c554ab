//! Identity resolution and the role/capability gate.
//!
//! Authentication itself lives in front of this server: the OAuth proxy
//! verifies the Google sign-in and forwards the user's email in a trusted
//! request header. This module turns that header into an [`Identity`] and
//! maps identities to capabilities through the users table.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::users;
use crate::error::{AppError, Result};
use crate::AppState;

/// Authorization level assigned to a recognized user.
///
/// Capability derivation is total: `admin` may view, upload, edit, delete,
/// and manage users; `upload` may view and upload; an unrecognized identity
/// may only view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Upload,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Upload => "upload",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "upload" => Some(Role::Upload),
            _ => None,
        }
    }

    pub fn can_upload(self) -> bool {
        matches!(self, Role::Admin | Role::Upload)
    }

    pub fn can_edit(self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_manage_users(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// The caller's resolved identity: a normalized email, or anonymous.
#[derive(Debug, Clone)]
pub struct Identity(pub Option<String>);

impl Identity {
    pub fn email(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(state.config.identity_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(Identity(email))
    }
}

/// Gate for submit/upload endpoints: requires a signed-in identity with the
/// `upload` or `admin` role. Returns the caller's email.
pub async fn require_upload(pool: &SqlitePool, identity: &Identity) -> Result<String> {
    let email = identity.email().ok_or(AppError::NotAuthenticated)?;
    match users::resolve_role(pool, email).await? {
        Some(role) if role.can_upload() => Ok(email.to_string()),
        _ => Err(AppError::UploadRoleRequired),
    }
}

/// Gate for edit/delete/user-management endpoints: admin only.
pub async fn require_admin(pool: &SqlitePool, identity: &Identity) -> Result<String> {
    let email = identity.email().ok_or(AppError::NotAuthenticated)?;
    match users::resolve_role(pool, email).await? {
        Some(role) if role.can_edit() => Ok(email.to_string()),
        _ => Err(AppError::AdminRoleRequired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_every_capability() {
        assert!(Role::Admin.can_upload());
        assert!(Role::Admin.can_edit());
        assert!(Role::Admin.can_manage_users());
    }

    #[test]
    fn upload_role_cannot_edit_or_manage() {
        assert!(Role::Upload.can_upload());
        assert!(!Role::Upload.can_edit());
        assert!(!Role::Upload.can_manage_users());
    }

    #[test]
    fn role_parsing_is_closed() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("upload"), Some(Role::Upload));
        assert_eq!(Role::parse("viewer"), None);
        assert_eq!(Role::parse("Admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_round_trips_through_as_str() {
        for role in [Role::Admin, Role::Upload] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
