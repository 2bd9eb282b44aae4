use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by tokens from the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Whether these claims may act on a resource owned by `owner`.
    pub fn can_act_for(&self, owner: &str) -> bool {
        self.is_admin() || self.sub == owner
    }
}

/// Any caller with a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// A caller whose token carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

pub fn decode_bearer(parts: &Parts, secret: &str) -> Result<Claims, AppError> {
    let auth_header = parts.headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthenticationError("Expected a Bearer token".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ).map_err(|e| AppError::AuthenticationError(e.to_string()))?;

    Ok(token_data.claims)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        decode_bearer(parts, &state.auth.secret).map(AuthUser)
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = decode_bearer(parts, &state.auth.secret)?;
        if !claims.is_admin() {
            tracing::warn!("Non-admin {} attempted an admin action", claims.sub);
            return Err(AppError::AuthorizationError("Admin role required".to_string()));
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, role: &str) -> Claims {
        Claims { sub: sub.to_string(), role: role.to_string(), exp: 0 }
    }

    #[test]
    fn test_ownership_rules() {
        assert!(claims("alice", "user").can_act_for("alice"));
        assert!(!claims("alice", "user").can_act_for("bob"));
        assert!(claims("ops", ADMIN_ROLE).can_act_for("bob"));
    }

    #[test]
    fn test_missing_header_rejected() {
        let (parts, _) = axum::http::Request::new(()).into_parts();
        assert!(matches!(
            decode_bearer(&parts, "secret"),
            Err(AppError::AuthenticationError(_))
        ));
    }
}
