//! Authentication extractors.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use innerspell_core::domain::GUEST_CALLER_ID;
use innerspell_core::ports::{AuthError, ROLE_ADMIN, ROLE_PREMIUM, TokenClaims, TokenService};

use super::error::AppError;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// Check if the user has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_premium(&self) -> bool {
        self.has_role(ROLE_PREMIUM)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let token_service = req
        .app_data::<web::Data<Arc<dyn TokenService>>>()
        .ok_or_else(|| AppError::Internal("TokenService not found in app data".to_string()))?;

    let token = bearer_token(req)?;
    Ok(Identity::from(token_service.validate_token(token)?))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// Identity holding the admin role; anything else is rejected with 403.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

impl FromRequest for AdminIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = authenticate(req).and_then(|identity| {
            if identity.is_admin() {
                Ok(AdminIdentity(identity))
            } else {
                tracing::warn!(user_id = %identity.user_id, path = %req.path(), "Admin route refused");
                Err(AppError::Forbidden)
            }
        });
        ready(result)
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
///
/// A missing or invalid token makes the request a guest request.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    /// Rate-limit caller id and premium flag for this request.
    pub fn caller(&self) -> (String, bool) {
        match &self.0 {
            Some(identity) => (identity.user_id.to_string(), identity.is_premium()),
            None => (GUEST_CALLER_ID.to_string(), false),
        }
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match authenticate(req) {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(e) => {
                if req.headers().contains_key(header::AUTHORIZATION) {
                    tracing::debug!(error = %e, "Ignoring unusable token, treating caller as guest");
                }
                ready(Ok(OptionalIdentity(None)))
            }
        }
    }
}
