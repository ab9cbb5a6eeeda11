//! Bearer-token authentication and the permission model.
//!
//! Tokens are opaque strings resolved through the Redis `tokens` hash to
//! an [`Identity`]: an actor name plus a permission set.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

pub use models::Identity;

use crate::database;
use crate::error::AppError;
use crate::state::SharedState;

pub mod permissions {
    pub use models::identity::ALL_PERMISSIONS as ALL;

    pub const OUTBREAKS_READ: &str = "outbreaks:read";
    pub const OUTBREAKS_WRITE: &str = "outbreaks:write";
    pub const PREDICTIONS_READ: &str = "predictions:read";
    pub const PREDICTIONS_WRITE: &str = "predictions:write";
    pub const REPORTS_READ: &str = "reports:read";
    pub const REPORTS_WRITE: &str = "reports:write";
    pub const ALERTS_READ: &str = "alerts:read";
    pub const ALERTS_WRITE: &str = "alerts:write";
    pub const ANNOTATIONS_READ: &str = "annotations:read";
    pub const EXPORTS_WRITE: &str = "exports:write";
}

/// Middleware for `/api/v1`: resolve the bearer token and stash the
/// identity as a request extension for handlers.
pub async fn require_token(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::Unauthorized)?;

    let identity = database::resolve_token(state.redis_connection.clone(), &token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn request_with_header(value: &str) -> Request {
        HttpRequest::builder()
            .header(AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        let req = request_with_header("Bearer abc123");
        assert_eq!(bearer_token(&req), Some("abc123".to_string()));
    }

    #[test]
    fn test_rejects_non_bearer_schemes() {
        let req = request_with_header("Basic abc123");
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_rejects_empty_token() {
        let req = request_with_header("Bearer ");
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_missing_header() {
        let req = HttpRequest::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&req), None);
    }

    #[test]
    fn test_identity_against_route_permissions() {
        let identity = Identity::new(
            "analyst",
            vec![
                permissions::OUTBREAKS_READ.to_string(),
                permissions::PREDICTIONS_WRITE.to_string(),
            ],
        );

        assert!(identity.can(permissions::OUTBREAKS_READ));
        assert!(identity.can(permissions::PREDICTIONS_WRITE));
        assert!(!identity.can(permissions::OUTBREAKS_WRITE));
        assert!(Identity::admin("root").can(permissions::EXPORTS_WRITE));
    }
}
