//! Caller identity extractor.
//!
//! Authentication happens upstream (gateway or reverse proxy); the service
//! trusts the `X-User-Id` header it forwards. Handlers that need a caller
//! take [`AuthUser`] and get a 401 for free when the header is missing or
//! malformed.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use duka_core::UserId;

use crate::error::AppError;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthUser(user_id): AuthUser) -> impl IntoResponse {
///     format!("hello, user {user_id}")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("missing X-User-Id header".to_owned()))?;

        let id: i32 = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Unauthorized("invalid X-User-Id header".to_owned()))?;

        Ok(Self(UserId::new(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<AuthUser, AppError> {
        let (mut parts, ()) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn accepts_a_numeric_user_id() {
        let request = Request::builder()
            .header("X-User-Id", "42")
            .body(())
            .unwrap();
        let AuthUser(user_id) = extract(request).await.unwrap();
        assert_eq!(user_id.as_i32(), 42);
    }

    #[tokio::test]
    async fn rejects_a_missing_header() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn rejects_garbage_and_non_positive_ids() {
        for value in ["abc", "0", "-3", ""] {
            let request = Request::builder()
                .header("X-User-Id", value)
                .body(())
                .unwrap();
            assert!(extract(request).await.is_err(), "accepted {value:?}");
        }
    }
}
