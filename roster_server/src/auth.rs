//! Session authentication middleware.
//!
//! `AuthLayer` wraps the `/api` routes. It reads the session token from the
//! session cookie or an `Authorization: Bearer` header, resolves it to an
//! account through a [`SessionValidator`] and stores the result in the
//! request extensions as an [`AuthenticatedUser`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::response::IntoResponse;
use http::{request::Parts, Request};
use roster_core::entity::prelude::AccountModel;
use roster_core::service::accounts::{AccountsService, AccountsServiceError};
use tower::{Layer, Service};

use crate::error::ApiError;

pub type ValidationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AccountModel, AccountsServiceError>> + Send + 'a>>;

/// Resolves a session token to the account that owns it.
pub trait SessionValidator: Send + Sync + 'static {
    fn validate<'a>(&'a self, token: &'a str) -> ValidationFuture<'a>;
}

impl SessionValidator for AccountsService {
    fn validate<'a>(&'a self, token: &'a str) -> ValidationFuture<'a> {
        Box::pin(self.validate_session(token))
    }
}

/// The caller of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account: AccountModel,
    pub token: String,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

#[derive(Clone)]
pub struct AuthLayer<V: SessionValidator> {
    validator: Arc<V>,
    cookie_name: Arc<str>,
}

impl<V: SessionValidator> AuthLayer<V> {
    pub fn new(validator: Arc<V>, cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            validator,
            cookie_name: cookie_name.into(),
        }
    }
}

impl<V: SessionValidator, S> Layer<S> for AuthLayer<V> {
    type Service = AuthService<V, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            validator: self.validator.clone(),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService<V: SessionValidator, S> {
    inner: S,
    validator: Arc<V>,
    cookie_name: Arc<str>,
}

impl<V, S> Service<Request<Body>> for AuthService<V, S>
where
    V: SessionValidator,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let validator = self.validator.clone();
        let token = extract_session_token(&req, &self.cookie_name).map(str::to_string);

        Box::pin(async move {
            let Some(token) = token else {
                tracing::warn!(path = %req.uri().path(), "request without session token");
                return Ok(ApiError::unauthorized("Unauthorized").into_response());
            };

            match validator.validate(&token).await {
                Ok(account) => {
                    req.extensions_mut()
                        .insert(AuthenticatedUser { account, token });
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Err(AccountsServiceError::InvalidSession) => {
                    tracing::warn!(path = %req.uri().path(), "rejected session token");
                    Ok(ApiError::unauthorized("Unauthorized").into_response())
                }
                Err(err) => Ok(ApiError::from(err).into_response()),
            }
        })
    }
}

/// The bearer token if present, otherwise the session cookie.
fn extract_session_token<'a>(req: &'a Request<Body>, cookie_name: &str) -> Option<&'a str> {
    let bearer = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        req.headers()
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == cookie_name && !value.is_empty())
            .map(|(_, value)| value)
    })
}

/// `Set-Cookie` value that removes the session cookie from the browser.
pub fn clear_session_cookie(cookie_name: &str) -> String {
    format!("{cookie_name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use roster_core::ids::AccountId;
    use std::sync::Mutex;
    use tower::ServiceExt;

    // Accepts "valid-token" and rejects everything else.
    struct TestValidator;

    impl SessionValidator for TestValidator {
        fn validate<'a>(&'a self, token: &'a str) -> ValidationFuture<'a> {
            Box::pin(async move {
                if token == "valid-token" {
                    Ok(AccountModel {
                        id: AccountId::new(),
                        email: "ada@school.test".to_string(),
                        first_name: "Ada".to_string(),
                        last_name: "Teacher".to_string(),
                        is_admin: false,
                        created_at: chrono::Utc::now(),
                    })
                } else {
                    Err(AccountsServiceError::InvalidSession)
                }
            })
        }
    }

    #[derive(Clone)]
    struct MockService {
        captured_user: Arc<Mutex<Option<AuthenticatedUser>>>,
    }

    impl MockService {
        fn new() -> Self {
            Self {
                captured_user: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl Service<Request<Body>> for MockService {
        type Response = axum::response::Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let captured = self.captured_user.clone();
            Box::pin(async move {
                let user = req.extensions().get::<AuthenticatedUser>().cloned();
                *captured.lock().unwrap() = user;
                Ok((StatusCode::OK, "ok").into_response())
            })
        }
    }

    fn layer() -> AuthLayer<TestValidator> {
        AuthLayer::new(Arc::new(TestValidator), "roster_session")
    }

    #[test]
    fn test_extract_bearer_token() {
        let req = Request::builder()
            .header("Authorization", "Bearer my-token-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&req, "roster_session"), Some("my-token-123"));
    }

    #[test]
    fn test_extract_cookie_token() {
        let req = Request::builder()
            .header("Cookie", "theme=dark; roster_session=abc123; other=1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&req, "roster_session"), Some("abc123"));
    }

    #[test]
    fn test_extract_token_wrong_scheme_or_cookie() {
        let req = Request::builder()
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .header("Cookie", "roster_session_old=abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&req, "roster_session"), None);
    }

    #[test]
    fn test_clear_session_cookie_expires_immediately() {
        let cookie = clear_session_cookie("roster_session");
        assert!(cookie.starts_with("roster_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_missing_token_returns_401() {
        let service = layer().layer(MockService::new());

        let req = Request::builder().body(Body::empty()).unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_returns_401() {
        let service = layer().layer(MockService::new());

        let req = Request::builder()
            .header("Authorization", "Bearer bad-token")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_cookie_injects_user() {
        let mock = MockService::new();
        let captured = mock.captured_user.clone();
        let service = layer().layer(mock);

        let req = Request::builder()
            .header("Cookie", "roster_session=valid-token")
            .body(Body::empty())
            .unwrap();
        let resp = service.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let user = captured.lock().unwrap();
        let user = user.as_ref().expect("AuthenticatedUser should be present");
        assert_eq!(user.account.email, "ada@school.test");
        assert_eq!(user.token, "valid-token");
    }
}
