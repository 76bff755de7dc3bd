/// Identity provider abstraction
///
/// Account creation and login are delegated to an external identity service. The
/// service only keeps the resulting user identity in the session.
use crate::{
    error::{AppError, AppResult},
    models::{AuthenticatedUser, Credentials, SignUpOutcome},
};
use reqwest::{Client as HttpClient, Response};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::time::Duration;

const EMAIL_NOT_CONFIRMED: &str = "Email not confirmed";

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account; transient failures are retried
    async fn sign_up(&self, credentials: &Credentials) -> AppResult<SignUpOutcome>;

    /// Verifies credentials and returns the user identity
    async fn sign_in(&self, credentials: &Credentials) -> AppResult<AuthenticatedUser>;

    /// Sends the signup confirmation email again
    async fn resend_confirmation(&self, email: &str) -> AppResult<()>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Fixed-backoff retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Runs `call` until it succeeds, fails permanently, or attempts run out
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, operation: &str, mut call: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                tracing::warn!(
                    error = %e,
                    operation = %operation,
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::error!(
                        error = %e,
                        operation = %operation,
                        attempts = attempt,
                        "Giving up after retries"
                    );
                }
                return Err(e);
            }
        }
    }
}

// ============================================================================
// Supabase (GoTrue) API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<GoTrueUser> for AuthenticatedUser {
    fn from(user: GoTrueUser) -> Self {
        AuthenticatedUser {
            id: user.id,
            email: user.email,
            user_metadata: user.user_metadata,
        }
    }
}

/// Sign-up answers with a bare user when confirmation is pending, or a session otherwise
#[derive(Debug, Deserialize)]
struct GoTrueSignUp {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    user: Option<GoTrueUser>,
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    user: GoTrueUser,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueError {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Identity provider backed by the Supabase auth REST API
#[derive(Clone)]
pub struct SupabaseIdentity {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl SupabaseIdentity {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> AppResult<Response> {
        let url = format!("{}/auth/v1/{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        Ok(response)
    }

    /// Splits error responses into server faults (retryable) and rejections
    async fn check(response: Response) -> Result<Response, (u16, String)> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoTrueError>(&body)
            .ok()
            .and_then(GoTrueError::into_message)
            .unwrap_or(body);

        Err((status.as_u16(), message))
    }

    fn server_fault(status: u16, message: String) -> AppError {
        AppError::Upstream {
            status,
            body: message,
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn sign_up(&self, credentials: &Credentials) -> AppResult<SignUpOutcome> {
        with_retry(self.retry, "sign_up", || async move {
            let response = self
                .post(
                    "signup",
                    json!({ "email": credentials.email, "password": credentials.password }),
                )
                .await?;

            let response = match Self::check(response).await {
                Ok(response) => response,
                Err((status, message)) if status >= 500 => {
                    return Err(Self::server_fault(status, message))
                }
                Err((_, message)) => return Err(AppError::InvalidInput(message)),
            };

            let body: GoTrueSignUp = response.json().await?;
            let user_id = body.user.map(|u| u.id).or(body.id);

            Ok(SignUpOutcome {
                user_id,
                confirmation_required: body.access_token.is_none(),
            })
        })
        .await
    }

    async fn sign_in(&self, credentials: &Credentials) -> AppResult<AuthenticatedUser> {
        let response = self
            .post(
                "token?grant_type=password",
                json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;

        let response = match Self::check(response).await {
            Ok(response) => response,
            Err((status, message)) if status >= 500 => {
                return Err(Self::server_fault(status, message))
            }
            Err((_, message)) if message.contains(EMAIL_NOT_CONFIRMED) => {
                return Err(AppError::EmailNotConfirmed)
            }
            Err((_, message)) => return Err(AppError::Unauthorized(message)),
        };

        let session: GoTrueSession = response.json().await?;
        tracing::info!(user_id = %session.user.id, "User signed in");

        Ok(session.user.into())
    }

    async fn resend_confirmation(&self, email: &str) -> AppResult<()> {
        let response = self
            .post("resend", json!({ "type": "signup", "email": email }))
            .await?;

        match Self::check(response).await {
            Ok(_) => Ok(()),
            Err((status, message)) if status >= 500 => Err(Self::server_fault(status, message)),
            Err((_, message)) => Err(AppError::InvalidInput(message)),
        }
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn no_wait(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    fn creds() -> Credentials {
        Credentials {
            email: "viewer@example.com".to_string(),
            password: "Str0ng!pass".to_string(),
        }
    }

    async fn spawn_gotrue(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn identity(base_url: String) -> SupabaseIdentity {
        SupabaseIdentity::new(base_url, "anon-key".to_string(), Duration::from_secs(2))
            .unwrap()
            .with_retry_policy(no_wait(3))
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let calls = &AtomicU32::new(0);
        let result = with_retry(no_wait(3), "test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AppError::Upstream {
                    status: 503,
                    body: "busy".to_string(),
                })
            } else {
                Ok("created")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "created");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result: AppResult<()> = with_retry(no_wait(3), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Upstream {
                status: 502,
                body: "bad gateway".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: AppResult<()> = with_retry(no_wait(3), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::InvalidInput("User already registered".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sign_up_retries_server_errors() {
        let hits = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route(
                "/auth/v1/signup",
                post(|State(hits): State<Arc<AtomicU32>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "msg": "try later" })))
                    } else {
                        (
                            StatusCode::OK,
                            Json(json!({ "id": "user-1", "email": "viewer@example.com" })),
                        )
                    }
                }),
            )
            .with_state(hits.clone());
        let base_url = spawn_gotrue(router).await;

        let outcome = identity(base_url).sign_up(&creds()).await.unwrap();

        assert_eq!(outcome.user_id.as_deref(), Some("user-1"));
        assert!(outcome.confirmation_required);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sign_up_rejection_is_invalid_input() {
        let router = Router::new().route(
            "/auth/v1/signup",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "msg": "User already registered" })),
                )
            }),
        );
        let base_url = spawn_gotrue(router).await;

        let result = identity(base_url).sign_up(&creds()).await;
        assert!(matches!(result, Err(AppError::InvalidInput(msg)) if msg == "User already registered"));
    }

    #[tokio::test]
    async fn test_sign_in_returns_user() {
        let router = Router::new().route(
            "/auth/v1/token",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["email"], "viewer@example.com");
                Json(json!({
                    "access_token": "jwt",
                    "user": {
                        "id": "user-1",
                        "email": "viewer@example.com",
                        "user_metadata": { "name": "Viewer" }
                    }
                }))
            }),
        );
        let base_url = spawn_gotrue(router).await;

        let user = identity(base_url).sign_in(&creds()).await.unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("viewer@example.com"));
        assert_eq!(user.user_metadata["name"], "Viewer");
    }

    #[tokio::test]
    async fn test_sign_in_unconfirmed_email() {
        let router = Router::new().route(
            "/auth/v1/token",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_grant", "error_description": "Email not confirmed" })),
                )
            }),
        );
        let base_url = spawn_gotrue(router).await;

        let result = identity(base_url).sign_in(&creds()).await;
        assert!(matches!(result, Err(AppError::EmailNotConfirmed)));
    }

    #[tokio::test]
    async fn test_sign_in_bad_credentials() {
        let router = Router::new().route(
            "/auth/v1/token",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
                )
            }),
        );
        let base_url = spawn_gotrue(router).await;

        let result = identity(base_url).sign_in(&creds()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(msg)) if msg == "Invalid login credentials"));
    }
}
