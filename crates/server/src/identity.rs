//! Identity providers: bearer-token verification and account sign-up.
//!
//! Credentials never touch the record store. A provider either keeps tokens
//! in process ([`StaticTokenProvider`]) or delegates to a GoTrue-compatible
//! auth service ([`RemoteIdentityProvider`]).

use std::collections::HashMap;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No access token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Signup failed: {0}")]
    SignUpRejected(String),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// The authenticated caller, attached to each request after verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct SignedUp {
    pub user: Identity,
    /// Token the new account can use immediately, when the provider issues one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Well-known demo account, provisioned on request.
pub const DEMO_EMAIL: &str = "demo@elix.com";
pub const DEMO_PASSWORD: &str = "demo123";
pub const DEMO_NAME: &str = "Operations Director";
pub const DEMO_ROLE: &str = "operations_director";

impl SignUpRequest {
    /// Sign-up for the demo account.
    pub fn demo() -> Self {
        SignUpRequest {
            email: DEMO_EMAIL.into(),
            password: DEMO_PASSWORD.into(),
            name: Some(DEMO_NAME.into()),
            role: Some(DEMO_ROLE.into()),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolve a bearer token to the user it belongs to.
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;

    /// Register a new account.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignedUp, AuthError>;

    /// Look up an existing account by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError>;

    fn provider_name(&self) -> &str;
}

/// In-process provider for development and tests.
///
/// Tokens are opaque random strings. Accounts created through
/// [`IdentityProvider::sign_up`] live only as long as the process.
#[derive(Default)]
pub struct StaticTokenProvider {
    tokens: RwLock<HashMap<String, Identity>>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `identity`.
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.get_mut().insert(token.into(), identity);
        self
    }
}

fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignedUp, AuthError> {
        if request.email.trim().is_empty() || !request.email.contains('@') {
            return Err(AuthError::SignUpRejected("a valid email is required".into()));
        }
        if request.password.is_empty() {
            return Err(AuthError::SignUpRejected("password is required".into()));
        }

        let mut tokens = self.tokens.write().await;
        let taken = tokens
            .values()
            .any(|user| user.email.as_deref() == Some(request.email.as_str()));
        if taken {
            return Err(AuthError::SignUpRejected(
                "a user with this email address has already been registered".into(),
            ));
        }

        let user = Identity {
            id: format!("user-{}", random_hex(8)),
            email: Some(request.email.clone()),
        };
        let token = random_hex(24);
        tokens.insert(token.clone(), user.clone());
        Ok(SignedUp {
            user,
            access_token: Some(token),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .find(|user| user.email.as_deref() == Some(email))
            .cloned())
    }

    fn provider_name(&self) -> &str {
        "static"
    }
}

/// Delegates to a GoTrue-compatible auth API (`/auth/v1/...`).
///
/// Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so the
/// runtime is never blocked on the network.
pub struct RemoteIdentityProvider {
    base_url: String,
    service_key: String,
}

impl RemoteIdentityProvider {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }
}

fn agent() -> ureq::Agent {
    ureq::Agent::new_with_config(
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build(),
    )
}

/// Best human-readable message in a GoTrue error body.
fn error_message(body: &Value) -> String {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .unwrap_or("unknown error")
        .to_string()
}

fn identity_from(body: &Value) -> Option<Identity> {
    let id = body.get("id").and_then(Value::as_str)?;
    Some(Identity {
        id: id.to_string(),
        email: body.get("email").and_then(Value::as_str).map(str::to_string),
    })
}

/// The user in an admin listing (`{"users": [...]}`) whose email matches
/// exactly. The listing filter is a substring match.
fn user_with_email(body: &Value, email: &str) -> Option<Identity> {
    body.get("users")?
        .as_array()?
        .iter()
        .filter_map(identity_from)
        .find(|user| {
            user.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
        })
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let key = self.service_key.clone();
        let token = token.to_string();

        let (status, body) = tokio::task::spawn_blocking(move || {
            let mut response = agent()
                .get(&url)
                .header("apikey", &key)
                .header("Authorization", &format!("Bearer {}", token))
                .call()
                .map_err(|e| AuthError::Unavailable(e.to_string()))?;
            let status = response.status().as_u16();
            let body: Value = response.body_mut().read_json().unwrap_or(Value::Null);
            Ok::<_, AuthError>((status, body))
        })
        .await
        .map_err(|e| AuthError::Unavailable(e.to_string()))??;

        if !(200..300).contains(&status) {
            tracing::debug!(status, "identity provider rejected token");
            return Err(AuthError::InvalidToken);
        }
        identity_from(&body).ok_or(AuthError::InvalidToken)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignedUp, AuthError> {
        let url = format!("{}/auth/v1/admin/users", self.base_url);
        let key = self.service_key.clone();
        let payload = serde_json::json!({
            "email": request.email,
            "password": request.password,
            "user_metadata": {
                "name": request.name,
                "role": request.role.as_deref().unwrap_or(elix_core::record::DEFAULT_ROLE),
            },
            "email_confirm": true,
        });

        let (status, body) = tokio::task::spawn_blocking(move || {
            let mut response = agent()
                .post(&url)
                .header("apikey", &key)
                .header("Authorization", &format!("Bearer {}", key))
                .send_json(&payload)
                .map_err(|e| AuthError::Unavailable(e.to_string()))?;
            let status = response.status().as_u16();
            let body: Value = response.body_mut().read_json().unwrap_or(Value::Null);
            Ok::<_, AuthError>((status, body))
        })
        .await
        .map_err(|e| AuthError::Unavailable(e.to_string()))??;

        if !(200..300).contains(&status) {
            return Err(AuthError::SignUpRejected(error_message(&body)));
        }
        let user = identity_from(&body)
            .ok_or_else(|| AuthError::Unavailable("sign-up response had no user id".into()))?;
        Ok(SignedUp {
            user,
            access_token: None,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        let url = format!(
            "{}/auth/v1/admin/users?filter={}",
            self.base_url,
            urlencoding::encode(email)
        );
        let key = self.service_key.clone();

        let (status, body) = tokio::task::spawn_blocking(move || {
            let mut response = agent()
                .get(&url)
                .header("apikey", &key)
                .header("Authorization", &format!("Bearer {}", key))
                .call()
                .map_err(|e| AuthError::Unavailable(e.to_string()))?;
            let status = response.status().as_u16();
            let body: Value = response.body_mut().read_json().unwrap_or(Value::Null);
            Ok::<_, AuthError>((status, body))
        })
        .await
        .map_err(|e| AuthError::Unavailable(e.to_string()))??;

        if !(200..300).contains(&status) {
            return Err(AuthError::Unavailable(error_message(&body)));
        }
        Ok(user_with_email(&body, email))
    }

    fn provider_name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(email: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.into(),
            password: "hunter2".into(),
            name: Some("Site Lead".into()),
            role: None,
        }
    }

    #[tokio::test]
    async fn configured_token_verifies() {
        let provider = StaticTokenProvider::new().with_token(
            "dev",
            Identity {
                id: "u-dev".into(),
                email: None,
            },
        );
        assert_eq!(provider.verify("dev").await.unwrap().id, "u-dev");
        assert!(matches!(
            provider.verify("other").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn sign_up_issues_a_working_token() {
        let provider = StaticTokenProvider::new();
        let signed = provider.sign_up(&request("lead@example.com")).await.unwrap();
        let token = signed.access_token.unwrap();
        let who = provider.verify(&token).await.unwrap();
        assert_eq!(who, signed.user);
        assert!(who.id.starts_with("user-"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let provider = StaticTokenProvider::new();
        provider.sign_up(&request("lead@example.com")).await.unwrap();
        let err = provider.sign_up(&request("lead@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::SignUpRejected(_)), "{err:?}");
        let err = provider.sign_up(&request("not-an-email")).await.unwrap_err();
        assert!(matches!(err, AuthError::SignUpRejected(_)));
    }

    #[tokio::test]
    async fn accounts_are_found_by_email() {
        let provider = StaticTokenProvider::new();
        assert_eq!(provider.find_by_email(DEMO_EMAIL).await.unwrap(), None);
        let signed = provider.sign_up(&SignUpRequest::demo()).await.unwrap();
        assert_eq!(
            provider.find_by_email(DEMO_EMAIL).await.unwrap(),
            Some(signed.user)
        );
    }

    #[test]
    fn admin_listing_matches_exact_email() {
        let body = json!({
            "users": [
                { "id": "u1", "email": "ops.demo@elix.com" },
                { "id": "u2", "email": "Demo@Elix.com" }
            ]
        });
        assert_eq!(user_with_email(&body, DEMO_EMAIL).unwrap().id, "u2");
        assert_eq!(user_with_email(&json!({ "users": [] }), DEMO_EMAIL), None);
        assert_eq!(user_with_email(&Value::Null, DEMO_EMAIL), None);
    }

    #[test]
    fn gotrue_error_bodies() {
        assert_eq!(error_message(&json!({"msg": "email taken"})), "email taken");
        assert_eq!(
            error_message(&json!({"error_description": "bad jwt"})),
            "bad jwt"
        );
        assert_eq!(error_message(&Value::Null), "unknown error");
    }

    #[tokio::test]
    async fn unreachable_remote_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments.
        let provider = RemoteIdentityProvider::new("http://127.0.0.1:9/", "key");
        let err = provider.verify("token").await.unwrap_err();
        assert!(matches!(err, AuthError::Unavailable(_)), "{err:?}");
    }
}
