use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::BootstrapConfig;
use crate::host::HostUser;
use crate::BoxFuture;

pub const COMMUNITY_HEADER: &str = "X-Community-ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingPayload,
    ServerRejected(u16, String),
    MalformedResponse(String),
    TransportFailure(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingPayload => write!(f, "missing auth payload"),
            ValidationError::ServerRejected(status, message) => {
                write!(f, "Server rejected credentials ({}): {}", status, message)
            }
            ValidationError::MalformedResponse(e) => write!(f, "Malformed response: {}", e),
            ValidationError::TransportFailure(e) => write!(f, "Transport failure: {}", e),
        }
    }
}

impl Error for ValidationError {}

impl From<reqwest::Error> for ValidationError {
    fn from(err: reqwest::Error) -> Self {
        ValidationError::TransportFailure(err.to_string())
    }
}

impl ValidationError {
    /// the backend answered and said no (or broke its contract)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ValidationError::ServerRejected(..) | ValidationError::MalformedResponse(_)
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ValidationError::TransportFailure(_))
    }
}

/// identity confirmed by the backend. only a validation round trip (or the debug-only
/// development bypass) can produce one; the fields are read-only outside this crate.
///
/// ```compile_fail
/// use miniapp_bootstrap::VerifiedUser;
///
/// let forged = VerifiedUser {
///     id: 666,
///     first_name: "Mallory".to_string(),
///     last_name: None,
///     username: None,
///     language_code: None,
///     is_premium: None,
///     photo_url: None,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedUser {
    id: i64,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
    is_premium: Option<bool>,
    photo_url: Option<String>,
}

impl VerifiedUser {
    pub(crate) fn from_backend(user: HostUser) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            language_code: user.language_code,
            is_premium: user.is_premium,
            photo_url: user.photo_url,
        }
    }

    /// stand-in identity for development runs outside the host
    pub(crate) fn development_stub() -> Self {
        Self {
            id: 123456789,
            first_name: "Test User".to_string(),
            last_name: None,
            username: Some("testuser".to_string()),
            language_code: None,
            is_premium: None,
            photo_url: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn language_code(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    pub fn is_premium(&self) -> Option<bool> {
        self.is_premium
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default)]
    user: Option<HostUser>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.detail.or(self.error).or(self.message)
    }
}

/// anything that can exchange an init payload for a verified identity
pub trait Validator: Send + Sync {
    fn validate<'a>(&'a self, payload: &'a str) -> BoxFuture<'a, Result<VerifiedUser, ValidationError>>;
}

/// talks to the backend verification endpoint
#[derive(Debug, Clone)]
pub struct ValidationClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
    community_id: Option<i64>,
}

impl ValidationClient {
    pub fn new(config: &BootstrapConfig) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let client = Client::builder()
            .user_agent(concat!("miniapp-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &BootstrapConfig) -> Self {
        Self {
            client,
            endpoint: config.validate_url.clone(),
            timeout: config.timeout,
            community_id: config.community_id,
        }
    }

    /// exchange the payload for a verified user, bounded by the configured timeout
    pub async fn validate(&self, payload: &str) -> Result<VerifiedUser, ValidationError> {
        if payload.is_empty() {
            warn!("Refusing to validate an empty payload");
            return Err(ValidationError::MissingPayload);
        }

        info!(
            "Validating init payload ({} bytes) against {}",
            payload.len(),
            self.endpoint
        );

        match timeout(self.timeout, self.validate_impl(payload)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Validation request timed out after {} seconds",
                    self.timeout.as_secs_f64()
                );
                Err(ValidationError::TransportFailure(format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }

    async fn validate_impl(&self, payload: &str) -> Result<VerifiedUser, ValidationError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::AUTHORIZATION, payload);
        if let Some(community_id) = self.community_id {
            request = request.header(COMMUNITY_HEADER, community_id.to_string());
        }

        let response = request.send().await.map_err(|e| {
            error!("Validation request failed: {}", e);
            ValidationError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Validation endpoint answered {} ({} bytes)", status, body.len());

        if !status.is_success() {
            let message = rejection_message(status, &body);
            warn!("Backend rejected init payload: {} {}", status.as_u16(), message);
            return Err(ValidationError::ServerRejected(status.as_u16(), message));
        }

        parse_success_body(status, &body)
    }
}

impl Validator for ValidationClient {
    fn validate<'a>(&'a self, payload: &'a str) -> BoxFuture<'a, Result<VerifiedUser, ValidationError>> {
        Box::pin(ValidationClient::validate(self, payload))
    }
}

fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        })
}

fn parse_success_body(status: StatusCode, body: &str) -> Result<VerifiedUser, ValidationError> {
    let parsed: ValidateResponse = serde_json::from_str(body).map_err(|e| {
        error!("Validation response is not valid JSON: {}", e);
        ValidationError::MalformedResponse(e.to_string())
    })?;

    if parsed.valid == Some(false) {
        let message = parsed
            .error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "validation rejected".to_string());
        warn!("Backend reported invalid payload: {}", message);
        return Err(ValidationError::ServerRejected(status.as_u16(), message));
    }

    match parsed.user {
        Some(user) => {
            info!("Init payload validated for user {}", user.id);
            Ok(VerifiedUser::from_backend(user))
        }
        None => {
            error!("Validation succeeded but response carries no user block");
            Err(ValidationError::MalformedResponse(
                "response has no user block".to_string(),
            ))
        }
    }
}
