pub mod detached;
pub mod dialogs;
pub mod embedded;

pub use detached::DetachedHost;
pub use dialogs::{ConsoleDialogs, FallbackDialogs};
pub use embedded::{EmbeddedHost, HostAction, LaunchSnapshot};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::BoxFuture;

/// identity the host claims for the current user; untrusted until the backend confirms it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl HostUser {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// host-declared colors keyed by role (bg_color, text_color, ...); every role is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeParameters(BTreeMap<String, String>);

impl ThemeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: &str, color: &str) -> Self {
        self.0.insert(role.to_string(), color.to_string());
        self
    }

    pub fn get(&self, role: &str) -> Option<&str> {
        self.0.get(role).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// diagnostics about the embedding host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub present: bool,
    pub platform: Option<String>,
    pub version: Option<String>,
}

/// synchronous view of the embedding host plus its action primitives.
///
/// implementations must never fail: a missing host degrades every call to a safe default,
/// because the same app runs both inside the host and in a plain browser tab.
pub trait HostBridge: Send + Sync {
    /// true iff the host runtime is there and handed over a non-empty payload
    fn is_present(&self) -> bool;

    /// raw signed payload, verbatim; empty string when unavailable
    fn init_payload(&self) -> String;

    /// user block of the host's unsafe init data, kept apart from the signed payload
    fn claimed_user(&self) -> Option<HostUser>;

    fn theme_parameters(&self) -> ThemeParameters;

    fn platform_info(&self) -> PlatformInfo;

    fn signal_ready(&self);

    fn expand(&self);

    fn confirm_on_close(&self, enabled: bool);

    fn open_external_link(&self, target: &str);

    fn show_alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()>;

    fn show_confirm<'a>(&'a self, message: &'a str) -> BoxFuture<'a, bool>;
}
