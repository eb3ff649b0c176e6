//! Bootstrap handshake for Telegram Mini-Apps: detect the embedding host, exchange its signed
//! init payload with the backend for a verified identity, apply the host theme, and publish a
//! single result for the UI to render.

pub mod bootstrap;
pub mod config;
pub mod host;
pub mod localization;
pub mod theme;
pub mod utils;
pub mod validation;

use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use bootstrap::{
    BootstrapController, BootstrapResult, BootstrapSnapshot, BootstrapState, RetryOutcome,
};
pub use config::{AppEnvironment, BootstrapConfig, ConfigError};
pub use host::{DetachedHost, EmbeddedHost, HostBridge, HostUser, PlatformInfo, ThemeParameters};
pub use theme::{CssVariables, DisplaySurface, ThemeApplier};
pub use validation::{ValidationClient, ValidationError, Validator, VerifiedUser};
