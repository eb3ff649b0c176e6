use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::{ConsoleDialogs, FallbackDialogs, HostBridge, HostUser, PlatformInfo, ThemeParameters};
use crate::BoxFuture;

/// what the host handed over at launch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSnapshot {
    /// signed payload, handed to the backend untouched
    #[serde(default)]
    pub init_data: String,
    /// the host's own decoded user block (`initDataUnsafe.user`); unverified
    #[serde(default)]
    pub init_data_unsafe: Option<HostUser>,
    #[serde(default)]
    pub theme_params: ThemeParameters,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// requests forwarded to the host runtime
#[derive(Debug)]
pub enum HostAction {
    Ready,
    Expand,
    ConfirmOnClose(bool),
    OpenLink(String),
    ShowAlert {
        message: String,
        done: oneshot::Sender<()>,
    },
    ShowConfirm {
        message: String,
        answer: oneshot::Sender<bool>,
    },
}

/// bridge backed by a launch snapshot and a channel to the host runtime.
///
/// once the receiving side is gone every action falls back to the native dialogs.
#[derive(Clone)]
pub struct EmbeddedHost {
    snapshot: LaunchSnapshot,
    actions: mpsc::UnboundedSender<HostAction>,
    fallback: Arc<dyn FallbackDialogs>,
}

impl EmbeddedHost {
    pub fn new(snapshot: LaunchSnapshot) -> (Self, mpsc::UnboundedReceiver<HostAction>) {
        Self::with_fallback(snapshot, Arc::new(ConsoleDialogs))
    }

    pub fn with_fallback(
        snapshot: LaunchSnapshot,
        fallback: Arc<dyn FallbackDialogs>,
    ) -> (Self, mpsc::UnboundedReceiver<HostAction>) {
        let (actions, receiver) = mpsc::unbounded_channel();
        let host = Self {
            snapshot,
            actions,
            fallback,
        };
        (host, receiver)
    }

    fn send(&self, action: HostAction) -> Result<(), HostAction> {
        self.actions.send(action).map_err(|e| {
            debug!("Host runtime gone, action not delivered");
            e.0
        })
    }
}

impl HostBridge for EmbeddedHost {
    fn is_present(&self) -> bool {
        !self.snapshot.init_data.is_empty()
    }

    fn init_payload(&self) -> String {
        self.snapshot.init_data.clone()
    }

    fn claimed_user(&self) -> Option<HostUser> {
        if !self.is_present() {
            return None;
        }
        self.snapshot.init_data_unsafe.clone()
    }

    fn theme_parameters(&self) -> ThemeParameters {
        self.snapshot.theme_params.clone()
    }

    fn platform_info(&self) -> PlatformInfo {
        PlatformInfo {
            present: self.is_present(),
            platform: self.snapshot.platform.clone(),
            version: self.snapshot.version.clone(),
        }
    }

    fn signal_ready(&self) {
        let _ = self.send(HostAction::Ready);
    }

    fn expand(&self) {
        let _ = self.send(HostAction::Expand);
    }

    fn confirm_on_close(&self, enabled: bool) {
        let _ = self.send(HostAction::ConfirmOnClose(enabled));
    }

    fn open_external_link(&self, target: &str) {
        if self.send(HostAction::OpenLink(target.to_string())).is_err() {
            self.fallback.open_link(target);
        }
    }

    fn show_alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let (done, closed) = oneshot::channel();
            let action = HostAction::ShowAlert {
                message: message.to_string(),
                done,
            };
            if self.send(action).is_err() {
                return self.fallback.alert(message).await;
            }
            // a dropped sender just means the host closed the popup without telling us
            let _ = closed.await;
        })
    }

    fn show_confirm<'a>(&'a self, message: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let (answer, reply) = oneshot::channel();
            let action = HostAction::ShowConfirm {
                message: message.to_string(),
                answer,
            };
            if self.send(action).is_err() {
                return self.fallback.confirm(message).await;
            }
            match reply.await {
                Ok(confirmed) => confirmed,
                Err(_) => {
                    warn!("Host dropped confirm popup without an answer, treating as declined");
                    false
                }
            }
        })
    }
}
