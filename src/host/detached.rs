use log::debug;
use std::sync::Arc;

use super::{ConsoleDialogs, FallbackDialogs, HostBridge, HostUser, PlatformInfo, ThemeParameters};
use crate::BoxFuture;

/// bridge used outside the host (plain browser tab, terminal run)
#[derive(Clone)]
pub struct DetachedHost {
    dialogs: Arc<dyn FallbackDialogs>,
}

impl DetachedHost {
    pub fn new() -> Self {
        Self::with_dialogs(Arc::new(ConsoleDialogs))
    }

    pub fn with_dialogs(dialogs: Arc<dyn FallbackDialogs>) -> Self {
        Self { dialogs }
    }
}

impl Default for DetachedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBridge for DetachedHost {
    fn is_present(&self) -> bool {
        false
    }

    fn init_payload(&self) -> String {
        String::new()
    }

    fn claimed_user(&self) -> Option<HostUser> {
        None
    }

    fn theme_parameters(&self) -> ThemeParameters {
        ThemeParameters::new()
    }

    fn platform_info(&self) -> PlatformInfo {
        PlatformInfo::default()
    }

    fn signal_ready(&self) {
        debug!("signal_ready ignored: no host attached");
    }

    fn expand(&self) {
        debug!("expand ignored: no host attached");
    }

    fn confirm_on_close(&self, enabled: bool) {
        debug!("confirm_on_close({}) ignored: no host attached", enabled);
    }

    fn open_external_link(&self, target: &str) {
        self.dialogs.open_link(target);
    }

    fn show_alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()> {
        self.dialogs.alert(message)
    }

    fn show_confirm<'a>(&'a self, message: &'a str) -> BoxFuture<'a, bool> {
        self.dialogs.confirm(message)
    }
}
