use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::BootstrapConfig;
use crate::host::{HostBridge, HostUser, PlatformInfo};
use crate::theme::{DisplaySurface, ThemeApplier};
use crate::validation::{Validator, VerifiedUser};

pub const MISSING_PAYLOAD_REASON: &str = "missing auth payload";
pub const UNEXPECTED_FAILURE_REASON: &str = "unexpected failure during bootstrap";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BootstrapState {
    Idle,
    CheckingHost,
    NotInHost,
    FetchingValidation,
    Validated,
    ValidationFailed,
    Error,
}

impl BootstrapState {
    pub fn name(&self) -> &'static str {
        match self {
            BootstrapState::Idle => "Idle",
            BootstrapState::CheckingHost => "CheckingHost",
            BootstrapState::NotInHost => "NotInHost",
            BootstrapState::FetchingValidation => "FetchingValidation",
            BootstrapState::Validated => "Validated",
            BootstrapState::ValidationFailed => "ValidationFailed",
            BootstrapState::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BootstrapState::NotInHost
                | BootstrapState::Validated
                | BootstrapState::ValidationFailed
                | BootstrapState::Error
        )
    }
}

/// what the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BootstrapResult {
    NotInHost,
    AwaitingValidation,
    Validated(VerifiedUser),
    ValidationFailed(String),
    Error(String),
}

impl BootstrapResult {
    pub fn verified_user(&self) -> Option<&VerifiedUser> {
        match self {
            BootstrapResult::Validated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_validated(&self) -> bool {
        matches!(self, BootstrapResult::Validated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapSnapshot {
    pub state: BootstrapState,
    pub result: BootstrapResult,
    /// host's own claim about the user, only filled by development fallbacks after a
    /// failed validation; never trusted
    pub unverified_user: Option<HostUser>,
    pub platform: PlatformInfo,
}

impl BootstrapSnapshot {
    fn idle() -> Self {
        Self {
            state: BootstrapState::Idle,
            result: BootstrapResult::AwaitingValidation,
            unverified_user: None,
            platform: PlatformInfo::default(),
        }
    }

    /// every settled state except Validated offers a retry
    pub fn retry_available(&self) -> bool {
        self.state.is_terminal() && !self.result.is_validated()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Started,
    AlreadyRunning,
    TornDown,
}

struct Inner {
    host: Arc<dyn HostBridge>,
    validator: Arc<dyn Validator>,
    surface: Arc<dyn DisplaySurface>,
    dev_fallbacks: bool,
    running: AtomicBool,
    torn_down: AtomicBool,
    generation: AtomicU64,
    snapshot: watch::Sender<BootstrapSnapshot>,
}

impl Inner {
    /// writes a snapshot unless the pass belongs to a torn-down generation
    fn publish(&self, generation: u64, next: BootstrapSnapshot, settles: bool) -> bool {
        self.snapshot.send_if_modified(|current| {
            if settles {
                self.running.store(false, Ordering::SeqCst);
            }
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(
                    "Discarding {} from a stale bootstrap pass",
                    next.state.name()
                );
                return false;
            }
            if current.state != next.state {
                info!(
                    "Bootstrap: {} -> {}",
                    current.state.name(),
                    next.state.name()
                );
            }
            *current = next;
            true
        })
    }

    fn transition(&self, generation: u64, state: BootstrapState, platform: &PlatformInfo) {
        let next = BootstrapSnapshot {
            state,
            result: BootstrapResult::AwaitingValidation,
            unverified_user: None,
            platform: platform.clone(),
        };
        self.publish(generation, next, false);
    }

    fn claimed_user_for_diagnostics(&self) -> Option<HostUser> {
        if !self.dev_fallbacks {
            return None;
        }
        let user = self.host.claimed_user();
        if user.is_some() {
            warn!("Development mode: exposing unverified host user next to the failure");
        }
        user
    }

    async fn run_pass(self: Arc<Self>, generation: u64) -> BootstrapSnapshot {
        let platform = self.host.platform_info();
        self.transition(generation, BootstrapState::CheckingHost, &platform);

        if !self.host.is_present() {
            if self.dev_fallbacks {
                warn!("Development mode: no host attached, substituting a synthetic user");
                return BootstrapSnapshot {
                    state: BootstrapState::Validated,
                    result: BootstrapResult::Validated(VerifiedUser::development_stub()),
                    unverified_user: None,
                    platform,
                };
            }
            info!("No host attached, app was opened outside the host application");
            return BootstrapSnapshot {
                state: BootstrapState::NotInHost,
                result: BootstrapResult::NotInHost,
                unverified_user: None,
                platform,
            };
        }

        self.transition(generation, BootstrapState::FetchingValidation, &platform);

        self.host.signal_ready();
        self.host.expand();
        self.host.confirm_on_close(true);
        ThemeApplier::apply(self.surface.as_ref(), &self.host.theme_parameters());

        let payload = self.host.init_payload();
        if payload.is_empty() {
            error!("Host is present but handed over no auth payload");
            return BootstrapSnapshot {
                state: BootstrapState::Error,
                result: BootstrapResult::Error(MISSING_PAYLOAD_REASON.to_string()),
                unverified_user: None,
                platform,
            };
        }

        match self.validator.validate(&payload).await {
            Ok(user) => {
                info!("Bootstrap validated user {}", user.id());
                BootstrapSnapshot {
                    state: BootstrapState::Validated,
                    result: BootstrapResult::Validated(user),
                    unverified_user: None,
                    platform,
                }
            }
            Err(e) if e.is_rejection() => {
                warn!("Bootstrap validation failed: {}", e);
                BootstrapSnapshot {
                    state: BootstrapState::ValidationFailed,
                    result: BootstrapResult::ValidationFailed(e.to_string()),
                    unverified_user: self.claimed_user_for_diagnostics(),
                    platform,
                }
            }
            Err(e) => {
                error!("Bootstrap validation error: {}", e);
                BootstrapSnapshot {
                    state: BootstrapState::Error,
                    result: BootstrapResult::Error(e.to_string()),
                    unverified_user: self.claimed_user_for_diagnostics(),
                    platform,
                }
            }
        }
    }
}

/// drives host detection and backend validation, and publishes one snapshot to the UI.
///
/// passes are sequential: a retry while a pass is in flight is ignored. dropping the
/// controller (or calling `shutdown`) discards whatever an outstanding pass produces.
pub struct BootstrapController {
    inner: Arc<Inner>,
}

impl BootstrapController {
    pub fn new(
        host: Arc<dyn HostBridge>,
        validator: Arc<dyn Validator>,
        surface: Arc<dyn DisplaySurface>,
        config: &BootstrapConfig,
    ) -> Self {
        let dev_fallbacks = config.dev_fallbacks();
        if dev_fallbacks {
            warn!("Bootstrap development fallbacks are enabled");
        }

        let (snapshot, _) = watch::channel(BootstrapSnapshot::idle());
        Self {
            inner: Arc::new(Inner {
                host,
                validator,
                surface,
                dev_fallbacks,
                running: AtomicBool::new(false),
                torn_down: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                snapshot,
            }),
        }
    }

    pub fn dev_fallbacks(&self) -> bool {
        self.inner.dev_fallbacks
    }

    /// first pass; a no-op once the controller left Idle
    pub fn start(&self) -> RetryOutcome {
        if self.inner.snapshot.borrow().state != BootstrapState::Idle {
            debug!("Bootstrap already started");
            return RetryOutcome::AlreadyRunning;
        }
        self.launch()
    }

    /// re-runs the whole sequence, discarding the previous result
    pub fn retry(&self) -> RetryOutcome {
        self.launch()
    }

    fn launch(&self) -> RetryOutcome {
        if self.inner.torn_down.load(Ordering::SeqCst) {
            debug!("Ignoring bootstrap request on a torn-down controller");
            return RetryOutcome::TornDown;
        }
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Bootstrap pass already in flight, ignoring request");
            return RetryOutcome::AlreadyRunning;
        }

        let inner = Arc::clone(&self.inner);
        let generation = inner.generation.load(Ordering::SeqCst);

        tokio::spawn(async move {
            let pass = tokio::spawn(Arc::clone(&inner).run_pass(generation));
            let settled = match pass.await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!("Bootstrap pass aborted: {}", e);
                    let platform = inner.snapshot.borrow().platform.clone();
                    BootstrapSnapshot {
                        state: BootstrapState::Error,
                        result: BootstrapResult::Error(UNEXPECTED_FAILURE_REASON.to_string()),
                        unverified_user: None,
                        platform,
                    }
                }
            };
            inner.publish(generation, settled, true);
        });

        RetryOutcome::Started
    }

    pub fn snapshot(&self) -> BootstrapSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn result(&self) -> BootstrapResult {
        self.inner.snapshot.borrow().result.clone()
    }

    pub fn platform_info(&self) -> PlatformInfo {
        self.inner.host.platform_info()
    }

    pub fn subscribe(&self) -> watch::Receiver<BootstrapSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// waits until no pass is in flight and the published state is terminal.
    /// a controller that was never started returns its Idle snapshot right away.
    pub async fn settled(&self) -> BootstrapSnapshot {
        let mut receiver = self.subscribe();
        loop {
            {
                let current = receiver.borrow_and_update();
                let idle = current.state == BootstrapState::Idle;
                if (idle || current.state.is_terminal()) && !self.is_running() {
                    return current.clone();
                }
            }
            if self.inner.torn_down.load(Ordering::SeqCst) || receiver.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// starts the first pass and waits for it to settle
    pub async fn run(&self) -> BootstrapSnapshot {
        self.start();
        self.settled().await
    }

    pub fn shutdown(&self) {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        // bump under the channel lock so an in-flight publish can't slip past the check;
        // the notification also wakes anyone waiting in `settled`
        self.inner.snapshot.send_modify(|_| {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        });
        info!("Bootstrap controller torn down");
    }
}

impl Drop for BootstrapController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
