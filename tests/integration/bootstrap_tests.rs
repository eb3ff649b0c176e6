use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use miniapp_bootstrap::bootstrap::{MISSING_PAYLOAD_REASON, UNEXPECTED_FAILURE_REASON};
use miniapp_bootstrap::{
    BootstrapConfig, BootstrapController, BootstrapResult, BootstrapState,
    RetryOutcome, ThemeParameters, ValidationClient, ValidationError,
};

use super::mock_host::{host_user, CountingValidator, MockHost, RecordingSurface};
use super::{test_config, verified_user, TestBackend, VALIDATE_PATH};

fn controller_with(
    host: &MockHost,
    validator: &CountingValidator,
    surface: &RecordingSurface,
    config: &BootstrapConfig,
) -> BootstrapController {
    BootstrapController::new(
        Arc::new(host.clone()),
        Arc::new(validator.clone()),
        Arc::new(surface.clone()),
        config,
    )
}

async fn wait_for_state(controller: &BootstrapController, state: BootstrapState) {
    let mut receiver = controller.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        while receiver.borrow_and_update().state != state {
            receiver.changed().await.unwrap();
        }
    })
    .await
    .expect("state was never reached");
}

#[tokio::test]
async fn test_absent_host_reaches_not_in_host() {
    let host = MockHost::absent();
    let validator = CountingValidator::rejecting();
    let surface = RecordingSurface::default();
    let controller = controller_with(&host, &validator, &surface, &test_config());

    assert_eq!(controller.snapshot().state, BootstrapState::Idle);
    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::NotInHost);
    assert_eq!(snapshot.result, BootstrapResult::NotInHost);
    assert!(snapshot.retry_available());
    assert_eq!(validator.call_count(), 0);
    assert!(!host.was_called("signal_ready"));
    assert_eq!(surface.write_count(), 0);
}

#[cfg(debug_assertions)]
#[tokio::test]
async fn test_absent_host_in_development_gets_synthetic_user() {
    let host = MockHost::absent();
    let validator = CountingValidator::rejecting();
    let surface = RecordingSurface::default();
    let config = test_config()
        .with_environment(miniapp_bootstrap::AppEnvironment::Development);
    let controller = controller_with(&host, &validator, &surface, &config);

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::Validated);
    let user = snapshot.result.verified_user().unwrap();
    assert_eq!(user.id(), 123456789);
    assert_eq!(user.first_name(), "Test User");
    assert_eq!(user.username(), Some("testuser"));
    assert_eq!(validator.call_count(), 0);
}

#[tokio::test]
async fn test_present_host_without_payload_is_integrity_error() {
    let host = MockHost::present("");
    let validator = CountingValidator::rejecting();
    let surface = RecordingSurface::default();
    let controller = controller_with(&host, &validator, &surface, &test_config());

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::Error);
    assert_eq!(
        snapshot.result,
        BootstrapResult::Error(MISSING_PAYLOAD_REASON.to_string())
    );
    assert_eq!(validator.call_count(), 0);
}

#[tokio::test]
async fn test_host_signals_before_payload_is_read() {
    let host = MockHost::present("abc");
    let validator = CountingValidator::answering(Ok(verified_user(42, "Ann").await));
    let surface = RecordingSurface::default();
    let controller = controller_with(&host, &validator, &surface, &test_config());

    controller.run().await;

    assert_eq!(
        host.get_calls(),
        vec![
            "signal_ready",
            "expand",
            "confirm_on_close(true)",
            "theme_parameters",
            "init_payload",
        ]
    );
}

#[tokio::test]
async fn test_payload_reaches_validator_unmodified() {
    let payload = super::SAMPLE_INIT_DATA;
    let host = MockHost::present(payload);
    let validator = CountingValidator::answering(Ok(verified_user(42, "Ann").await));
    let surface = RecordingSurface::default();
    let controller = controller_with(&host, &validator, &surface, &test_config());

    controller.run().await;

    assert_eq!(*validator.payloads.lock().unwrap(), vec![payload.to_string()]);
}

#[tokio::test]
async fn test_backend_ok_reaches_validated() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path(VALIDATE_PATH))
        .and(header("Authorization", "abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user": {"id": 42, "first_name": "Ann"}})),
        )
        .expect(1)
        .mount(&backend.server)
        .await;

    let host = MockHost::present("abc");
    let surface = RecordingSurface::default();
    let controller = BootstrapController::new(
        Arc::new(host.clone()),
        Arc::new(ValidationClient::new(&backend.config).unwrap()),
        Arc::new(surface.clone()),
        &backend.config,
    );

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::Validated);
    assert_eq!(
        snapshot.result,
        BootstrapResult::Validated(verified_user(42, "Ann").await)
    );
    assert!(!snapshot.retry_available());
    assert_eq!(snapshot.unverified_user, None);
    assert!(snapshot.platform.present);
}

#[tokio::test]
async fn test_backend_unauthorized_never_exposes_claimed_user() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid Telegram auth data"})),
        )
        .mount(&backend.server)
        .await;

    let host = MockHost::present("forged").with_claimed_user(host_user(666, "Mallory"));
    let surface = RecordingSurface::default();
    let controller = BootstrapController::new(
        Arc::new(host),
        Arc::new(ValidationClient::new(&backend.config).unwrap()),
        Arc::new(surface),
        &backend.config,
    );

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::ValidationFailed);
    assert!(matches!(snapshot.result, BootstrapResult::ValidationFailed(ref reason) if reason.contains("401")));
    assert_eq!(snapshot.result.verified_user(), None);
    assert_eq!(snapshot.unverified_user, None);
    assert!(snapshot.retry_available());
}

#[cfg(debug_assertions)]
#[tokio::test]
async fn test_development_failure_shows_claimed_user_but_still_fails() {
    let backend = TestBackend::start().await.development();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;

    let host = MockHost::present("forged").with_claimed_user(host_user(5, "Dev"));
    let controller = BootstrapController::new(
        Arc::new(host),
        Arc::new(ValidationClient::new(&backend.config).unwrap()),
        Arc::new(RecordingSurface::default()),
        &backend.config,
    );

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::ValidationFailed);
    assert_eq!(snapshot.result.verified_user(), None);
    assert_eq!(snapshot.unverified_user, Some(host_user(5, "Dev")));
}

#[tokio::test]
async fn test_hanging_backend_ends_in_transport_error() {
    let backend = TestBackend::start()
        .await
        .with_timeout(Duration::from_millis(200));
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&backend.server)
        .await;

    let controller = BootstrapController::new(
        Arc::new(MockHost::present("abc")),
        Arc::new(ValidationClient::new(&backend.config).unwrap()),
        Arc::new(RecordingSurface::default()),
        &backend.config,
    );

    let snapshot = tokio::time::timeout(Duration::from_secs(3), controller.run())
        .await
        .expect("controller stayed in FetchingValidation");

    assert_eq!(snapshot.state, BootstrapState::Error);
    match snapshot.result {
        BootstrapResult::Error(reason) => assert!(reason.starts_with("Transport failure")),
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn test_double_retry_runs_one_pass() {
    let host = MockHost::present("abc");
    let validator = CountingValidator::rejecting().with_delay(Duration::from_millis(150));
    let surface = RecordingSurface::default();
    let controller = controller_with(&host, &validator, &surface, &test_config());

    let first = controller.run().await;
    assert_eq!(first.state, BootstrapState::ValidationFailed);
    assert_eq!(validator.call_count(), 1);

    assert_eq!(controller.retry(), RetryOutcome::Started);
    assert_eq!(controller.retry(), RetryOutcome::AlreadyRunning);

    let second = controller.settled().await;
    assert_eq!(second.state, BootstrapState::ValidationFailed);
    assert_eq!(validator.call_count(), 2);

    // nothing else is in flight
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(validator.call_count(), 2);
    assert_eq!(controller.snapshot(), second);
}

#[tokio::test]
async fn test_start_runs_once_per_mount() {
    let host = MockHost::absent();
    let validator = CountingValidator::rejecting();
    let controller = controller_with(
        &host,
        &validator,
        &RecordingSurface::default(),
        &test_config(),
    );

    controller.run().await;
    assert_eq!(controller.start(), RetryOutcome::AlreadyRunning);
    assert_eq!(controller.retry(), RetryOutcome::Started);
    assert_eq!(controller.settled().await.state, BootstrapState::NotInHost);
}

#[tokio::test]
async fn test_retry_replaces_failure_with_success() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user": {"id": 42, "first_name": "Ann"}})),
        )
        .mount(&backend.server)
        .await;

    let controller = BootstrapController::new(
        Arc::new(MockHost::present("abc")),
        Arc::new(ValidationClient::new(&backend.config).unwrap()),
        Arc::new(RecordingSurface::default()),
        &backend.config,
    );

    assert_eq!(controller.run().await.state, BootstrapState::ValidationFailed);
    assert_eq!(controller.retry(), RetryOutcome::Started);
    let snapshot = controller.settled().await;

    assert_eq!(
        snapshot.result,
        BootstrapResult::Validated(verified_user(42, "Ann").await)
    );
    assert_eq!(backend.request_count().await, 2);
}

#[tokio::test]
async fn test_shutdown_discards_outstanding_result() {
    let host = MockHost::present("abc");
    let validator = CountingValidator::answering(Ok(verified_user(42, "Ann").await))
        .with_delay(Duration::from_millis(200));
    let controller = controller_with(
        &host,
        &validator,
        &RecordingSurface::default(),
        &test_config(),
    );

    assert_eq!(controller.start(), RetryOutcome::Started);
    wait_for_state(&controller, BootstrapState::FetchingValidation).await;

    controller.shutdown();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(validator.call_count(), 1);
    assert_eq!(controller.snapshot().state, BootstrapState::FetchingValidation);
    assert_eq!(controller.result(), BootstrapResult::AwaitingValidation);
    assert_eq!(controller.retry(), RetryOutcome::TornDown);
}

#[tokio::test]
async fn test_panic_inside_pass_becomes_error() {
    let host = MockHost::present("abc").panicking_on_theme();
    let validator = CountingValidator::answering(Ok(verified_user(42, "Ann").await));
    let controller = controller_with(
        &host,
        &validator,
        &RecordingSurface::default(),
        &test_config(),
    );

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::Error);
    assert_eq!(
        snapshot.result,
        BootstrapResult::Error(UNEXPECTED_FAILURE_REASON.to_string())
    );
    assert_eq!(validator.call_count(), 0);
    assert!(!controller.is_running());
}

#[tokio::test]
async fn test_theme_applied_once_host_confirmed() {
    let host = MockHost::present("abc")
        .with_theme(ThemeParameters::new().with("bg_color", "#123456"));
    let validator = CountingValidator::rejecting();
    let surface = RecordingSurface::default();
    let controller = controller_with(&host, &validator, &surface, &test_config());

    controller.run().await;

    assert_eq!(surface.write_count(), 6);
    assert_eq!(surface.value_of("--tg-theme-bg-color").as_deref(), Some("#123456"));
    assert_eq!(surface.value_of("--tg-theme-text-color").as_deref(), Some("#000000"));
    assert_eq!(
        surface.value_of("--tg-theme-button-text-color").as_deref(),
        Some("#ffffff")
    );
}

#[tokio::test]
async fn test_platform_info_is_readable_without_side_effects() {
    let host = MockHost::present("abc");
    let controller = controller_with(
        &host,
        &CountingValidator::rejecting(),
        &RecordingSurface::default(),
        &test_config(),
    );

    let info = controller.platform_info();
    assert!(info.present);
    assert_eq!(info.platform.as_deref(), Some("tdesktop"));
    assert!(host.get_calls().is_empty());
    assert_eq!(controller.snapshot().state, BootstrapState::Idle);
}

#[cfg(debug_assertions)]
#[tokio::test]
async fn test_development_transport_error_shows_claimed_user_but_still_fails() {
    let backend = TestBackend::start()
        .await
        .development()
        .with_timeout(Duration::from_millis(200));
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&backend.server)
        .await;

    let host = MockHost::present("abc").with_claimed_user(host_user(5, "Dev"));
    let controller = BootstrapController::new(
        Arc::new(host),
        Arc::new(ValidationClient::new(&backend.config).unwrap()),
        Arc::new(RecordingSurface::default()),
        &backend.config,
    );

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::Error);
    assert!(matches!(snapshot.result, BootstrapResult::Error(ref reason) if reason.contains("timed out")));
    assert_eq!(snapshot.result.verified_user(), None);
    assert_eq!(snapshot.unverified_user, Some(host_user(5, "Dev")));
}

#[tokio::test]
async fn test_transport_error_hides_claimed_user_in_production() {
    let validator = CountingValidator::answering(Err(ValidationError::TransportFailure(
        "connection refused".to_string(),
    )));
    let host = MockHost::present("abc").with_claimed_user(host_user(5, "Dev"));
    let controller = controller_with(&host, &validator, &RecordingSurface::default(), &test_config());

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::Error);
    assert_eq!(snapshot.unverified_user, None);
}

#[tokio::test]
async fn test_fetching_validation_published_before_host_side_effects() {
    let host = MockHost::present("abc");
    let validator = CountingValidator::rejecting();
    let controller = controller_with(&host, &validator, &RecordingSurface::default(), &test_config());
    host.observe(controller.subscribe());

    controller.run().await;

    assert_eq!(host.states_at_ready(), vec![BootstrapState::FetchingValidation]);
}

#[tokio::test]
async fn test_settled_before_start_returns_idle() {
    let controller = controller_with(
        &MockHost::present("abc"),
        &CountingValidator::rejecting(),
        &RecordingSurface::default(),
        &test_config(),
    );

    let snapshot = tokio::time::timeout(Duration::from_millis(500), controller.settled())
        .await
        .expect("settled hung on an idle controller");

    assert_eq!(snapshot.state, BootstrapState::Idle);
    assert!(!snapshot.retry_available());
}

#[tokio::test]
async fn test_surface_failure_does_not_block_validation() {
    let host = MockHost::present("abc")
        .with_theme(ThemeParameters::new().with("bg_color", "#123456"));
    let validator = CountingValidator::answering(Ok(verified_user(42, "Ann").await));
    let surface = RecordingSurface::rejecting("--tg-theme-bg-color");
    let controller = controller_with(&host, &validator, &surface, &test_config());

    let snapshot = controller.run().await;

    assert_eq!(snapshot.state, BootstrapState::Validated);
    assert_eq!(surface.write_count(), 5);
    assert_eq!(surface.value_of("--tg-theme-bg-color"), None);
    assert_eq!(surface.value_of("--tg-theme-hint-color").as_deref(), Some("#999999"));
    assert_eq!(validator.call_count(), 1);
}
