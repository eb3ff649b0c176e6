use clap::Parser;
use log::{info, warn};
use std::process::ExitCode;
use std::sync::Arc;

use miniapp_bootstrap::host::{HostAction, LaunchSnapshot};
use miniapp_bootstrap::localization::Lang;
use miniapp_bootstrap::utils::StatusFormatter;
use miniapp_bootstrap::{
    AppEnvironment, BootstrapConfig, BootstrapController, CssVariables, DetachedHost,
    EmbeddedHost, HostBridge, HostUser, ThemeParameters, ValidationClient,
};

#[derive(Parser)]
#[command(name = "miniapp-bootstrap")]
#[command(about = "Runs the Mini-App bootstrap handshake against a validation backend")]
struct Args {
    /// raw init data as handed over by Telegram; omit to simulate a plain browser tab
    #[arg(long, env = "TG_INIT_DATA")]
    init_data: Option<String>,

    /// the host's unverified user block as JSON, e.g. '{"id":42,"first_name":"Ann"}'
    #[arg(long)]
    user: Option<String>,

    /// theme params as a JSON object, e.g. '{"bg_color":"#17212b"}'
    #[arg(long)]
    theme: Option<String>,

    #[arg(long)]
    platform: Option<String>,

    #[arg(long = "host-version")]
    host_version: Option<String>,

    /// overrides BOOTSTRAP_VALIDATE_URL
    #[arg(long)]
    validate_url: Option<String>,

    /// overrides APP_ENV
    #[arg(long)]
    environment: Option<String>,

    /// ui language when no user language is known ("en", "ru")
    #[arg(long)]
    lang: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    // load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        match e {
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // .env file not found, which is fine
            }
            _ => {
                eprintln!("warning: failed to load .env file: {}", e);
            }
        }
    }

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let mut config = BootstrapConfig::from_env()?;
    if let Some(url) = &args.validate_url {
        config.validate_url = url::Url::parse(url)?;
    }
    if let Some(environment) = &args.environment {
        config.environment = AppEnvironment::parse(environment)?;
    }

    let theme: ThemeParameters = match &args.theme {
        Some(raw) => serde_json::from_str(raw)?,
        None => ThemeParameters::new(),
    };

    let claimed_user: Option<HostUser> = match &args.user {
        Some(raw) => Some(serde_json::from_str(raw)?),
        None => None,
    };

    let host: Arc<dyn HostBridge> = match args.init_data.filter(|data| !data.is_empty()) {
        Some(init_data) => {
            let snapshot = LaunchSnapshot {
                init_data,
                init_data_unsafe: claimed_user,
                theme_params: theme,
                platform: args.platform.clone(),
                version: args.host_version.clone(),
            };
            let (host, mut actions) = EmbeddedHost::new(snapshot);
            // stand-in host runtime: log what the app asks for
            tokio::spawn(async move {
                while let Some(action) = actions.recv().await {
                    match action {
                        HostAction::ShowConfirm { message, answer } => {
                            info!("host confirm: {}", message);
                            let _ = answer.send(false);
                        }
                        HostAction::ShowAlert { message, done } => {
                            info!("host alert: {}", message);
                            let _ = done.send(());
                        }
                        other => info!("host action: {:?}", other),
                    }
                }
            });
            Arc::new(host)
        }
        None => {
            warn!("No init data given, running as a plain browser tab");
            Arc::new(DetachedHost::new())
        }
    };

    let surface = Arc::new(CssVariables::new());
    let validator = Arc::new(ValidationClient::new(&config)?);
    let controller = BootstrapController::new(host, validator, surface.clone(), &config);

    let snapshot = controller.run().await;

    let knows_user = snapshot.result.verified_user().is_some() || snapshot.unverified_user.is_some();
    let lang = if knows_user {
        StatusFormatter::lang_for(&snapshot)
    } else {
        Lang::from_code(args.lang.as_deref())
    };
    let screen = StatusFormatter::render(&snapshot, lang);

    println!("{}", StatusFormatter::to_html(&screen, lang));
    println!("{}", surface.to_css());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if snapshot.result.is_validated() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
