use clap::Parser;
use licensy_admin::app::shell::{self, Shell};
use licensy_admin::core::ConfigProvider;
use licensy_admin::utils::error::{AdminError, ErrorSeverity};
use licensy_admin::utils::{logger, validation::Validate};
use licensy_admin::{AdminApp, ApiClient, AppSettings, CliConfig, FileTokenStore, TomlConfig};
use tokio::sync::mpsc;

async fn run_with<C: ConfigProvider + Validate>(config: C) -> licensy_admin::Result<()> {
    config.validate()?;

    let client = ApiClient::from_config(&config)?;
    let tokens = FileTokenStore::new(config.token_path());
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tracing::debug!(
        "API base: {}, token file: {}",
        config.api_base(),
        tokens.path().display()
    );

    let app = AdminApp::new(client, tokens, AppSettings::from_config(&config), events_tx);
    shell::run(Shell::new(app), events_rx).await
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting licensy-admin");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let result = match cli.config.clone() {
        Some(path) => match TomlConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path);
                run_with(config).await
            }
            Err(e) => Err(e),
        },
        None => run_with(cli).await,
    };

    if let Err(e) = result {
        report_and_exit(e);
    }
}

fn report_and_exit(e: AdminError) -> ! {
    tracing::error!(
        "❌ licensy-admin failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
