use color_eyre::Result;
use llm_combat::{CombatEngine, CombatRules, ConsoleConfig, GenerationClient, GenerationConfig};
use std::process::ExitCode;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    // Load .env (optional). This allows reading OPENAI_API_KEY / GOOGLE_API_KEY from a local .env file.
    let _ = dotenvy::dotenv();

    // ログ: 標準出力はゲーム表示に使うので、ファイルへのみ出力する
    let file_appender = rolling::daily("logs", "combat.log");
    // _guard はdropするとログが失われるため、main 終了まで保持
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    // 資格情報が無ければ戦闘を作る前に終了
    let gen_config = match GenerationConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(target: "app", error = %e, "configuration_error");
            eprintln!("Configuration error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let console_config = match ConsoleConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(target: "app", error = %e, "configuration_error");
            eprintln!("Configuration error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::info!(target: "app", config = ?gen_config, "starting");

    let client = GenerationClient::from_config(&gen_config)?;
    let mut engine = CombatEngine::new(CombatRules::from_env(), client);

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    llm_combat::console::run(&mut engine, &mut input, &mut out, &console_config)?;
    Ok(ExitCode::SUCCESS)
}
