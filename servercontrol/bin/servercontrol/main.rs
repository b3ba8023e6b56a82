mod handlers;

use std::path::Path;

use clap::{CommandFactory, Parser};
use servercontrol::{
    cli::{ServerControlArgs, ServerControlSubcommand},
    config::LOG_SUBDIR,
    utils::{self, SERVER_LOG_PREFIX},
    ServerControlResult,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ServerControlResult<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = ServerControlArgs::parse();
    let home_dir = utils::get_servercontrol_home_path();

    let serving = matches!(args.subcommand, Some(ServerControlSubcommand::Serve { .. }));
    let _log_guard = init_tracing(args.verbose, serving.then_some(home_dir.as_path()))?;

    if args.version {
        println!("servercontrol {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match args.subcommand {
        Some(ServerControlSubcommand::Serve { host, port }) => {
            handlers::serve_subcommand(&home_dir, host, port).await?;
        }
        Some(ServerControlSubcommand::List) => {
            handlers::list_subcommand(&home_dir).await?;
        }
        Some(ServerControlSubcommand::Create {
            name,
            password,
            players,
            description,
            retry,
        }) => {
            handlers::create_subcommand(&home_dir, name, password, players, description, retry)
                .await?;
        }
        Some(ServerControlSubcommand::Start { id }) => {
            handlers::start_subcommand(&home_dir, &id).await?;
        }
        Some(ServerControlSubcommand::Stop { id }) => {
            handlers::stop_subcommand(&home_dir, &id).await?;
        }
        Some(ServerControlSubcommand::Rm { id }) => {
            handlers::rm_subcommand(&home_dir, &id).await?;
        }
        Some(ServerControlSubcommand::Logs { id }) => {
            handlers::logs_subcommand(&home_dir, &id).await?;
        }
        None => {
            ServerControlArgs::command().print_help()?;
        }
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Logs to stderr and, when `log_home` is given, to a daily file under `<log_home>/log`.
///
/// The returned guard must be held until exit so buffered file output is flushed.
fn init_tracing(
    verbose: bool,
    log_home: Option<&Path>,
) -> ServerControlResult<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_home {
        Some(home) => {
            let log_dir = home.join(LOG_SUBDIR);
            std::fs::create_dir_all(&log_dir)?;

            let appender = tracing_appender::rolling::daily(log_dir, SERVER_LOG_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
