//! Process entry point: role dispatch.
//!
//! The same binary runs three ways:
//! - master: owns the log sinks and supervises one worker per CPU
//! - worker (hidden `--worker` flag): serves HTTP, forwards logs upstream
//! - single process: cluster disabled in config, serves directly

use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use stoker::config::{self, AppConfig, Environment};
use stoker::http::{bind_listener, ApiServer};
use stoker::ipc::{IpcMessage, IpcSender};
use stoker::logging::{DirectSink, ForwardingSink, LogSink, Logger};
use stoker::supervisor::{cpu_count, Supervisor, WorkerCommand};

#[derive(Parser, Debug)]
#[command(name = "stoker", about = "Clustered web API scaffold")]
struct Cli {
    /// Explicit config file; overrides the environment convention.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Deployment environment, also settable via STOKER_ENV.
    #[arg(long, value_enum, env = "STOKER_ENV", default_value_t = Environment::Development)]
    env: Environment,

    /// Run as a supervised worker. Set by the master, not by hand.
    #[arg(long, hide = true)]
    worker: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_for_env(cli.env)?,
    };

    if cli.worker {
        run_worker(config).await
    } else if config.server.cluster {
        run_master(&cli, config).await
    } else {
        run_single(config).await
    }
}

/// Master role: direct sinks, worker pool, respawn on exit.
async fn run_master(cli: &Cli, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn LogSink> = Arc::new(DirectSink::new(&config.logging));
    install_panic_hook(Logger::new("Core", Arc::clone(&sink)));

    let mut args = vec!["--worker".to_string(), "--env".to_string(), cli.env.as_str().to_string()];
    if let Some(path) = &cli.config {
        args.push("--config".to_string());
        args.push(path.display().to_string());
    }
    let command = WorkerCommand::current_exe(args)?;

    let count = config.server.workers.unwrap_or_else(cpu_count);
    Supervisor::new(command, count, sink).run().await;
    Ok(())
}

/// Worker role: forward every log record to the master, serve HTTP.
async fn run_worker(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ipc = IpcSender::stdout();
    let sink: Arc<dyn LogSink> = Arc::new(ForwardingSink::new(ipc.clone()));
    let log = Logger::new("Core", Arc::clone(&sink));
    install_panic_hook(log.clone());

    // SO_REUSEPORT lets every sibling worker bind the same port
    let listener = bind_listener(config.server.http_port)?;
    ipc.send(&IpcMessage::Online);

    let server = ApiServer::new(config, log).await;
    server.run(listener).await?;
    Ok(())
}

/// Cluster disabled: serve from this process with direct sinks.
async fn run_single(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn LogSink> = Arc::new(DirectSink::new(&config.logging));
    let log = Logger::new("Core", Arc::clone(&sink));
    install_panic_hook(log.clone());

    let listener = bind_listener(config.server.http_port)?;
    log.info(
        &format!("Listening on 0.0.0.0:{}.", config.server.http_port),
        None,
    );

    let server = ApiServer::new(config, log).await;
    server.run(listener).await?;
    Ok(())
}

/// Report panics through the log sink. A panic inside a spawned task does
/// not take the process down; the supervisor only reacts to exits.
fn install_panic_hook(log: Logger) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log.error("Uncaught panic.", Some(json!({ "panic": info.to_string() })));
        default_hook(info);
    }));
}
