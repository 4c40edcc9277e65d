//! quiesced — multi-listener daemon with coordinated graceful shutdown.
//!
//! Runs the HTTP listeners declared in its YAML config and shuts them down
//! in three stages when the process receives SIGINT, SIGQUIT, or SIGTERM:
//! reject new requests everywhere, drain in-flight requests under one
//! deadline, run shutdown callbacks under a second deadline. A repeated
//! signal, or a shutdown that outlives the escalation deadline, ends the
//! process immediately with a non-zero status.
//!
//! ## Usage
//!
//! ```bash
//! # Run with the default config path
//! quiesced run
//!
//! # Run with an explicit config
//! quiesced run --config /etc/quiesced.yaml
//!
//! # Validate a config without starting anything
//! quiesced check --config /etc/quiesced.yaml
//! ```
//!
//! See `quiesced.example.yaml` for the configuration format.

use clap::{Args, Parser, Subcommand};
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use quiesce_http::{FnHandler, HttpServer};
use quiesce_operations::shutdown::{App, FnCallback, Listener, ShutdownCallback};
use quiesce_operations::{init_logging_from_config, load_config, MetricsRegistry, ServiceConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "quiesced")]
#[command(about = "Multi-listener daemon with coordinated graceful shutdown")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon until a termination signal arrives
    Run(RunArgs),
    /// Validate the configuration and exit
    Check(CheckArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "quiesced.yaml")]
    config: String,
}

#[derive(Args)]
struct CheckArgs {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "quiesced.yaml")]
    config: String,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(&args.config),
        Commands::Check(args) => check(&args.config),
    }
}

fn check(path: &str) {
    match load_config(path) {
        Ok(config) => println!("{}: ok ({} listener(s))", path, config.listeners.len()),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(path: &str) {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Keep the root logger and scope guard alive for the process lifetime;
    // dropping them tears down the async drain and the log bridge.
    let (_logger, _log_guard) = init_logging_from_config(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    runtime.block_on(serve(config));
    log::info!("process exit");
}

async fn serve(config: ServiceConfig) {
    let metrics = Arc::new(MetricsRegistry::new());

    let mut listeners: Vec<Arc<dyn Listener>> = Vec::with_capacity(config.listeners.len());
    for listener_config in &config.listeners {
        let addr = listener_config
            .addr
            .parse()
            .expect("validated listener address failed to parse");

        let mut server = HttpServer::new(listener_config.name.as_str(), addr);
        server.handle("/status", Arc::new(FnHandler::new(status_handler)));

        let server = if config.observability.metrics_enabled {
            server.with_rejected_counter(metrics.shutdown.requests_rejected.clone())
        } else {
            server
        };
        listeners.push(Arc::new(server));
    }

    // Log a final metrics snapshot while the process can still speak.
    let callbacks: Vec<Arc<dyn ShutdownCallback>> = vec![Arc::new(FnCallback::new(
        "metrics-snapshot",
        {
            let metrics = Arc::clone(&metrics);
            move |_budget| {
                let metrics = Arc::clone(&metrics);
                async move {
                    for line in metrics
                        .encode_prometheus()
                        .lines()
                        .filter(|line| !line.starts_with('#'))
                    {
                        log::info!("final metric: {}", line);
                    }
                }
            }
        },
    ))];

    let app = App::new(listeners)
        .with_drain_deadline(config.shutdown.drain_deadline())
        .with_callback_deadline(config.shutdown.callback_deadline())
        .with_escalation_deadline(config.shutdown.escalation_deadline())
        .with_shutdown_callbacks(callbacks)
        .with_metrics(metrics.shutdown.clone());

    log::info!(
        "serving {} listener(s); send SIGINT/SIGTERM to stop",
        config.listeners.len()
    );
    app.start_and_serve().await;
}

async fn status_handler(_req: Request<Incoming>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(b"ok\n")))
        .unwrap()
}
