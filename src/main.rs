//! mountserve binary.
//!
//! Usage:
//!   mountserve --port 8080 --mount /=./public --mount /docs=./target/doc
//!   mountserve --config /etc/mountserve/config.toml
//!   mountserve --print-config
//!
//! SIGHUP re-reads the config file and swaps the mount table; SIGINT and
//! SIGTERM stop the server.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use mountserve::config::{Config, DEFAULT_CONFIG_PATH};
use mountserve::server::{ServerSignal, SignalListener};
use mountserve::{logger, FileServer};

/// Serve local directories over HTTP under virtual path prefixes.
#[derive(Parser, Debug)]
#[command(name = "mountserve", version)]
#[command(about = "Embedded static-file HTTP server with virtual mounts")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Port to listen on, overrides server.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind, overrides server.host
    #[arg(long)]
    host: Option<String>,

    /// Mount a directory, as VIRTUAL=DIR (repeatable)
    #[arg(short, long = "mount", value_name = "VIRTUAL=DIR", value_parser = parse_mount)]
    mounts: Vec<(String, PathBuf)>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_mount(raw: &str) -> Result<(String, PathBuf), String> {
    let (virtual_path, dir) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected VIRTUAL=DIR, got '{raw}'"))?;
    if dir.is_empty() {
        return Err(format!("missing directory in '{raw}'"));
    }
    Ok((virtual_path.to_string(), PathBuf::from(dir)))
}

fn load_config(args: &Args) -> Result<Config, config::ConfigError> {
    let mut cfg = Config::load_from(&args.config)?;
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(host) = &args.host {
        cfg.server.host.clone_from(host);
    }
    Ok(cfg)
}

/// Config mounts first so a CLI mount at the same path wins
fn mount_entries(cfg: &Config, cli: &[(String, PathBuf)]) -> Vec<(String, PathBuf)> {
    cfg.mounts
        .iter()
        .map(|m| (m.path.clone(), m.dir.clone()))
        .chain(cli.iter().cloned())
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let cfg = load_config(&args)?;

    if args.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    // Keep the guard alive so buffered file output is flushed on exit
    let _log_guard = logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        info!("Using {workers} worker threads");
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(args, cfg))
}

async fn async_main(args: Args, cfg: Config) -> Result<(), Box<dyn Error>> {
    let server = FileServer::new(cfg.server_options()?);
    server.replace_mounts(mount_entries(&cfg, &args.mounts));
    if server.mounted_directories().is_empty() {
        logger::log_warning("No directories mounted; every request will get 404");
    }

    let mut signals = SignalListener::new()?;
    server.start(cfg.server.port)?;

    loop {
        match signals.recv().await {
            ServerSignal::Reload => {
                info!("SIGHUP received, reloading {}", args.config);
                match load_config(&args) {
                    Ok(fresh) => server.replace_mounts(mount_entries(&fresh, &args.mounts)),
                    Err(e) => logger::log_error(&format!("Reload failed, keeping mounts: {e}")),
                }
            }
            ServerSignal::Shutdown => {
                info!("Shutdown signal received");
                server.stop().await;
                return Ok(());
            }
        }
    }
}
