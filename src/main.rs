//! ONVIF device-management responder for a single-stream network camera.
//!
//! Answers identity, capability, profile, and stream-URI queries over
//! SOAP/HTTP so generic ONVIF clients can find the camera's RTSP stream.
//!
//! Usage:
//!   onvif-responder                                 # compiled-in defaults
//!   onvif-responder -c /etc/onvif/responder.conf
//!   onvif-responder -c responder.conf --stderr      # log to stderr

mod camera;
mod config;
mod error;
mod onvif;
mod server;
mod transport;
mod util;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{debug, error, info};
use tokio::time::MissedTickBehavior;

use crate::camera::StaticCamera;
use crate::onvif::device::DEVICE_SERVICE_PATH;
use crate::onvif::Responder;
use crate::server::ConnectionManager;
use crate::transport::TcpTransport;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "onvif-responder", about = "ONVIF device-management responder for a single-stream camera")]
struct Cli {
    /// Path to the configuration file.  Defaults apply when omitted.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the SOAP listening port.
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Log to stderr instead of syslog (useful for debugging).
    #[arg(long)]
    stderr: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => match config::load_config(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("onvif-responder: config error: {e}");
                process::exit(1);
            }
        },
        None => config::ResponderConfig::default(),
    };
    let cfg = match cli.port {
        Some(port) => config::ResponderConfig { port, ..cfg },
        None => cfg,
    };
    if let Err(e) = config::validate_config(&cfg) {
        eprintln!("onvif-responder: config validation: {e}");
        process::exit(1);
    }

    let use_syslog = cfg.log_syslog && !cli.stderr;
    if let Err(e) = setup_logging(use_syslog) {
        eprintln!("onvif-responder: logging setup: {e}");
        process::exit(1);
    }

    // Auto-detect the advertised address if not configured
    let cfg = if cfg.advertise_host.is_empty() {
        let host = util::advertised_host(util::get_own_ip());
        config::ResponderConfig { advertise_host: host, ..cfg }
    } else {
        cfg
    };
    let cfg = Arc::new(cfg);

    if !cfg.pid_file.as_os_str().is_empty() {
        if let Err(e) = util::write_pid_file(&cfg.pid_file) {
            error!("cannot write PID file {}: {e}", cfg.pid_file.display());
        }
    }

    let transport = match TcpTransport::bind(
        &cfg.bind_addr,
        cfg.port,
        Duration::from_millis(cfg.write_timeout_ms),
    ) {
        Ok(t) => t,
        Err(e) => {
            error!("cannot listen on {}:{}: {e}", cfg.bind_addr, cfg.port);
            process::exit(1);
        }
    };
    match transport.local_addr() {
        Ok(addr) => info!("starting ONVIF responder on {addr}"),
        Err(e) => error!("listening socket has no local address: {e}"),
    }
    info!("device service: {}{DEVICE_SERVICE_PATH}", cfg.service_base());
    info!("stream URI: {}", cfg.stream_uri());

    let camera = Box::new(StaticCamera::from_config(&cfg));
    let mut manager = ConnectionManager::new(transport, Responder::new(Arc::clone(&cfg), camera));

    let mut ticker = tokio::time::interval(Duration::from_millis(cfg.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut live = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                manager.tick();
                let now = manager.live_connection_count();
                if now != live {
                    debug!("live ONVIF connections: {now}");
                    live = now;
                }
            }
            res = &mut shutdown => {
                if let Err(e) = res {
                    error!("signal handler failed: {e}");
                }
                break;
            }
        }
    }

    info!("shutting down, closing {} connection(s)", manager.live_connection_count());
    manager.shutdown();
    if !cfg.pid_file.as_os_str().is_empty() {
        util::remove_pid_file(&cfg.pid_file);
    }
}

// ── Logging setup ─────────────────────────────────────────────────────────────

fn setup_logging(use_syslog: bool) -> anyhow::Result<()> {
    if use_syslog {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_DAEMON,
            hostname: None,
            process:  "onvif-responder".into(),
            pid:      process::id(),
        };
        let logger = syslog::unix(formatter)
            .map_err(|e| anyhow::anyhow!("syslog connect failed: {e}"))?;
        log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
            .map(|()| log::set_max_level(log::LevelFilter::Info))
            .map_err(|e| anyhow::anyhow!("set_logger: {e}"))?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .parse_default_env()
            .init();
    }
    Ok(())
}
