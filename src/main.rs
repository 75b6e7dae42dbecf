use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use veritas::core::app_state::AppState;
use veritas::core::config::{load_file_config, resolve_log_file_target, resolve_proxy_url};
use veritas::events::{LogBufferLayer, LogBuffers};

fn parse_port_from_args() -> Option<u16> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--port" {
            if let Some(v) = args.next() {
                if let Ok(p) = v.parse::<u16>() {
                    return Some(p);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--port=") {
            if let Ok(p) = rest.parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

fn port_from_env() -> Option<u16> {
    for k in ["VERITAS_PORT", "PORT"] {
        if let Ok(v) = std::env::var(k) {
            if let Ok(p) = v.trim().parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));

    let log_buffers = LogBuffers::new();
    let log_buffer_layer = LogBufferLayer::new(log_buffers.clone());

    // `_log_file_guard` flushes the non-blocking file writer on drop — it
    // must live for the whole process, so it's bound here, not discarded.
    let (file_layer, _log_file_guard) = match resolve_log_file_target() {
        Some(target) => match std::fs::create_dir_all(&target.dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::never(&target.dir, &target.file_name);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("could not create log dir {}: {e}, file logging disabled", target.dir.display());
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(log_buffer_layer)
        .init();

    let port: u16 = parse_port_from_args().or_else(port_from_env).unwrap_or(8420);

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--setup") {
        let opts = veritas::setup::SetupOptions {
            mode: veritas::setup::SetupRunMode::SetupFlag,
            http_port: port,
            ..Default::default()
        };
        let report = veritas::setup::check_all(opts).await;
        println!("{report}");
        report.print_action_required_blocks();
        if report.has_failures() {
            std::process::exit(2);
        }
        return Ok(());
    }

    info!("Starting veritas-server");

    let report = veritas::setup::check_all(veritas::setup::SetupOptions {
        http_port: port,
        ..Default::default()
    })
    .await;
    info!("{}", report.summarize_for_logs());
    if report.has_failures() {
        warn!("setup: startup checklist found failures; run with --setup for guided remediation");
        report.print_action_required_blocks();
    }

    let http_timeout = env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(30);
    let connect_timeout = env::var("HTTP_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10);
    let mut http_client_builder = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(http_timeout))
        .connect_timeout(std::time::Duration::from_secs(connect_timeout));
    if let Some(proxy_url) = resolve_proxy_url() {
        match reqwest::Proxy::all(&proxy_url) {
            Ok(proxy) => http_client_builder = http_client_builder.proxy(proxy),
            Err(e) => warn!("invalid proxy URL from environment: {}", e),
        }
    }
    let http_client = http_client_builder.build()?;

    let file_config = load_file_config();
    let state = Arc::new(AppState::new(http_client, file_config, log_buffers));

    let app = veritas::http::build_router(state);

    // Local-only surface (spec.md §6) — bind to loopback, not 0.0.0.0.
    let bind_addr = format!("127.0.0.1:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "address already in use: {bind_addr}. Stop the existing process or set PORT/VERITAS_PORT \
                 (or pass --port) to pick a different one."
            )
        }
        Err(e) => return Err(e.into()),
    };
    info!("veritas-server listening on http://{}", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                match sigterm.as_mut() {
                    Some(s) => { s.recv().await; },
                    None => futures::future::pending::<()>().await,
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received, draining in-flight requests");
}
