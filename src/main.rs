use clap::Parser;
use pingora_core::server::configuration::Opt;
use pingora_core::server::Server;
use std::path::PathBuf;

use kagami::config::{Config, ResolvedConfig};
use kagami::logging::{init_subscriber, LogFormat};
use kagami::proxy::KagamiProxy;

/// Kagami - on-the-fly image transformation proxy built on Cloudflare's Pingora
#[derive(Parser, Debug)]
#[command(name = "kagami")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_subscriber(args.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // Load and resolve configuration; any error is fatal
    let config = Config::from_file(&args.config)
        .and_then(|config| config.resolve())
        .unwrap_or_else(|e| {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        });

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        sources = config.sources.len(),
        processors = config.processors.len(),
        routes = config.routes.len(),
        "Configuration loaded successfully"
    );

    if args.test {
        println!("Configuration file {} is valid", args.config.display());
        return;
    }

    let server = build_server(&args, &config).unwrap_or_else(|e| {
        eprintln!("Failed to start server: {:#}", e);
        std::process::exit(1);
    });

    // Blocks until shutdown
    server.run_forever();
}

fn build_server(args: &Args, config: &ResolvedConfig) -> anyhow::Result<Server> {
    // Build Pingora server options
    let opt = Opt {
        daemon: args.daemon,
        ..Default::default()
    };

    let mut server = Server::new(Some(opt))?;
    server.bootstrap();

    let proxy = KagamiProxy::new(config);

    let mut proxy_service = pingora_proxy::http_proxy_service(&server.configuration, proxy);
    proxy_service.threads = Some(config.server.threads);

    let listen_addr = config.server.listen_addr();
    proxy_service.add_tcp(&listen_addr);

    tracing::info!(
        address = %listen_addr,
        threads = config.server.threads,
        "Starting Kagami image proxy"
    );

    server.add_service(proxy_service);
    Ok(server)
}
