use clap::Parser;
use log::{error, info};
use quay::configuration::ServerConfig;
use quay::server::Server;
use quay::shutdown::Shutdown;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quay")]
#[command(version)]
#[command(about = "A bounded-concurrency TCP file depot server")]
struct Args {
    /// Optional TOML configuration file; defaults apply when omitted
    config_file: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(long)]
    bind_address: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,

    /// Override the configured admission ceiling
    #[arg(long)]
    max_clients: Option<usize>,

    /// Override the configured file repository directory
    #[arg(long)]
    file_repo: Option<PathBuf>,

    /// Override the configured socket/streaming buffer size in bytes
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Override the configured shutdown-flag polling interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Override the configured per-handler shutdown grace window in seconds
    #[arg(long)]
    shutdown_grace_secs: Option<u64>,
}

/// Flags given on the command line win over the configuration file.
fn apply_overrides(config: &mut ServerConfig, args: Args) {
    if let Some(bind_address) = args.bind_address {
        config.bind_address = bind_address;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(max_clients) = args.max_clients {
        config.max_clients = max_clients;
    }
    if let Some(file_repo) = args.file_repo {
        config.file_repo = file_repo;
    }
    if let Some(buffer_size) = args.buffer_size {
        config.buffer_size = buffer_size;
    }
    if let Some(poll_interval_ms) = args.poll_interval_ms {
        config.poll_interval_ms = poll_interval_ms;
    }
    if let Some(shutdown_grace_secs) = args.shutdown_grace_secs {
        config.shutdown_grace_secs = shutdown_grace_secs;
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    let mut config = match ServerConfig::load(args.config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, args);

    let server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    println!("--------------------------------------------------");
    println!(
        "  quay v{} - TCP file depot server",
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "  {}:{} (up to {} clients)",
        server.config().bind_address,
        server.config().port,
        server.config().max_clients
    );
    println!("--------------------------------------------------");

    let shutdown = Shutdown::new();
    let flag = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("[Server] Shutting down...");
            flag.raise();
        }
    });

    if let Err(e) = server.run(shutdown).await {
        error!("Server error: {}, exiting...", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_config_field_has_a_flag() {
        let args = Args::try_parse_from([
            "quay",
            "--bind-address",
            "0.0.0.0",
            "--port",
            "9000",
            "--max-clients",
            "8",
            "--file-repo",
            "depot",
            "--buffer-size",
            "8192",
            "--poll-interval-ms",
            "250",
            "--shutdown-grace-secs",
            "5",
        ])
        .unwrap();

        let mut config = ServerConfig::default();
        apply_overrides(&mut config, args);

        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_clients, 8);
        assert_eq!(config.file_repo, PathBuf::from("depot"));
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.shutdown_grace_secs, 5);
    }

    #[test]
    fn test_omitted_flags_leave_config_untouched() {
        let args = Args::try_parse_from(["quay", "--port", "9000"]).unwrap();

        let defaults = ServerConfig::default();
        let mut config = defaults.clone();
        apply_overrides(&mut config, args);

        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_address, defaults.bind_address);
        assert_eq!(config.buffer_size, defaults.buffer_size);
        assert_eq!(config.poll_interval_ms, defaults.poll_interval_ms);
        assert_eq!(config.shutdown_grace_secs, defaults.shutdown_grace_secs);
    }
}
