//! versions-exporter - Running vs latest upstream versions as Prometheus metrics
//!
//! The exporter provides:
//! - Discovery of workloads annotated with their upstream GitHub project
//! - Periodic lookup of each project's latest release
//! - The `application_info` gauge on `/metrics`

use clap::Parser;
use versions_exporter::{ExporterConfig, ExporterError, ExporterResult, Server};
use versions_exporter_observability::{init_tracing, TracingConfig};

const SERVICE_NAME: &str = "versions-exporter";

/// versions-exporter CLI
#[derive(Parser)]
#[command(name = "versions-exporter")]
#[command(about = "Export running and latest upstream versions of cluster workloads", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "VERSIONS_EXPORTER_CONFIG")]
    config: Option<String>,

    /// Metrics port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (panic, fatal, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json: bool,

    /// Connect with a kubeconfig instead of the in-cluster service account
    #[arg(long)]
    out_of_cluster: bool,

    /// Kubeconfig path (implies --out-of-cluster)
    #[arg(long)]
    kubeconfig: Option<String>,

    /// GitHub token for authenticated API requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Run a single cycle, print the records as JSON and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    /// Load configuration and apply command line overrides
    fn load_config(&self) -> ExporterResult<ExporterConfig> {
        let mut config = ExporterConfig::load(self.config.as_deref())?;

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = &self.log_level {
            config.loglevel = level.clone();
        }
        if self.json {
            config.log_json = true;
        }
        if self.out_of_cluster || self.kubeconfig.is_some() {
            config.out_of_cluster = true;
        }
        if let Some(path) = &self.kubeconfig {
            config.kubeconfig = Some(path.clone());
        }
        if let Some(token) = &self.github_token {
            config.github_token = Some(token.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExporterResult<()> {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = init_tracing(&TracingConfig::new(SERVICE_NAME));
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e);
        }
    };

    // Initialize tracing
    init_tracing(
        &TracingConfig::new(SERVICE_NAME)
            .with_log_level(config.loglevel.clone())
            .with_json_format(config.log_json),
    )?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        refresh_interval = %humantime::format_duration(config.refresh_interval()),
        port = config.listen_port(),
        out_of_cluster = config.out_of_cluster(),
        "Starting versions-exporter"
    );

    let server = match Server::from_config(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start versions-exporter");
            return Err(e);
        }
    };

    if cli.once {
        let records = server.run_once().await;
        let json = serde_json::to_string_pretty(&records).map_err(std::io::Error::from)?;
        println!("{}", json);
        return Ok(());
    }

    server.run().await.inspect_err(|e: &ExporterError| {
        tracing::error!(error = %e, "versions-exporter stopped with an error");
    })
}
