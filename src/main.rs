mod generator;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use generator::shutdown::EXIT_CONFIG;
use generator::{GeneratorConfig, LogFormat, Protocol};

/// Send synthetic OTLP logs to a collector.
#[derive(Parser, Debug)]
#[command(name = "otlp-log-generator")]
#[command(about = "Send synthetic OTLP logs over gRPC or HTTP")]
#[command(version)]
struct Args {
    /// Use HTTP protocol instead of gRPC.
    #[arg(long)]
    http: bool,

    /// OTLP endpoint (overrides the protocol default).
    #[arg(long)]
    endpoint: Option<String>,

    /// Number of records to send.
    #[arg(long)]
    count: Option<usize>,

    /// Delay between records in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Maximum records per export batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Seed for reproducible record content.
    #[arg(long)]
    seed: Option<u64>,

    /// Console log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Write console logs as JSON.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(self, mut config: GeneratorConfig) -> GeneratorConfig {
        if self.http {
            config.protocol = Protocol::Http;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = Some(endpoint);
        }
        if let Some(count) = self.count {
            config.record_count = count;
        }
        if let Some(ms) = self.interval_ms {
            config.emit_interval = Duration::from_millis(ms);
        }
        if let Some(size) = self.batch_size {
            config.max_batch_size = size;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.json {
            config.log_format = LogFormat::Json;
        }
        config
    }
}

/// Resolves on Ctrl+C or SIGTERM. Never resolves if no handler can be installed.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            warn!(error = %e, "Ctrl+C handler unavailable");
                            sigterm.recv().await;
                        }
                    }
                    _ = sigterm.recv() => {}
                }
                return;
            }
            Err(e) => warn!(error = %e, "SIGTERM handler unavailable"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match GeneratorConfig::from_env() {
        Ok(config) => args.apply(config),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    generator::console::init_subscriber(&config);

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received interrupt, stopping...");
        let _ = stop.send(true);
    });

    match generator::run(&config, shutdown).await {
        Ok(outcome) => {
            info!(
                emitted = outcome.emitted,
                delivered = outcome.delivered,
                failed = outcome.failed,
                interrupted = outcome.interrupted,
                "Done sending logs"
            );
            ExitCode::from(outcome.exit_status())
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_grpc() {
        let args = Args::parse_from(["otlp-log-generator"]);

        let config = args.apply(GeneratorConfig::new("svc", "1.0"));

        assert_eq!(config.protocol, Protocol::Grpc);
        assert_eq!(config.endpoint(), "http://localhost:4317");
    }

    #[test]
    fn http_flag_selects_http_transport() {
        let args = Args::parse_from(["otlp-log-generator", "--http"]);

        let config = args.apply(GeneratorConfig::new("svc", "1.0"));

        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.endpoint(), "http://localhost:4318/v1/logs");
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "otlp-log-generator",
            "--count",
            "5",
            "--interval-ms",
            "10",
            "--batch-size",
            "2",
            "--seed",
            "42",
            "--endpoint",
            "http://collector:4317",
            "--log-level",
            "debug",
            "--json",
        ]);

        let config = args.apply(GeneratorConfig::new("svc", "1.0"));

        assert_eq!(config.record_count, 5);
        assert_eq!(config.emit_interval, Duration::from_millis(10));
        assert_eq!(config.max_batch_size, 2);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.endpoint(), "http://collector:4317");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
