use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, process, time::Duration};

use byte_unit::Byte;
use clap::{Args, Parser, Subcommand};
use logflood::{
    config::{self, PartialConfig, RunConfig},
    generator::{self, Generator},
};
use logflood_payload::Filler;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tokio::{io, runtime::Builder, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::Error),
    #[error("Generator returned an error: {0}")]
    Generator(#[from] generator::Error),
    #[error("Record error: {0}")]
    Payload(#[from] logflood_payload::Error),
    #[error("Failed to install prometheus exporter: {0}")]
    Prometheus(#[from] BuildError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn parse_record_size(input: &str) -> Result<Byte, String> {
    Byte::parse_str(input, true).map_err(|err| err.to_string())
}

// Parser for subcommand structure
#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct CliWithSubcommands {
    #[command(subcommand)]
    command: Commands,
}

// Parser for the flat structure, `logflood --records-per-second 10`
#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct CliFlat {
    #[command(flatten)]
    args: LogfloodArgs,
}

#[derive(Args, Debug)]
struct LogfloodArgs {
    /// path on disk to a YAML configuration file, flags take precedence
    #[clap(long)]
    config_path: Option<PathBuf>,
    /// arbitrary string to identify the run, output as the run_id field
    #[clap(long)]
    run_id: Option<String>,
    /// size of each log record, excluding the newline [default: 1KiB]
    #[clap(long, value_parser = parse_record_size)]
    record_size: Option<Byte>,
    /// number of log records per second to emit
    #[clap(long)]
    records_per_second: Option<NonZeroU32>,
    /// how long to emit logs for, e.g. 10s, 500ms, 1m30s [default: 10s]
    #[clap(long, value_parser = humantime::parse_duration, conflicts_with = "duration_infinite")]
    duration: Option<Duration>,
    /// emit logs until interrupted
    #[clap(long)]
    duration_infinite: bool,
    /// log every emitted record to stderr
    #[clap(long)]
    debug: bool,
    /// address to bind a prometheus exporter to
    #[clap(long)]
    prometheus_addr: Option<SocketAddr>,
}

impl LogfloodArgs {
    fn overrides(&self) -> PartialConfig {
        PartialConfig {
            run_id: self.run_id.clone(),
            record_size: self.record_size,
            records_per_second: self.records_per_second,
            duration: self.duration,
            duration_infinite: self.duration_infinite,
            debug: self.debug,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Emit records with the specified configuration
    Run(RunCommand),
    /// Validate configuration, including the record size, and exit
    ConfigCheck(RunCommand),
}

#[derive(Args)]
struct RunCommand {
    #[command(flatten)]
    args: LogfloodArgs,
}

fn get_config(args: &LogfloodArgs, config: Option<&str>) -> Result<RunConfig, Error> {
    let file = match config {
        Some(contents) => config::parse(contents)?,
        None => config::load(args.config_path.as_deref())?,
    };
    Ok(RunConfig::try_from(file.merge(args.overrides()))?)
}

fn validate_config(config: &RunConfig) -> Result<Filler, Error> {
    Ok(Filler::new(config.record_size, config.run_id.as_deref())?)
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Records own stdout, diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish()
        .init();
}

async fn inner_main(config: RunConfig, prometheus_addr: Option<SocketAddr>) -> Result<(), Error> {
    // The filler is computed here. A record size that can never be met stops
    // the process before anything is written.
    let generator = Generator::new(config, io::stdout())?;

    if let Some(addr) = prometheus_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        info!("Prometheus exporter listening on {addr}");
    }

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("received ctrl-c");
                ctrl_c.cancel();
            }
            Err(err) => warn!("unable to listen for ctrl-c: {err}"),
        }
    });

    let summary = generator.spin(shutdown).await?;
    info!(
        records_written = summary.records_written,
        bytes_written = summary.bytes_written,
        "run complete"
    );
    Ok(())
}

fn main() -> Result<(), Error> {
    // Two-parser fallback, the flat form is the common one.
    let (args, check_only) = match CliWithSubcommands::try_parse() {
        Ok(cli) => match cli.command {
            Commands::Run(cmd) => (cmd.args, false),
            Commands::ConfigCheck(cmd) => (cmd.args, true),
        },
        Err(_) => match CliFlat::try_parse() {
            Ok(flat) => (flat.args, false),
            Err(err) => err.exit(),
        },
    };

    let config = get_config(&args, None);
    init_tracing(config.as_ref().is_ok_and(|config| config.debug));

    if check_only {
        match config.and_then(|config| validate_config(&config)) {
            Ok(filler) => {
                info!(filler_bytes = filler.len(), "Configuration is valid");
                process::exit(0)
            }
            Err(err) => {
                error!("Configuration is invalid: {err}");
                process::exit(1)
            }
        }
    }

    let config = config.map_err(|err| {
        error!("Configuration is invalid: {err}");
        err
    })?;
    let version = env!("CARGO_PKG_VERSION");
    info!("Starting logflood {version} run.");

    let runtime = Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;
    let res = runtime.block_on(inner_main(config, args.prometheus_addr));
    if let Err(err) = &res {
        error!("{err}");
    }
    info!("Bye. :)");
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_flags_parse() {
        let args = vec![
            "logflood",
            "--run-id",
            "nightly",
            "--record-size",
            "2KiB",
            "--records-per-second",
            "100",
            "--duration",
            "3s",
        ];
        let cli = CliFlat::parse_from(args);
        let config = get_config(&cli.args, Some("{}")).expect("valid configuration");

        assert_eq!(config.run_id.as_deref(), Some("nightly"));
        assert_eq!(config.record_size, 2048);
        assert_eq!(config.records_per_second.get(), 100);
        assert_eq!(config.duration, Some(Duration::from_secs(3)));
    }

    #[test]
    fn sub_second_duration_parses() {
        let cli = CliFlat::parse_from(["logflood", "--records-per-second", "10", "--duration", "500ms"]);
        let config = get_config(&cli.args, Some("{}")).expect("valid configuration");
        assert_eq!(config.duration, Some(Duration::from_millis(500)));
    }

    #[test]
    fn compound_duration_parses() {
        let cli = CliFlat::parse_from(["logflood", "--records-per-second", "10", "--duration", "1m30s"]);
        assert_eq!(cli.args.duration, Some(Duration::from_secs(90)));
    }

    #[test]
    fn unitless_duration_rejected() {
        let res = CliFlat::try_parse_from(["logflood", "--records-per-second", "10", "--duration", "10"]);
        assert!(res.is_err());
    }

    #[test]
    fn plain_byte_count_parses() {
        let cli = CliFlat::parse_from(["logflood", "--record-size", "512", "--records-per-second", "1"]);
        assert_eq!(cli.args.record_size, Some(Byte::from_u64(512)));
    }

    #[test]
    fn rate_is_required() {
        let cli = CliFlat::parse_from(["logflood"]);
        let err = get_config(&cli.args, Some("{}")).expect_err("rate is unset");
        assert!(matches!(err, Error::Config(config::Error::MissingRate)));
    }

    #[test]
    fn flags_override_yaml() {
        let cli = CliFlat::parse_from(["logflood", "--records-per-second", "7"]);
        let config = get_config(
            &cli.args,
            Some("records_per_second: 1\nrun_id: from-yaml\n"),
        )
        .expect("valid configuration");
        assert_eq!(config.records_per_second.get(), 7);
        assert_eq!(config.run_id.as_deref(), Some("from-yaml"));
    }

    #[test]
    fn infinite_conflicts_with_seconds() {
        let res = CliFlat::try_parse_from([
            "logflood",
            "--records-per-second",
            "1",
            "--duration",
            "1s",
            "--duration-infinite",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn zero_rate_rejected() {
        let res = CliFlat::try_parse_from(["logflood", "--records-per-second", "0"]);
        assert!(res.is_err());
    }

    #[test]
    fn config_check_subcommand_parses() {
        let cli = CliWithSubcommands::parse_from([
            "logflood",
            "config-check",
            "--records-per-second",
            "1",
            "--record-size",
            "10",
        ]);
        let Commands::ConfigCheck(cmd) = cli.command else {
            panic!("expected config-check");
        };
        let config = get_config(&cmd.args, Some("{}")).expect("valid configuration");
        let err = validate_config(&config).expect_err("10 bytes is below the minimum");
        assert!(matches!(
            err,
            Error::Payload(logflood_payload::Error::SizeTooSmall { requested: 10, .. })
        ));
    }
}
