//! Heron - entry point
//!
//! Serves a static response through the configured header middleware.

use std::path::PathBuf;

use anyhow::Context;
use heron_config::ConfigLoader;
use heron_server::app;

const ENV_PREFIX: &str = "HERON";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("heron {}", heron_server::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r#"Heron - response header injection server

USAGE:
    heron [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    HERON__SERVER__HTTP_ADDR                  Listen address (default: 0.0.0.0:8080)
    HERON__LOGGING__LEVEL                     Log level or filter directive
    HERON__LOGGING__FORMAT                    json or pretty
    HERON__METRICS__ENABLED                   Serve Prometheus metrics
    HERON__FILTER__APPEND_VALUES              Merge into existing headers
    HERON__FILTER__SET_HEADERS_AFTER_SERVLET  Apply headers after the handler
    HERON__HEADER__<NAME>                     Header value, `_` becomes `-`

EXAMPLES:
    heron --config /etc/heron/heron.toml
    HERON__HEADER__X_FRAME_OPTIONS=DENY heron
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new()
        .with_defaults()
        .with_dotenv()
        .context("failed to read .env")?;
    if let Some(path) = &args.config {
        loader = loader
            .with_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
    }
    let config = loader
        .with_env_prefix(ENV_PREFIX)
        .load()
        .context("invalid configuration")?;

    heron_telemetry::init_logging(&app::log_config(&config.logging))
        .context("failed to initialize logging")?;
    heron_telemetry::init_metrics(&app::metrics_config(&config))
        .context("failed to initialize metrics")?;

    tracing::info!(
        version = heron_server::VERSION,
        headers = config.header_spec().len(),
        apply_after_downstream = config.header_spec().apply_after_downstream(),
        append_on_conflict = config.header_spec().append_on_conflict(),
        "Starting heron"
    );

    app::build_server(&config).run().await?;
    Ok(())
}
