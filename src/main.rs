//! Concurrent Monitor binary
//!
//! Serves the metrics HTTP API, or runs a single snapshot or collection
//! from the command line.

use clap::{Args, Parser, Subcommand};
use concurrent_monitor::{
    start_web_server, web::handlers::ConcurrentMetricsResponse, AppState, Collector,
    CollectorConfig, FailurePolicy, MonitorError, Sampler, SimulatedSampler, Snapshot,
    SystemSampler, WebConfig, DEFAULT_WEB_PORT, MAX_CONCURRENCY,
};
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "concurrent_monitor")]
#[command(about = "Concurrent system metrics sampling and aggregation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples system metrics from many concurrent tasks and serves the averages over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Use the seeded simulated sampler instead of host metrics
    #[arg(long)]
    simulated: bool,

    /// Seed for the simulated sampler
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Disable the every-tenth-slot failure injection
    #[arg(long)]
    no_injected_failures: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve(ServeArgs),

    /// Take a single snapshot and exit
    Snapshot(OutputArgs),

    /// Run one concurrent collection, print its average and exit
    Collect(CollectArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Largest concurrency a request may ask for
    #[arg(long, default_value_t = MAX_CONCURRENCY)]
    max_concurrency: usize,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            no_cors: false,
            max_concurrency: MAX_CONCURRENCY,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[derive(Args)]
struct CollectArgs {
    /// Number of concurrent sampling tasks
    #[arg(short, long, default_value_t = 5)]
    concurrency: usize,

    #[command(flatten)]
    output: OutputArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(&cli, args).await?,
        Some(Commands::Collect(args)) => collect_command(&cli, args).await?,
        None => serve_command(&cli, &ServeArgs::default()).await?,
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = env_filter(log_level(cli), rust_log.as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` wins when it is set and valid; otherwise the CLI level applies.
fn env_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    let from_cli = || EnvFilter::default().add_directive(LevelFilter::from_level(level).into());

    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| from_cli()),
        None => from_cli(),
    }
}

fn build_sampler(cli: &Cli) -> Arc<dyn Sampler> {
    if cli.simulated {
        info!("Using simulated sampler with seed {}", cli.seed);
        Arc::new(SimulatedSampler::new(cli.seed))
    } else {
        Arc::new(SystemSampler::new())
    }
}

fn collector_config(cli: &Cli, max_concurrency: usize) -> CollectorConfig {
    let policy = if cli.no_injected_failures {
        FailurePolicy::Never
    } else {
        FailurePolicy::default()
    };

    CollectorConfig::default()
        .with_max_concurrency(max_concurrency)
        .with_failure_policy(policy)
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    validate_serve_args(args)?;

    let config = WebConfig::new(&cli.host, cli.port)
        .with_cors(!args.no_cors)
        .with_max_concurrency(args.max_concurrency);

    info!("Web server configuration:");
    info!("  - Bind address: {}", config.bind_address());
    info!("  - CORS enabled: {}", config.enable_cors);
    info!("  - Max concurrency: {}", config.max_concurrency);

    let state = AppState::with_collector_config(
        build_sampler(cli),
        config,
        collector_config(cli, args.max_concurrency),
    );

    start_web_server(state).await?;

    Ok(())
}

fn validate_serve_args(args: &ServeArgs) -> Result<(), MonitorError> {
    if args.max_concurrency == 0 {
        return Err(MonitorError::config_error("--max-concurrency must be at least 1"));
    }
    Ok(())
}

async fn snapshot_command(cli: &Cli, args: &OutputArgs) -> anyhow::Result<()> {
    let sampler = build_sampler(cli);
    let snapshot = tokio::task::spawn_blocking(move || sampler.sample()).await?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        "pretty" => print_pretty_snapshot("Snapshot", &snapshot),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

async fn collect_command(cli: &Cli, args: &CollectArgs) -> anyhow::Result<()> {
    let collector = Collector::with_config(build_sampler(cli), collector_config(cli, MAX_CONCURRENCY));

    let results = collector.collect(args.concurrency).await?;
    let response = ConcurrentMetricsResponse::from_results(&results);

    match args.output.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&response)?),
        "pretty" => {
            print_pretty_snapshot("Average", &response.average_metrics);
            println!(
                "  Results: {} total, {} ok, {} failed",
                response.total_results, response.success_count, response.error_count
            );
            match response.performance_score {
                Some(score) => println!("  Performance score: {:.1}", score),
                None => println!("  Performance score: n/a (no successful samples)"),
            }
        }
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_snapshot(title: &str, snapshot: &Snapshot) {
    println!(
        "{} ({})",
        title,
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    println!("  CPU:       {:.1}%", snapshot.cpu_usage);
    println!("  Memory:    {:.1}%", snapshot.memory_usage);
    println!("  Disk:      {:.1}%", snapshot.disk_usage);
    println!("  Network:   {:.1}", snapshot.network_usage);
    println!("  Processes: {}", snapshot.process_count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["concurrent_monitor", "--port", "9090"]).unwrap();
        assert_eq!(cli.port, 9090);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["concurrent_monitor"]).unwrap();
        assert_eq!(cli.port, DEFAULT_WEB_PORT);
        assert_eq!(cli.host, "0.0.0.0");
        assert!(!cli.simulated);
        assert!(!cli.no_injected_failures);
    }

    #[test]
    fn test_collect_subcommand() {
        let cli = Cli::try_parse_from([
            "concurrent_monitor",
            "--simulated",
            "--seed",
            "9",
            "collect",
            "-c",
            "20",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.simulated);
        assert_eq!(cli.seed, 9);
        match cli.command {
            Some(Commands::Collect(args)) => {
                assert_eq!(args.concurrency, 20);
                assert_eq!(args.output.format, "json");
            }
            _ => panic!("expected collect subcommand"),
        }
    }

    #[test]
    fn test_log_level_selection() {
        let quiet = Cli::try_parse_from(["concurrent_monitor"]).unwrap();
        assert_eq!(log_level(&quiet), Level::WARN);

        let verbose = Cli::try_parse_from(["concurrent_monitor", "-v"]).unwrap();
        assert_eq!(log_level(&verbose), Level::INFO);

        let debug = Cli::try_parse_from(["concurrent_monitor", "-v", "--debug"]).unwrap();
        assert_eq!(log_level(&debug), Level::DEBUG);
    }

    #[test]
    fn test_env_filter_uses_cli_level_without_rust_log() {
        assert_eq!(env_filter(Level::DEBUG, None).to_string(), "debug");
        assert_eq!(env_filter(Level::INFO, Some("  ")).to_string(), "info");
    }

    #[test]
    fn test_env_filter_prefers_rust_log() {
        assert_eq!(env_filter(Level::WARN, Some("trace")).to_string(), "trace");
    }

    #[test]
    fn test_zero_max_concurrency_is_rejected() {
        let cli =
            Cli::try_parse_from(["concurrent_monitor", "serve", "--max-concurrency", "0"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert!(matches!(validate_serve_args(&args), Err(MonitorError::Config(_))));
            }
            _ => panic!("expected serve subcommand"),
        }

        assert!(validate_serve_args(&ServeArgs::default()).is_ok());
    }

    #[test]
    fn test_no_injected_failures_selects_never() {
        let cli =
            Cli::try_parse_from(["concurrent_monitor", "--no-injected-failures"]).unwrap();
        assert_eq!(collector_config(&cli, 50).failure_policy, FailurePolicy::Never);
        assert_eq!(collector_config(&cli, 50).max_concurrency, 50);
    }
}
