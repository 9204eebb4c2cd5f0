mod report;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use elix_client::DashboardClient;
use elix_core::metrics::KpiSettings;
use elix_core::Snapshot;
use elix_server::ServerConfig;
use time::OffsetDateTime;

use crate::report::Report;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Elix asset operations backend.
#[derive(Parser)]
#[command(name = "elix", version, about = "Elix asset operations backend")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,
        /// Requests per minute per client IP (0 disables)
        #[arg(long)]
        rate_limit: Option<u64>,
        /// Persist records to this JSON file instead of memory
        #[arg(long)]
        store: Option<PathBuf>,
        /// Accept this bearer token
        #[arg(long)]
        api_token: Option<String>,
    },

    /// Print KPIs, category performance and ranked alerts
    Report {
        /// Snapshot JSON file ({assets, alerts, workOrders})
        #[arg(required_unless_present = "url", conflicts_with = "url")]
        snapshot: Option<PathBuf>,
        /// Read from a running server instead of a file
        #[arg(long)]
        url: Option<String>,
        /// Bearer token for --url
        #[arg(long, requires = "url")]
        token: Option<String>,
        /// Monthly budget the budget KPI is measured against (snapshot files only)
        #[arg(long, conflicts_with = "url")]
        budget: Option<f64>,
    },

    /// Print the built-in sample snapshot as JSON
    Sample,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.output, cli.quiet);

    match cli.command {
        Commands::Serve {
            config,
            port,
            bind,
            rate_limit,
            store,
            api_token,
        } => {
            let overrides = ServeOverrides {
                port,
                bind,
                rate_limit,
                store,
                api_token,
            };
            cmd_serve(config.as_deref(), overrides, cli.output, cli.quiet);
        }
        Commands::Report {
            snapshot,
            url,
            token,
            budget,
        } => {
            cmd_report(snapshot.as_deref(), url, token, budget, cli.output, cli.quiet);
        }
        Commands::Sample => cmd_sample(cli.output, cli.quiet),
    }
}

/// Logs go to stderr so `--output json` stays machine-readable.
fn init_logging(output: OutputFormat, quiet: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match output {
        OutputFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        OutputFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn runtime(output: OutputFormat, quiet: bool) -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("failed to create tokio runtime: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

struct ServeOverrides {
    port: Option<u16>,
    bind: Option<String>,
    rate_limit: Option<u64>,
    store: Option<PathBuf>,
    api_token: Option<String>,
}

impl ServeOverrides {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(limit) = self.rate_limit {
            config.rate_limit = limit;
        }
        if let Some(store) = self.store {
            config.store_path = Some(store);
        }
        if let Some(token) = self.api_token {
            config.api_token = Some(token);
        }
    }
}

fn cmd_serve(config_path: Option<&Path>, overrides: ServeOverrides, output: OutputFormat, quiet: bool) {
    let mut config = match ServerConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    overrides.apply(&mut config);

    if config.api_token.is_none() && config.identity.is_none() {
        tracing::warn!("no api token or identity provider configured; only sign-up accounts can authenticate");
    }

    let rt = runtime(output, quiet);
    if let Err(e) = rt.block_on(elix_server::start_server(config)) {
        report_error(&format!("Server error: {}", e), output, quiet);
        process::exit(1);
    }
}

fn cmd_report(
    snapshot_path: Option<&Path>,
    url: Option<String>,
    token: Option<String>,
    budget: Option<f64>,
    output: OutputFormat,
    quiet: bool,
) {
    let mut settings = KpiSettings::default();
    if let Some(budget) = budget {
        settings.monthly_budget = budget;
    }

    let report = match (snapshot_path, url) {
        (Some(path), _) => {
            let snapshot = read_snapshot(path, output, quiet);
            Report::from_snapshot(&snapshot, &settings, OffsetDateTime::now_utc())
        }
        (None, Some(url)) => {
            let mut client = DashboardClient::new(url);
            client.set_token(token);
            runtime(output, quiet).block_on(Report::from_server(&client))
        }
        (None, None) => {
            report_error("error: a snapshot file or --url is required", output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => print_json(&report, output, quiet),
    }
}

fn read_snapshot(path: &Path, output: OutputFormat, quiet: bool) -> Snapshot {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let msg = format!("error parsing snapshot '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_sample(output: OutputFormat, quiet: bool) {
    print_json(&Snapshot::sample(), output, quiet);
}

fn print_json<T: serde::Serialize>(value: &T, output: OutputFormat, quiet: bool) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Report an error message to stderr, respecting output format and quiet mode.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
