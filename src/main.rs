use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod artifacts;
mod format;
mod model;
mod params;
mod render;
mod route;
mod store;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "bench-dashboard")]
#[command(about = "Render benchmark results into static HTML pages", long_about = None)]
struct Cli {
    /// Site root holding schema.yaml and benchmark_output/.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Suite shown when the query does not name one.
    #[arg(long, global = true, default_value = "v1.0")]
    suite: String,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page a query string selects, e.g. `?runs=1&query=mmlu`.
    Render {
        #[arg(long, default_value = "")]
        query: String,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Copy the LaTeX of one summary table.
    Latex {
        #[arg(long)]
        name: String,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = store::SiteConfig {
        root: cli.root,
        default_suite: cli.suite,
    };

    match cli.cmd {
        Commands::Render { query, out } => {
            let params = params::UrlParams::decode(&query);
            let html = render::render_page(&config, &params)?;
            write_output(out.as_deref(), &html)?;
        }
        Commands::Latex { name, out } => {
            let text = render::latex_source(&config, &config.default_suite, &name)?;
            write_output(out.as_deref(), &text)?;
        }
    }

    Ok(())
}

fn write_output(out: Option<&std::path::Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn init_tracing(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("bench_dashboard={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
