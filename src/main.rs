use clap::{Parser, Subcommand};
use impact_examer::{changes, Analyzer, Config};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "impact-examer")]
#[command(about = "Estimate which modules a change set can affect through the dependency graph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the impact report for a change set
    Analyze {
        /// Repository root
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dependency graph JSON (relative to the root)
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Report output path (relative to the root)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base commit of the change
        #[arg(long, env = "BASE_SHA")]
        base: Option<String>,

        /// Head commit of the change
        #[arg(long, env = "HEAD_SHA")]
        head: Option<String>,

        /// Changed files; skips git when given
        #[arg(long, num_args = 1..)]
        changed: Vec<String>,

        /// Maximum dependency distance to follow
        #[arg(long)]
        max_depth: Option<usize>,

        /// Number of impacted files whose exports are listed
        #[arg(long)]
        export_limit: Option<usize>,
    },
    /// Build the dependency graph from the source tree
    Graph {
        /// Repository root
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Graph output path (relative to the root)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the config file (defaults to ~/.impact-examer.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            root,
            config,
            graph,
            output,
            base,
            head,
            changed,
            max_depth,
            export_limit,
        } => {
            let mut config = load_config(config, root);
            if let Some(graph) = graph {
                config.graph_path = graph;
            }
            if let Some(output) = output {
                config.report_path = output;
            }
            if let Some(max_depth) = max_depth {
                config.impact.max_depth = max_depth;
            }
            if let Some(export_limit) = export_limit {
                config.impact.export_limit = export_limit;
            }
            analyze(config, base, head, changed)?;
        }
        Commands::Graph { root, config, output } => {
            let mut config = load_config(config, root);
            if let Some(output) = output {
                config.graph_path = output;
            }
            build_graph(config);
        }
        Commands::Config { output } => {
            generate_config(output)?;
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, root: Option<PathBuf>) -> Config {
    let mut config = Config::load_or_default(config_path.as_deref());
    if let Some(root) = root {
        config.project_root = root;
    }
    config
}

fn analyze(
    config: Config,
    base: Option<String>,
    head: Option<String>,
    changed: Vec<String>,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let changed = if !changed.is_empty() {
        changed
    } else {
        match (base, head) {
            (Some(base), Some(head)) => {
                match changes::changed_files(&config.project_root, &base, &head, &config.source_extensions) {
                    Ok(files) => files,
                    Err(e) => {
                        warn!("Could not list changed files: {:#}", e);
                        Vec::new()
                    }
                }
            }
            _ => {
                warn!("No changed files given and no base/head commits set");
                Vec::new()
            }
        }
    };

    let analyzer = Analyzer::new(config);
    let (report, report_file) = analyzer.run(changed)?;

    report.print_summary();
    println!(
        "\n✅ Impact analysis completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    println!("📁 Report written to {}", report_file.display());

    Ok(())
}

/// A failed graph build leaves the review without impact data but must not
/// fail the pipeline, so errors are only logged.
fn build_graph(config: Config) {
    match Analyzer::new(config).build_graph() {
        Ok((document, graph_file)) => {
            println!(
                "🕸️  Dependency graph with {} modules written to {}",
                document.modules.len(),
                graph_file.display()
            );
        }
        Err(e) => error!("Failed to build dependency graph (continuing): {:#}", e),
    }
}

fn generate_config(output_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = output_path.unwrap_or_else(|| {
        Config::default_config_path().unwrap_or_else(|_| PathBuf::from("impact-examer.toml"))
    });

    println!("📝 Generating configuration file: {}", config_path.display());
    std::fs::write(&config_path, Config::create_documented_config())?;
    println!("✅ Configuration file created successfully!");

    Ok(())
}
