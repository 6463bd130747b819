use std::path::{Path, PathBuf};

/// Reset SIGPIPE to default behavior so piping (e.g. `tfprovider codegen ... | head`)
/// exits cleanly instead of panicking on broken pipe.
#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use tfprovider::codegen::render_provider;
use tfprovider::schema::Kind;
use tfprovider::{LaunchOptions, Provider};

/// tfprovider - inspect and drive provider plugin binaries
#[derive(Parser)]
#[command(name = "tfprovider", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pass the provider's stderr through unfiltered
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the translated schemas of a provider as JSON
    Schema {
        /// Path to the provider binary
        binary: PathBuf,

        /// Which view to print: args (configuration) or attrs (state)
        #[arg(short, long, default_value = "args")]
        view: String,
    },

    /// Generate Rust type declarations for a provider's schemas
    Codegen {
        /// Path to the provider binary
        binary: PathBuf,
    },

    /// List resource and data source types a provider declares
    Types {
        /// Path to the provider binary
        binary: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = LaunchOptions { debug: cli.debug };
    match cli.command {
        Commands::Schema { ref binary, ref view } => {
            let kind = parse_kind(view)?;
            with_provider(binary, options, |provider| {
                let schemas = provider.schemas();
                let mut resources = serde_json::Map::new();
                for name in schemas.resource_types() {
                    resources.insert(
                        name.clone(),
                        serde_json::to_value(schemas.resource(&name, kind))?,
                    );
                }
                let mut data_sources = serde_json::Map::new();
                for name in schemas.data_source_types() {
                    data_sources.insert(
                        name.clone(),
                        serde_json::to_value(schemas.data_source(&name, kind))?,
                    );
                }
                let doc = serde_json::json!({
                    "provider": schemas.provider(kind),
                    "resources": resources,
                    "data_sources": data_sources,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
                Ok(())
            })
            .await
        }
        Commands::Codegen { ref binary } => {
            with_provider(binary, options, |provider| {
                print!("{}", render_provider(provider.schemas()));
                Ok(())
            })
            .await
        }
        Commands::Types { ref binary } => {
            with_provider(binary, options, |provider| {
                println!("{}", "Resources:".bold());
                for name in provider.resource_types() {
                    println!("  {}", name);
                }
                println!("{}", "Data sources:".bold());
                for name in provider.data_source_types() {
                    println!("  {}", name);
                }
                Ok(())
            })
            .await
        }
    }
}

fn parse_kind(view: &str) -> Result<Kind> {
    match view {
        "args" => Ok(Kind::Args),
        "attrs" | "state" => Ok(Kind::Attrs),
        other => anyhow::bail!("Unknown view '{}': expected 'args' or 'attrs'", other),
    }
}

/// Launch a provider, run `f` against it, and always shut it down afterwards.
async fn with_provider<F>(binary: &Path, options: LaunchOptions, f: F) -> Result<()>
where
    F: FnOnce(&Provider) -> Result<()>,
{
    let mut provider = Provider::launch(binary, options)
        .await
        .with_context(|| format!("Failed to start provider {}", binary.display()))?;
    let result = f(&provider);
    provider.shutdown(None).await;
    result
}
