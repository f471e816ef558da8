//! Tabkit CLI - run CSV transformation pipelines
//!
//! # Commands
//!
//! ```bash
//! tabkit serve                                   # Start HTTP server (port 5001)
//! tabkit transform input.csv --pipeline p.json   # Run a pipeline over a local CSV
//! tabkit transformations                         # Show built-in transformations
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabkit::{
    transform_csv_file, transformations_description, PipelineExecutor, ServerConfig,
    TransformResponse, TransformationRegistry,
};

#[derive(Parser)]
#[command(name = "tabkit")]
#[command(version, about = "Apply transformation pipelines to CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Address to bind (overrides TABKIT_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides TABKIT_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a pipeline over a local CSV file
    Transform {
        /// Input CSV file
        input: PathBuf,

        /// Pipeline JSON file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show built-in transformations
    Transformations,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await,

        Commands::Transform {
            input,
            pipeline,
            output,
        } => cmd_transform(&input, &pipeline, output.as_deref()),

        Commands::Transformations => cmd_transformations(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }

    tabkit::server::start_server(config).await
}

fn cmd_transform(
    input: &Path,
    pipeline: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let executor = PipelineExecutor::new(Arc::new(TransformationRegistry::new()));
    let result = transform_csv_file(&executor, input, pipeline)?;

    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.original.columns().join(", "));
    eprintln!(
        "⚙️  {} step(s): {:?} -> {:?}",
        result.steps,
        result.original.shape(),
        result.transformed.shape()
    );

    let response = TransformResponse::new(&result.original, &result.transformed);
    let json = serde_json::to_string_pretty(&response)?;
    write_output(&json, output)?;

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn cmd_transformations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", transformations_description());
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
