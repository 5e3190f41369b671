//! Inspect and exercise the Mijia device tools from the command line.
//!
//! Devices come from a fixture file served by the in-memory adapter;
//! credentials come from `--config`, `config/mijia.yaml`, or the `MIJIA_*`
//! environment variables.
//!
//! # Examples
//!
//! ```sh
//! # Print the function-calling schema handed to the LLM
//! mijia-tools schema
//!
//! # List tools with their categories
//! mijia-tools list --category mijia
//!
//! # Connect, discover, then read a property
//! mijia-tools --devices fixtures/devices.yaml call get_property_value \
//!   --connect --args '{"device_id": "lamp-001", "siid": 2, "piid": 2}'
//! ```

use clap::{Parser, Subcommand};
use mijia_tools::config::MijiaConfig;
use mijia_tools::device::DeviceAdapter;
use mijia_tools::device::memory::{DeviceFixture, MemoryAdapter};
use mijia_tools::device::tools::DeviceToolsExt;
use mijia_tools::tools::{ToolRegistry, names};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Smart-home device control exposed as function-calling tools.
#[derive(Parser)]
#[command(name = "mijia-tools", version)]
struct Cli {
    /// Path to a YAML config file with a `mijia:` section
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Device fixture (YAML or JSON) for the in-memory adapter
    #[arg(long, global = true)]
    devices: Option<PathBuf>,

    /// Log at DEBUG level (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the schema of every registered tool
    Schema {
        /// Output format
        #[arg(long, default_value = "openai")]
        format: String,
    },

    /// List registered tools
    List {
        /// Only list tools in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Execute one tool and print the result envelope
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,

        /// Connect and discover devices before the call
        #[arg(long)]
        connect: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_adapter(cli: &Cli) -> Result<Arc<MemoryAdapter>, String> {
    let config = MijiaConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("{e}");
        MijiaConfig::default()
    });

    let fixture = match &cli.devices {
        Some(path) => DeviceFixture::from_file(path).map_err(|e| e.to_string())?,
        None => DeviceFixture::default(),
    };

    Ok(Arc::new(MemoryAdapter::new(config).with_fixture(fixture)))
}

/// Connect and fill the device cache.
async fn prepare(adapter: &dyn DeviceAdapter) -> Result<(), String> {
    if !adapter.connect().await.map_err(|e| e.to_string())? {
        return Err("failed to connect to Mijia cloud service".to_string());
    }
    adapter
        .discover_devices()
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}

async fn run(cli: Cli) -> Result<bool, String> {
    let adapter = build_adapter(&cli)?;
    let registry = ToolRegistry::new().with_device_tools(adapter.clone());

    match cli.command {
        Command::Schema { format } => {
            println!("{}", registry.export_schema(&format).map_err(|e| e.to_string())?);
            Ok(true)
        }
        Command::List { category } => {
            let tools = match &category {
                Some(category) => registry.tools_by_category(category),
                None => registry.tools(),
            };
            for tool in tools {
                println!("{:<24} [{}] {}", tool.name, tool.category, tool.description);
            }
            Ok(true)
        }
        Command::Call {
            tool,
            args,
            connect,
        } => {
            if connect && tool != names::CONNECT {
                prepare(adapter.as_ref()).await?;
            }
            let result = registry.execute_json(&tool, &args).await;
            let rendered =
                serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
            println!("{rendered}");
            Ok(result.success)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
