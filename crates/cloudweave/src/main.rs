mod commands;
mod registry;
mod session;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weave")]
#[command(version, about = "Inspect and drive cloud resources through cloudweave connections", long_about = None)]
struct Cli {
    /// Connection profile from the config file
    #[arg(short, long, global = true, env = "WEAVE_CONNECTION")]
    connection: Option<String>,

    /// Config file path (skips the lookup order)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the capability flags of a driver
    Capability {
        /// Driver name, e.g. CLOUDIT
        driver: String,
    },
    /// Manage key pairs
    Keypair {
        #[command(subcommand)]
        action: KeypairAction,
    },
    /// VPC operations
    Vpc {
        #[command(subcommand)]
        action: VpcAction,
    },
    /// Subnet operations
    Subnet {
        #[command(subcommand)]
        action: SubnetAction,
    },
    /// VM operations
    Vm {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Network load balancer operations
    Nlb {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Inspect the metadata store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum KeypairAction {
    /// List key pairs
    List,
    /// Show one key pair
    Get { name: String },
    /// Create a key pair and print its private key
    Create { name: String },
    /// Delete a key pair
    Delete { name: String },
}

#[derive(Subcommand)]
enum VpcAction {
    /// List VPCs
    List,
}

#[derive(Subcommand)]
enum SubnetAction {
    /// List CIDR blocks a new subnet could use
    Creatable {
        /// VPC name; single-VPC drivers default to their only VPC
        #[arg(long)]
        vpc: Option<String>,
    },
}

#[derive(Subcommand)]
enum ListAction {
    /// List resources
    List,
}

#[derive(Subcommand)]
enum StoreAction {
    /// List records of one namespace (KEYPAIR, VPC, SECURITYGROUP)
    List { namespace: String },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // capability only needs the driver registry
    if let Commands::Capability { driver } = &cli.command {
        return commands::capability::handle(driver);
    }

    let target = session::Target::new(cli.config.as_deref(), cli.connection.as_deref())?;

    match cli.command {
        Commands::Capability { .. } => Ok(()),
        Commands::Keypair { action } => {
            let connection = target.connect().await?;
            match action {
                KeypairAction::List => commands::keypair::list(&connection).await,
                KeypairAction::Get { name } => commands::keypair::get(&connection, &name).await,
                KeypairAction::Create { name } => {
                    commands::keypair::create(&connection, &name).await
                }
                KeypairAction::Delete { name } => {
                    commands::keypair::delete(&connection, &name).await
                }
            }
        }
        Commands::Vpc {
            action: VpcAction::List,
        } => commands::network::list_vpcs(&target.connect().await?).await,
        Commands::Subnet {
            action: SubnetAction::Creatable { vpc },
        } => commands::network::creatable_subnets(&target.connect().await?, vpc.as_deref()).await,
        Commands::Vm {
            action: ListAction::List,
        } => commands::compute::list_vms(&target.connect().await?).await,
        Commands::Nlb {
            action: ListAction::List,
        } => commands::compute::list_nlbs(&target.connect().await?).await,
        Commands::Store {
            action: StoreAction::List { namespace },
        } => commands::store::list(&target, &namespace).await,
    }
}
