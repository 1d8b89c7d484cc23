//! rap-cli - Command-line register access over RAP
//!
//! Runs one register operation against a `rapd` (or any RAP server) over UDP.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use rap_client::Client;
use rap_protocol::{Address, Data, Profile};
use rap_server::Config;
use rap_transport::{UdpConfig, UdpTransport};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rap-cli")]
#[command(about = "Read and write registers over the RAP register access protocol")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, env = "RAP_SERVER", default_value = "127.0.0.1:5150")]
    server: SocketAddr,

    /// Local address to bind
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,

    /// rapd config file to take the wire profile from (defaults to the
    /// reference profile)
    #[arg(short, long, env = "RAP_CONFIG")]
    config: Option<PathBuf>,

    /// Response timeout in milliseconds
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    /// Link MTU
    #[arg(long, default_value = "1500")]
    mtu: usize,

    /// Send writes with the posted message types
    #[arg(long)]
    posted: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one register
    Read {
        #[arg(value_parser = commands::parse_u64)]
        address: Address,
    },

    /// Write one register
    Write {
        #[arg(value_parser = commands::parse_u64)]
        address: Address,
        #[arg(value_parser = commands::parse_u64)]
        data: Data,
    },

    /// Masked read-modify-write of one register
    Rmw {
        #[arg(value_parser = commands::parse_u64)]
        address: Address,
        #[arg(value_parser = commands::parse_u64)]
        data: Data,
        /// Bits to replace
        #[arg(value_parser = commands::parse_u64)]
        mask: Data,
    },

    /// Read registers at a fixed stride
    SeqRead {
        #[arg(value_parser = commands::parse_u64)]
        address: Address,
        count: usize,
        /// Address step between elements (defaults to the data width)
        #[arg(short, long, value_parser = commands::parse_u64)]
        increment: Option<u64>,
    },

    /// Write registers at a fixed stride
    SeqWrite {
        #[arg(value_parser = commands::parse_u64)]
        address: Address,
        #[arg(required = true, value_parser = commands::parse_u64)]
        data: Vec<Data>,
        /// Address step between elements (defaults to the data width)
        #[arg(short, long, value_parser = commands::parse_u64)]
        increment: Option<u64>,
    },

    /// Read one register repeatedly
    FifoRead {
        #[arg(value_parser = commands::parse_u64)]
        address: Address,
        count: usize,
    },

    /// Write one register repeatedly
    FifoWrite {
        #[arg(value_parser = commands::parse_u64)]
        address: Address,
        #[arg(required = true, value_parser = commands::parse_u64)]
        data: Vec<Data>,
    },

    /// Read a list of registers
    CompRead {
        #[arg(required = true, value_parser = commands::parse_u64)]
        addresses: Vec<Address>,
    },

    /// Write a list of ADDRESS=DATA pairs
    CompWrite {
        #[arg(required = true, value_parser = commands::parse_pair)]
        pairs: Vec<(Address, Data)>,
    },

    /// Print the element-count limits for the profile and transport
    Limits,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let profile = match &cli.config {
        Some(path) => Config::from_file(path)?.profile,
        None => Profile::example(),
    };
    if let Err(e) = profile.validate() {
        eprintln!("{}: {}", "Invalid profile".red(), e);
        std::process::exit(1);
    }
    debug!(config = ?cli.config, profile = ?profile, "profile loaded");

    let udp_config = UdpConfig::new(cli.bind)
        .with_remote(cli.server)
        .with_mtu(cli.mtu)
        .with_timeout(Some(Duration::from_millis(cli.timeout_ms)));
    let transport = UdpTransport::bind(&udp_config).map_err(|e| {
        eprintln!("{}: {}", "Bind failed".red(), e);
        e
    })?;
    debug!(
        local = %cli.bind,
        server = %cli.server,
        max_message_size = udp_config.max_message_size(),
        "UDP transport bound"
    );
    let client = Client::new(Box::new(transport), profile)?.with_posted_writes(cli.posted);

    match commands::execute(&client, cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
