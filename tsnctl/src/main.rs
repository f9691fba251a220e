//! Command-line client for `tsnd`. Talks to the daemon over the unix
//! socket bus; prints compiled descriptors as YAML.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tsn_bus::{bus_request_at, BusRequest, BusResponse};

#[derive(Parser)]
#[command(name = "tsnctl", about = "Control a running tsnd daemon")]
struct Args {
    /// Unix socket path the daemon is bound to
    #[arg(short, long, default_value = tsn_bus::BUS_SOCKET_PATH)]
    bind: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the daemon is alive
    Ping,

    /// Create a TSN VLAN interface and install its shaping discipline
    Create {
        /// Interface to create
        interface: String,
        /// VLAN id to create
        vlan_id: u16,
    },

    /// Delete a TSN VLAN interface and its shaping discipline
    Delete {
        /// Interface to delete
        interface: String,
        /// VLAN id to delete
        vlan_id: u16,
    },

    /// Show compiled shaping parameters
    Info {
        /// Interface to get info about; all interfaces when omitted
        interface: Option<String>,
    },

    /// Re-read the configuration file and recompile
    Reload,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let request = match args.command {
        Command::Ping => BusRequest::Ping,
        Command::Create { interface, vlan_id } => BusRequest::CreateInterface {
            ifname: interface,
            vlan_id,
        },
        Command::Delete { interface, vlan_id } => BusRequest::DeleteInterface {
            ifname: interface,
            vlan_id,
        },
        Command::Info { interface } => BusRequest::GetInterfaceInfo { ifname: interface },
        Command::Reload => BusRequest::ReloadConfig,
    };

    let responses = bus_request_at(&args.bind, vec![request]).await?;
    let mut failed = false;
    for response in responses {
        match response {
            BusResponse::Ack => println!("ok"),
            BusResponse::Fail(message) => {
                eprintln!("error: {message}");
                failed = true;
            }
            BusResponse::InterfaceInfo(descriptors) => {
                print!("{}", serde_yaml::to_string(&descriptors)?);
            }
            BusResponse::ConfigText(text) => print!("{text}"),
        }
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
