//! CLI args

use std::net::Ipv4Addr;

use clap::Parser;

/// Ping-pong factory server arguments
#[derive(Parser)]
pub(crate) struct ServerArgs {
    /// The IPv4 address for the factory to bind to.
    #[clap(short, long)]
    #[clap(default_value_t = Ipv4Addr::LOCALHOST)]
    pub address: Ipv4Addr,

    /// The port number for the factory to listen on.
    #[clap(short, long)]
    #[clap(default_value_t = rmi::defaults::DEFAULT_PORT)]
    pub port: u16,
}
