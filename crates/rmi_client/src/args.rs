//! CLI args

use clap::Parser;

/// Ping-pong client arguments
#[derive(Parser)]
pub(crate) struct ClientArgs {
    /// The host the ping server factory runs on.
    #[clap(short, long)]
    #[clap(default_value = "127.0.0.1")]
    pub address: String,

    /// The port number of the ping server factory.
    #[clap(short, long)]
    #[clap(default_value_t = rmi::defaults::DEFAULT_PORT)]
    pub port: u16,

    /// Number of pings to send.
    #[clap(short, long)]
    #[clap(default_value_t = 4)]
    pub count: i32,
}
