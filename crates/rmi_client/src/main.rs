mod args;

use clap::Parser;
use rmi::interfaces::{PingServer, PingServerFactory, PingServerFactoryStub};
use rmi_core::addr::RemoteAddr;
use rmi_core::stub;

use crate::args::ClientArgs;

#[tokio::main]
async fn main() {
    match std::env::var("RUST_LOG") {
        Ok(_) => (),
        Err(_) => std::env::set_var("RUST_LOG", "INFO"),
    }

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&std::env::var("RUST_LOG").expect("RUST_LOG environment variable not set"))
        .init();

    let args = ClientArgs::parse();

    let factory: PingServerFactoryStub =
        stub::create_with_addr(RemoteAddr::new(args.address, args.port));
    let ping_server = match factory.make_ping_server().await {
        Ok(stub) => stub,
        Err(e) => {
            log::error!("could not obtain a ping server: {:?}", e);
            std::process::exit(1);
        }
    };
    log::info!("pinging {}", ping_server);

    let mut fails = 0;
    for i in 0..args.count {
        match ping_server.ping(i).await {
            Ok(reply) => log::info!("{}", reply),
            Err(e) => {
                fails += 1;
                log::error!("ping {} failed: {}", i, e);
            }
        }
    }

    println!("{} Tests Completed, {} Tests Failed", args.count, fails);
}
