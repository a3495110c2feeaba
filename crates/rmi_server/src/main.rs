mod args;

use std::sync::Mutex;

use clap::Parser;
use rmi::interfaces::{
    PingFault, PingServer, PingServerDispatch, PingServerFactory, PingServerFactoryDispatch,
    PingServerStub,
};
use rmi_core::addr::RemoteAddr;
use rmi_core::error::RemoteError;
use rmi_core::skeleton::Skeleton;
use rmi_core::stub::Stub;
use rmi_core::{async_trait, stub};

use crate::args::ServerArgs;

struct PingPongServer;

#[async_trait]
impl PingServer for PingPongServer {
    async fn ping(&self, id_number: i32) -> Result<String, RemoteError<PingFault>> {
        log::info!("ping {}", id_number);
        Ok(format!("Pong{}", id_number))
    }
}

/// Spins up one dedicated ping skeleton per request.
struct PingServerMaker {
    host: String,
    children: Mutex<Vec<Skeleton>>,
}

impl PingServerMaker {
    fn new(host: String) -> Self {
        Self {
            host,
            children: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PingServerFactory for PingServerMaker {
    async fn make_ping_server(&self) -> Result<PingServerStub, RemoteError> {
        let child = Skeleton::with_addr(
            PingServerDispatch::new(PingPongServer),
            RemoteAddr::new(self.host.clone(), 0),
        );
        child.start().map_err(RemoteError::Rmi)?;

        let stub = stub::create::<PingServerStub>(&child).map_err(RemoteError::Rmi)?;
        log::info!("made ping server at {}", stub.handle().addr());
        self.children.lock().unwrap().push(child);
        Ok(stub)
    }
}

#[tokio::main]
async fn main() {
    match std::env::var("RUST_LOG") {
        Ok(_) => (),
        Err(_) => std::env::set_var("RUST_LOG", "INFO"),
    }

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&std::env::var("RUST_LOG").expect("RUST_LOG environment variable not set"))
        .init();

    let args = ServerArgs::parse();
    let addr = RemoteAddr::new(args.address.to_string(), args.port);

    let factory = PingServerMaker::new(addr.host().to_owned());
    let skeleton = Skeleton::with_addr(PingServerFactoryDispatch::new(factory), addr);
    skeleton.start().expect("failed to start the factory skeleton");
    log::info!("ping server factory listening on {}", skeleton.address());

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown");
    skeleton.stop();
    log::info!("factory stopped");
}
