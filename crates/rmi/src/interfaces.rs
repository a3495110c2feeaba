//! Remote interface definitions shared by the server and client binaries.
//!
//! All traits carry the [`remote_interface`] attribute: methods are async,
//! declared without a receiver, and return `Result<T, RemoteError<E>>`.

use std::fmt;

use rmi_core::error::RemoteError;
use rmi_core::remote_interface;
use serde::{Deserialize, Serialize};

/// Liveness-check interface.
#[remote_interface]
pub trait PingServer {
    /// Return a pong tagged with the caller's id number.
    async fn ping(id_number: i32) -> Result<String, RemoteError<PingFault>>;
}

/// Hands out freshly made ping servers.
///
/// Each call spins up a dedicated skeleton on the factory host and returns
/// a stub bound to it, so stubs travel back to the caller as ordinary
/// return values.
#[remote_interface]
pub trait PingServerFactory {
    async fn make_ping_server() -> Result<PingServerStub, RemoteError>;
}

/// Failure a ping server implementation may raise on its own behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PingFault {
    /// The server declined to answer this ping.
    Refused(String),
}

impl fmt::Display for PingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PingFault::Refused(reason) => write!(f, "ping refused: {}", reason),
        }
    }
}

impl std::error::Error for PingFault {}

#[cfg(test)]
mod tests {
    use super::*;
    use rmi_core::interface;

    /// Both derived descriptors satisfy the remote-interface predicate.
    #[test]
    fn test_derived_descriptors_are_valid() {
        interface::validate(&PING_SERVER_DESCRIPTOR);
        interface::validate(&PING_SERVER_FACTORY_DESCRIPTOR);
    }

    #[test]
    fn test_descriptor_records_signatures() {
        assert_eq!(PING_SERVER_DESCRIPTOR.name, "PingServer");
        let ping = &PING_SERVER_DESCRIPTOR.methods[0];
        assert_eq!(ping.name, "ping");
        assert_eq!(ping.param_types, &["i32"][..]);
        assert_eq!(ping.return_type, "String");

        let make = &PING_SERVER_FACTORY_DESCRIPTOR.methods[0];
        assert_eq!(make.name, "make_ping_server");
        assert!(make.param_types.is_empty());
    }
}
