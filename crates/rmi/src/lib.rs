//! Remote method invocation for the ping-pong service: the shared
//! interfaces live here, the runtime in [`rmi_core`].

pub mod interfaces;

pub use rmi_core::{addr, codec, error, interface, proto, skeleton, stub};
pub use rmi_core::{async_trait, remote_interface};

/// Default constants used between a client and the remote.
pub mod defaults {
    /// The well-known port of the ping server factory.
    pub const DEFAULT_PORT: u16 = 30000;
}
