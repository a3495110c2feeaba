//! This crate contains the core runtime shared by remote method invocation
//! clients and servers.
//!
//! A server hosts a long-lived object behind a [`Skeleton`](skeleton::Skeleton),
//! a multi-connection TCP server that decodes invocation requests and routes
//! them to the object through a generated dispatch table. A client holds a
//! *stub*, a surrogate value implementing the same interface that forwards
//! every call over one fresh connection and blocks until the response arrives.
//!
//! Remote interfaces are plain traits annotated with
//! [`remote_interface`]. Every method must be async and must return
//! `Result<T, RemoteError<E>>`, which is how a method declares that it can
//! fail with the runtime's own error kind in addition to its user error `E`.

pub mod addr;
pub mod codec;
pub mod error;
pub mod interface;
pub mod proto;
pub mod skeleton;
pub mod stub;

pub use rmi_macros::remote_interface;

// re-exported for generated code, so that downstream crates only need
// `rmi_core` in scope
pub use async_trait::async_trait;
pub use serde;
