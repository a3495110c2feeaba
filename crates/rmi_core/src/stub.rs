//! Client-side runtime: stub identity, the invocation exchange and the
//! stub factories.
//!
//! A stub is a surrogate value implementing a remote interface. The
//! [`remote_interface`](crate::remote_interface) macro derives one stub
//! type per trait; each generated method encodes its arguments and hands
//! them to [`StubHandle::call`], which performs one request/response
//! exchange over a fresh connection.
//!
//! Two stubs are equal when they present the same interface and carry the
//! same address, so they would reach the same skeleton. Equality, hashing
//! and rendering never touch the network.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::addr::RemoteAddr;
use crate::codec;
use crate::error::{RemoteError, RmiError};
use crate::interface::{self, InterfaceDescriptor, MethodDescriptor};
use crate::proto::{Request, Response};
use crate::skeleton::Skeleton;

/// Implemented by every generated stub type.
pub trait Stub: Sized {
    /// Descriptor of the remote interface this stub presents.
    fn descriptor() -> &'static InterfaceDescriptor;

    fn from_handle(handle: StubHandle) -> Self;

    fn handle(&self) -> &StubHandle;
}

/// The identity pair of a stub and its invoker.
#[derive(Debug, Clone)]
pub struct StubHandle {
    descriptor: &'static InterfaceDescriptor,
    addr: RemoteAddr,
}

impl StubHandle {
    pub fn new(descriptor: &'static InterfaceDescriptor, addr: RemoteAddr) -> Self {
        Self { descriptor, addr }
    }

    pub fn descriptor(&self) -> &'static InterfaceDescriptor {
        self.descriptor
    }

    pub fn addr(&self) -> &RemoteAddr {
        &self.addr
    }

    /// The serializable form: interface name plus address.
    pub fn to_record(&self) -> StubRecord {
        StubRecord {
            interface: self.descriptor.name.to_owned(),
            addr: self.addr.clone(),
        }
    }

    /// Rebind a received record to a known descriptor.
    pub fn from_record(
        descriptor: &'static InterfaceDescriptor,
        record: StubRecord,
    ) -> Result<Self, RmiError> {
        if record.interface != descriptor.name {
            return Err(RmiError::new(format!(
                "stub record for {} cannot bind to {}",
                record.interface, descriptor.name
            )));
        }
        Ok(Self::new(descriptor, record.addr))
    }

    /// Perform one invocation: encode, exchange, decode, re-raise.
    pub async fn call<R, E>(
        &self,
        method: &MethodDescriptor,
        args: Vec<Vec<u8>>,
    ) -> Result<R, RemoteError<E>>
    where
        R: DeserializeOwned,
        E: DeserializeOwned,
    {
        let response = self.exchange(method, args).await.map_err(RemoteError::Rmi)?;
        match response {
            Response::Normal(payload) => codec::decode(&payload).map_err(RemoteError::Rmi),
            Response::Exception(payload) => {
                let raised: RemoteError<E> = codec::decode(&payload).map_err(RemoteError::Rmi)?;
                Err(raised)
            }
            Response::Error(error) => Err(RemoteError::Rmi(error)),
        }
    }

    /// One fresh connection, one request out, one response in.
    async fn exchange(
        &self,
        method: &MethodDescriptor,
        args: Vec<Vec<u8>>,
    ) -> Result<Response, RmiError> {
        let request = Request::new(
            method.name,
            method.param_types.iter().map(|t| (*t).to_owned()).collect(),
            args,
        );
        let frame = codec::encode(&request)?;

        log::debug!("{}: invoking {}", self, method.name);
        let mut stream = TcpStream::connect((self.addr.host(), self.addr.port()))
            .await
            .map_err(|e| RmiError::with_cause(format!("connection to {} failed", self.addr), &e))?;
        stream.write_all(&frame).await?;
        // half-close tells the skeleton the request is complete
        stream.shutdown().await?;

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await?;
        codec::decode::<Response>(&buf).map_err(|_| RmiError::new("invalid response object"))
    }
}

impl PartialEq for StubHandle {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name && self.addr == other.addr
    }
}

impl Eq for StubHandle {}

impl Hash for StubHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.name.hash(state);
        self.addr.hash(state);
    }
}

impl fmt::Display for StubHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.descriptor.name, self.addr)
    }
}

/// Wire form of a stub: its two identity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubRecord {
    pub interface: String,
    pub addr: RemoteAddr,
}

/// Create a stub from a skeleton, copying its effective address.
///
/// A wildcard host is replaced by the local host name so the stub stays
/// meaningful on other machines; failure to obtain one is a transport
/// error. Panics if the skeleton has no address yet (neither configured
/// nor started) or serves a different interface than `S` presents.
pub fn create<S: Stub>(skeleton: &Skeleton) -> Result<S, RmiError> {
    let descriptor = S::descriptor();
    interface::validate(descriptor);
    check_interface_match(descriptor, skeleton);

    let mut addr = skeleton.address();
    if addr.is_wildcard() {
        addr = RemoteAddr::new(local_hostname()?, addr.port());
    }
    Ok(S::from_handle(StubHandle::new(descriptor, addr)))
}

/// Create a stub from a skeleton's port and an explicitly chosen hostname.
///
/// For deployments where the skeleton's own host name is not routable from
/// clients. Panics on an empty hostname, a skeleton without a port, or an
/// interface mismatch.
pub fn create_with_hostname<S: Stub>(skeleton: &Skeleton, hostname: &str) -> S {
    let descriptor = S::descriptor();
    interface::validate(descriptor);
    check_interface_match(descriptor, skeleton);
    assert!(!hostname.is_empty(), "hostname must not be empty");

    let port = skeleton.address().port();
    S::from_handle(StubHandle::new(descriptor, RemoteAddr::new(hostname, port)))
}

/// Create a stub directly from an address, for bootstrapping a first
/// connection to a server that is already running elsewhere.
pub fn create_with_addr<S: Stub>(addr: RemoteAddr) -> S {
    let descriptor = S::descriptor();
    interface::validate(descriptor);
    S::from_handle(StubHandle::new(descriptor, addr))
}

fn check_interface_match(descriptor: &InterfaceDescriptor, skeleton: &Skeleton) {
    let served = skeleton.interface();
    if served.name != descriptor.name {
        panic!(
            "skeleton serves {} but the stub presents {}",
            served.name, descriptor.name
        );
    }
}

fn local_hostname() -> Result<String, RmiError> {
    gethostname::gethostname()
        .into_string()
        .map_err(|_| RmiError::new("local host name is not valid UTF-8"))
}
