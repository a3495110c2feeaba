//! Network addresses as (host, port) pairs.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RmiError;

/// The any-interface host a skeleton binds to when no address is configured.
pub const WILDCARD_HOST: &str = "0.0.0.0";

/// A (host, port) pair identifying a skeleton endpoint.
///
/// The host is kept as a string and may be an unresolved hostname; stubs
/// carry these across process boundaries and resolve them when connecting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteAddr {
    host: String,
    port: u16,
}

impl RemoteAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Address on the any-interface host.
    pub fn wildcard(port: u16) -> Self {
        Self::new(WILDCARD_HOST, port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_wildcard(&self) -> bool {
        self.host == WILDCARD_HOST
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for RemoteAddr {
    type Err = RmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| RmiError::new(format!("invalid address: {}", s)))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| RmiError::with_cause(format!("invalid port in address: {}", s), &e))?;
        if host.is_empty() {
            return Err(RmiError::new(format!("invalid address: {}", s)));
        }
        Ok(Self::new(host, port))
    }
}

impl From<SocketAddr> for RemoteAddr {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}
