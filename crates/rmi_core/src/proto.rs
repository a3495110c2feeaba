//! On-the-wire record shapes.
//!
//! One invocation is one connection carrying exactly one [`Request`] from
//! the stub followed by exactly one [`Response`] from the skeleton. Each
//! side half-closes its write direction after sending, so the records need
//! no framing beyond what the encoding itself provides.

use serde::{Deserialize, Serialize};

use crate::error::RmiError;

/// Wire protocol version stamped into every request.
pub const WIRE_VERSION: u8 = 1;

/// A method invocation as transmitted by a stub.
///
/// Arguments are encoded individually so the receiving dispatch table can
/// decode each one with its concrete parameter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub version: u8,
    pub method: String,
    pub arg_types: Vec<String>,
    pub args: Vec<Vec<u8>>,
}

impl Request {
    /// Build a request for the current wire version.
    ///
    /// Panics if the type list and the argument list disagree in length;
    /// callers assemble both from the same method descriptor.
    pub fn new(method: impl Into<String>, arg_types: Vec<String>, args: Vec<Vec<u8>>) -> Self {
        assert_eq!(
            arg_types.len(),
            args.len(),
            "argument types and values must pair up"
        );
        Self {
            version: WIRE_VERSION,
            method: method.into(),
            arg_types,
            args,
        }
    }

    /// Validate a request received from the wire.
    pub fn check(&self) -> Result<(), RmiError> {
        if self.version != WIRE_VERSION {
            return Err(RmiError::new(format!(
                "unsupported protocol version: {}",
                self.version
            )));
        }
        if self.arg_types.len() != self.args.len() {
            return Err(RmiError::new(
                "invalid request object: argument arity mismatch",
            ));
        }
        Ok(())
    }
}

/// Outcome of one invocation as transmitted by a skeleton.
///
/// - `Normal` carries the encoded return value (unit for void methods).
/// - `Exception` carries the encoded error value the server object's method
///   raised; the stub re-raises it unchanged.
/// - `Error` carries a transport or dispatch failure produced by the
///   runtime itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Response {
    Normal(Vec<u8>),
    Exception(Vec<u8>),
    Error(RmiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    #[test]
    fn test_request_round_trip() {
        let request = Request::new(
            "ping",
            vec!["i32".to_owned()],
            vec![codec::encode(&3_i32).unwrap()],
        );

        let bytes = codec::encode(&request).unwrap();
        let decoded: Request = codec::decode(&bytes).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.version, WIRE_VERSION);
    }

    #[test]
    fn test_status_tags_are_discriminable_strings() {
        let normal = codec::encode(&Response::Normal(vec![])).unwrap();
        let exception = codec::encode(&Response::Exception(vec![])).unwrap();
        let error = codec::encode(&Response::Error(RmiError::new("x"))).unwrap();

        let contains = |haystack: &[u8], needle: &[u8]| {
            haystack.windows(needle.len()).any(|w| w == needle)
        };
        assert!(contains(&normal, b"NORMAL"));
        assert!(contains(&exception, b"EXCEPTION"));
        assert!(contains(&error, b"ERROR"));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut request = Request::new("ping", vec![], vec![]);
        request.version = WIRE_VERSION + 1;
        assert!(request.check().is_err());
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let mut request = Request::new("ping", vec![], vec![]);
        request.args.push(vec![1, 2, 3]);
        assert!(request.check().is_err());
    }

    #[test]
    #[should_panic]
    fn test_new_enforces_pairing() {
        let _ = Request::new("ping", vec!["i32".to_owned()], vec![]);
    }
}
