//! Value encoding for wire records and invocation payloads.
//!
//! The runtime only requires a self-describing encoding that round-trips
//! the record shapes in [`crate::proto`] and arbitrary serde-compatible
//! argument and result values. The default is MessagePack with named
//! fields, which keeps the response status tags readable on the wire.

use serde::{Deserialize, Serialize};

use crate::error::RmiError;

/// A pluggable value encoding.
pub trait Codec: Send + Sync {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, RmiError>;
    fn decode<'a, T: Deserialize<'a>>(&self, buf: &'a [u8]) -> Result<T, RmiError>;
}

/// MessagePack codec, the default for the whole runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgpCodec;

impl Codec for MsgpCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, RmiError> {
        rmp_serde::to_vec_named(value).map_err(|e| {
            log::error!("encode error: {}", e);
            RmiError::with_cause("value encoding failed", &e)
        })
    }

    fn decode<'a, T: Deserialize<'a>>(&self, buf: &'a [u8]) -> Result<T, RmiError> {
        rmp_serde::from_slice(buf).map_err(|e| {
            log::debug!("decode error: {}", e);
            RmiError::with_cause("value decoding failed", &e)
        })
    }
}

/// Encode with the default codec.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RmiError> {
    MsgpCodec.encode(value)
}

/// Decode with the default codec.
pub fn decode<'a, T: Deserialize<'a>>(buf: &'a [u8]) -> Result<T, RmiError> {
    MsgpCodec.decode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        label: String,
        values: Vec<u64>,
    }

    #[test]
    fn test_round_trip() {
        let sample = Sample {
            label: "fib".to_owned(),
            values: vec![1, 1, 2, 3, 5, 8],
        };

        let bytes = encode(&sample).unwrap();
        assert_eq!(decode::<Sample>(&bytes).unwrap(), sample);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode::<Sample>(&[0xc1, 0xff, 0x00]).is_err());
    }
}
