// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Defines the QUIC connection ID

use core::convert::TryFrom;
use s2n_codec::{decoder_value, Encoder, EncoderValue};

#[cfg(any(test, feature = "generator"))]
use bolero_generator::*;

//= https://www.rfc-editor.org/rfc/rfc9000#section-17.2
//# In QUIC version 1, this value MUST NOT exceed 20 bytes.

/// The maximum size of a connection ID.
pub const MAX_LEN: usize = 20;

/// An opaque connection ID carried in a transport parameter.
///
/// The bytes are stored inline; connection IDs are at most 20 bytes in
/// QUIC version 1.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(any(feature = "generator", test), derive(TypeGenerator))]
pub struct ConnectionId {
    bytes: [u8; MAX_LEN],
    #[cfg_attr(any(feature = "generator", test), generator(Self::GENERATOR))]
    len: u8,
}

impl core::fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ConnectionId({:?})", self.as_bytes())
    }
}

impl ConnectionId {
    #[cfg(any(feature = "generator", test))]
    const GENERATOR: core::ops::RangeInclusive<u8> = 0..=(MAX_LEN as u8);

    /// Creates a connection ID from a byte slice.
    ///
    /// Returns `None` if the slice exceeds the maximum allowed length
    /// (20 bytes in QUIC v1). All other inputs are valid.
    #[inline]
    pub fn try_from_bytes(bytes: &[u8]) -> Option<ConnectionId> {
        Self::try_from(bytes).ok()
    }

    /// Returns the connection ID in byte form
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.as_ref()
    }

    /// Returns the length of the connection ID
    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns true if this connection ID is zero-length
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl From<[u8; MAX_LEN]> for ConnectionId {
    #[inline]
    fn from(bytes: [u8; MAX_LEN]) -> Self {
        Self {
            bytes,
            len: MAX_LEN as u8,
        }
    }
}

impl TryFrom<&[u8]> for ConnectionId {
    type Error = Error;

    #[inline]
    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let len = slice.len();
        if len > MAX_LEN {
            return Err(Error::InvalidLength);
        }
        let mut bytes = [0; MAX_LEN];
        bytes[..len].copy_from_slice(slice);
        Ok(Self {
            bytes,
            len: len as u8,
        })
    }
}

impl AsRef<[u8]> for ConnectionId {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.bytes[0..self.len as usize]
    }
}

decoder_value!(
    impl<'a> ConnectionId {
        fn decode(buffer: Buffer) -> Result<Self> {
            let len = buffer.len();
            let (value, buffer) = buffer.decode_slice(len)?;
            let value: &[u8] = value.into_less_safe_slice();
            let connection_id = ConnectionId::try_from(value).map_err(|_| {
                s2n_codec::DecoderError::InvariantViolation("invalid connection id")
            })?;

            Ok((connection_id, buffer))
        }
    }
);

impl EncoderValue for ConnectionId {
    #[inline]
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        self.as_ref().encode(encoder)
    }
}

// Implement Default to allow for the transport parameter macros to work
// consistently, though this value should never be used.
impl Default for ConnectionId {
    fn default() -> Self {
        unimplemented!("connection IDs do not have default values")
    }
}

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidLength,
}
