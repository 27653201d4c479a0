// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Errors that terminate the handshake

use crate::varint::VarInt;
use core::fmt;
use s2n_codec::DecoderError;

//= https://www.rfc-editor.org/rfc/rfc9000#section-20.1
//# QUIC transport error codes and application protocol error codes are
//# 62-bit unsigned integers.

/// A QUIC error carrying the transport error code to use when closing the
/// connection, plus a human readable reason
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Error {
    pub code: VarInt,
    pub reason: &'static str,
}

impl Error {
    /// Creates a new `Error` with the specified code
    pub const fn new(code: VarInt) -> Self {
        Self { code, reason: "" }
    }

    /// Updates the `Error` with the specified `reason`
    #[must_use]
    pub const fn with_reason(mut self, reason: &'static str) -> Self {
        self.reason = reason;
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "Error({})", self.code)
        } else {
            f.write_str(self.reason)
        }
    }
}

impl std::error::Error for Error {}

/// Internal convenience macro for defining standard error codes
macro_rules! def_error {
    ($doc:expr, $name:ident, $code:expr) => {
        impl Error {
            #[doc = $doc]
            pub const $name: Error = Error::new(VarInt::from_u8($code));
        }
    };
}

def_error!(
    "An endpoint uses this with CONNECTION_CLOSE to signal that the connection is being closed abruptly in the absence of any error.",
    NO_ERROR,
    0x0
);

def_error!(
    "The endpoint encountered an internal error and cannot continue with the connection.",
    INTERNAL_ERROR,
    0x1
);

def_error!(
    "An endpoint received transport parameters that were badly formatted, included an invalid value, were absent even though they are mandatory, or were present though they are forbidden.",
    TRANSPORT_PARAMETER_ERROR,
    0x8
);

def_error!(
    "An endpoint detected an error with protocol compliance that was not covered by more specific error codes.",
    PROTOCOL_VIOLATION,
    0xa
);

/// Implements conversion from decoder errors
impl From<DecoderError> for Error {
    fn from(decoder_error: DecoderError) -> Self {
        match decoder_error {
            DecoderError::InvariantViolation(reason) => Error::PROTOCOL_VIOLATION.with_reason(reason),
            _ => Error::PROTOCOL_VIOLATION.with_reason("malformed message"),
        }
    }
}
