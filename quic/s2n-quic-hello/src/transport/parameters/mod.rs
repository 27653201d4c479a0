// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! QUIC transport parameters and their wire codec
//!
//! Transport parameters ride in a dedicated TLS extension as a sequence of
//! `id (varint) | length (varint) | value (length bytes)` entries. The
//! decoder walks that sequence into a [`TransportParameters`] struct,
//! applying per-parameter validation and the defaults mandated for absent
//! parameters; the encoder emits the non-default parameters of a local set
//! in a fixed order.

use crate::{connection, stateless_reset, varint::VarInt};
use bytes::Bytes;
use core::{
    convert::{TryFrom, TryInto},
    net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6},
    time::Duration,
};
use s2n_codec::{
    decoder_invariant, decoder_value, DecoderBuffer, DecoderBufferResult, DecoderError,
    DecoderValue, Encoder, EncoderValue,
};


mod disabled_parameter;
pub use disabled_parameter::DisabledParameter;

/// Trait for a transport parameter value
pub trait TransportParameter: Sized {
    /// The wire ID for the parameter
    const ID: TransportParameterId;

    /// Enables/disables the parameter in a certain context
    const ENABLED: bool = true;

    /// Associated type for decoding/encoding the parameter value
    type CodecValue;

    /// Creates a `TransportParameter` from the `CodecValue`
    fn from_codec_value(value: Self::CodecValue) -> Self;

    /// Attempts to convert the `TransportParameter` into the `CodecValue`
    ///
    /// Returning `None` omits the parameter from the encoded set.
    fn try_into_codec_value(&self) -> Option<&Self::CodecValue>;

    /// Returns the value assumed when the parameter is absent
    fn default_value() -> Self;
}

/// Trait for validating transport parameter values
pub trait TransportParameterValidator: Sized {
    /// Validates that the transport parameter is in a valid state
    fn validate(self) -> Result<Self, DecoderError> {
        Ok(self)
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18
//# Transport Parameter {
//#    Transport Parameter ID (i),
//#    Transport Parameter Length (i),
//#    Transport Parameter Value (..),
//# }

type TransportParameterId = VarInt;
type TransportParameterLength = VarInt;

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.1
//# Transport parameters with an identifier of the form "31 * N + 27" for
//# integer values of N are reserved to exercise the requirement that
//# unknown transport parameters be ignored.

/// Returns true if the id falls in the reserved (greasing) space
pub fn is_reserved(id: VarInt) -> bool {
    *id % 31 == 27
}

/// Utility struct for encoding and decoding transport parameters
struct TransportParameterCodec<T>(T);

impl<'a, T: TransportParameter> DecoderValue<'a> for TransportParameterCodec<T>
where
    T::CodecValue: DecoderValue<'a>,
{
    fn decode(buffer: DecoderBuffer<'a>) -> DecoderBufferResult<'a, Self> {
        let (value, buffer) = buffer.decode_with_len_prefix::<TransportParameterLength, _>()?;
        Ok((Self(T::from_codec_value(value)), buffer))
    }
}

impl<T: TransportParameter> EncoderValue for TransportParameterCodec<&T>
where
    T::CodecValue: EncoderValue,
{
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        if let Some(value) = self.0.try_into_codec_value() {
            buffer.encode(&T::ID);
            buffer.encode_with_len_prefix::<TransportParameterLength, _>(value);
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ValidationError(&'static str);

const MAX_ENCODABLE_VALUE: ValidationError =
    ValidationError("provided value exceeds maximum encodable value");

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DecoderError> for ValidationError {
    fn from(error: DecoderError) -> Self {
        ValidationError(error.into())
    }
}

impl From<crate::varint::VarIntError> for ValidationError {
    fn from(_: crate::varint::VarIntError) -> Self {
        MAX_ENCODABLE_VALUE
    }
}

impl From<core::num::TryFromIntError> for ValidationError {
    fn from(_: core::num::TryFromIntError) -> Self {
        MAX_ENCODABLE_VALUE
    }
}

impl From<core::convert::Infallible> for ValidationError {
    fn from(_: core::convert::Infallible) -> Self {
        // Infallible can't actually be created
        MAX_ENCODABLE_VALUE
    }
}

/// Creates a transport parameter struct with the inner codec type
macro_rules! transport_parameter {
    ($name:ident($encodable_type:ty), $tag:expr) => {
        transport_parameter!(
            $name($encodable_type),
            $tag,
            <$encodable_type as Default>::default()
        );
    };
    ($name:ident($encodable_type:ty), $tag:expr, $default:expr) => {
        #[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord)]
        pub struct $name($encodable_type);

        impl Default for $name {
            fn default() -> Self {
                Self($default)
            }
        }

        impl $name {
            /// Creates a transport parameter with the given value
            pub fn new<T: TryInto<$encodable_type>>(value: T) -> Option<Self> {
                value
                    .try_into()
                    .ok()
                    .map(Self)
                    .and_then(|value| value.validate().ok())
            }
        }

        impl TryFrom<$encodable_type> for $name {
            type Error = ValidationError;

            fn try_from(value: $encodable_type) -> Result<Self, Self::Error> {
                Self(value).validate().map_err(|err| err.into())
            }
        }

        impl TransportParameter for $name {
            type CodecValue = $encodable_type;

            const ID: TransportParameterId = $tag;

            fn from_codec_value(value: Self::CodecValue) -> Self {
                Self(value)
            }

            fn try_into_codec_value(&self) -> Option<&Self::CodecValue> {
                // To save bytes on the wire, don't send the value if it matches the default value
                if self.0 == $default {
                    None
                } else {
                    Some(&self.0)
                }
            }

            fn default_value() -> Self {
                Self($default)
            }
        }

        impl core::ops::Deref for $name {
            type Target = $encodable_type;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl PartialEq<$encodable_type> for $name {
            fn eq(&self, value: &$encodable_type) -> bool {
                self.0.eq(value)
            }
        }

        impl PartialOrd<$encodable_type> for $name {
            fn partial_cmp(&self, value: &$encodable_type) -> Option<core::cmp::Ordering> {
                self.0.partial_cmp(value)
            }
        }
    };
}

macro_rules! varint_transport_parameter {
    ($name:ident, $tag:expr $(, $default:expr)?) => {
        transport_parameter!($name(VarInt), $tag $(, $default)?);

        impl TryFrom<u64> for $name {
            type Error = ValidationError;

            fn try_from(value: u64) -> Result<Self, Self::Error> {
                let value = VarInt::new(value)?;
                Self::try_from(value)
            }
        }

        impl $name {
            pub const fn as_varint(self) -> VarInt {
                self.0
            }
        }
    };
}

/// Implements an optional transport parameter. Used for transport parameters
/// that don't have a meaningful default, like a connection ID.
macro_rules! optional_transport_parameter {
    ($ty:ty) => {
        impl TransportParameter for Option<$ty> {
            type CodecValue = $ty;

            const ID: TransportParameterId = <$ty as TransportParameter>::ID;

            fn from_codec_value(value: Self::CodecValue) -> Self {
                Some(value)
            }

            fn try_into_codec_value(&self) -> Option<&Self::CodecValue> {
                self.as_ref()
            }

            fn default_value() -> Self {
                None
            }
        }

        impl TransportParameterValidator for Option<$ty> {
            fn validate(self) -> Result<Self, DecoderError> {
                if let Some(value) = self {
                    Ok(Some(value.validate()?))
                } else {
                    Ok(None)
                }
            }
        }
    };
}

macro_rules! connection_id_parameter {
    ($name:ident, $tag:expr) => {
        transport_parameter!($name(connection::ConnectionId), $tag);

        // The inner connection ID handles validation
        impl TransportParameterValidator for $name {}

        impl TryFrom<&[u8]> for $name {
            type Error = crate::connection::id::Error;

            fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
                Ok(Self(connection::ConnectionId::try_from(value)?))
            }
        }

        decoder_value!(
            impl<'a> $name {
                fn decode(buffer: Buffer) -> Result<Self> {
                    let (connection_id, buffer) = buffer.decode()?;
                    Ok((Self(connection_id), buffer))
                }
            }
        );

        impl EncoderValue for $name {
            fn encode<E: Encoder>(&self, encoder: &mut E) {
                self.0.encode(encoder)
            }
        }
    };
}

/// Implements a zero-length transport parameter whose presence on the wire
/// enables a capability
macro_rules! flag_transport_parameter {
    ($name:ident, $tag:expr) => {
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub enum $name {
            #[default]
            Disabled,
            Enabled,
        }

        impl $name {
            pub const fn is_enabled(self) -> bool {
                matches!(self, Self::Enabled)
            }
        }

        impl TransportParameter for $name {
            type CodecValue = ();

            const ID: TransportParameterId = $tag;

            fn from_codec_value(_value: ()) -> Self {
                Self::Enabled
            }

            fn try_into_codec_value(&self) -> Option<&()> {
                if let Self::Enabled = self {
                    Some(&())
                } else {
                    None
                }
            }

            fn default_value() -> Self {
                Self::Disabled
            }
        }

        impl TransportParameterValidator for $name {}
    };
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# original_destination_connection_id (0x00): This parameter is the value of the
//#    Destination Connection ID field from the first Initial packet sent
//#    by the client; see Section 7.3.  This transport parameter is only
//#    sent by a server.

connection_id_parameter!(OriginalDestinationConnectionId, VarInt::from_u8(0x00));
optional_transport_parameter!(OriginalDestinationConnectionId);

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# max_idle_timeout (0x01):  The maximum idle timeout is a value in
//#    milliseconds that is encoded as an integer; see (Section 10.1).
//#    Idle timeout is disabled when both endpoints omit this transport
//#    parameter or specify a value of 0.

transport_parameter!(MaxIdleTimeout(VarInt), VarInt::from_u8(0x01), VarInt::ZERO);

impl MaxIdleTimeout {
    /// Returns the `max_idle_timeout` if set
    pub fn as_duration(&self) -> Option<Duration> {
        if self.0 == VarInt::ZERO {
            None
        } else {
            Some(Duration::from_millis(self.0.as_u64()))
        }
    }
}

impl TransportParameterValidator for MaxIdleTimeout {}

impl TryFrom<Duration> for MaxIdleTimeout {
    type Error = ValidationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        let value: VarInt = value.as_millis().try_into()?;
        value.try_into()
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# stateless_reset_token (0x02):  A stateless reset token is used in
//#    verifying a stateless reset; see Section 10.3.  This parameter is
//#    a sequence of 16 bytes.  This transport parameter MUST NOT be sent
//#    by a client, but MAY be sent by a server.

optional_transport_parameter!(stateless_reset::Token);

impl TransportParameter for stateless_reset::Token {
    type CodecValue = Self;

    const ID: TransportParameterId = VarInt::from_u8(0x02);

    fn from_codec_value(value: Self) -> Self {
        value
    }

    fn try_into_codec_value(&self) -> Option<&Self> {
        Some(self)
    }

    fn default_value() -> Self {
        Self::ZEROED
    }
}

impl TransportParameterValidator for stateless_reset::Token {}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# max_udp_payload_size (0x03):  The maximum UDP payload size parameter
//#    is an integer value that limits the size of UDP payloads that the
//#    endpoint is willing to receive.
//#
//#    The default for this parameter is the maximum permitted UDP
//#    payload of 65527.  Values below 1200 are invalid.

transport_parameter!(
    MaxUdpPayloadSize(VarInt),
    VarInt::from_u8(0x03),
    VarInt::from_u16(65527)
);

impl TransportParameterValidator for MaxUdpPayloadSize {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(
            (1200..=65527).contains(&*self.0),
            "max_udp_payload_size should be within 1200 and 65527 bytes"
        );
        Ok(self)
    }
}

impl TryFrom<u16> for MaxUdpPayloadSize {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let value: VarInt = value.into();
        value.try_into()
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# initial_max_data (0x04):  The initial maximum data parameter is an
//#    integer value that contains the initial value for the maximum
//#    amount of data that can be sent on the connection.

varint_transport_parameter!(InitialMaxData, VarInt::from_u8(0x04));

impl TransportParameterValidator for InitialMaxData {}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# initial_max_stream_data_bidi_local (0x05):  This parameter is an
//#    integer value specifying the initial flow control limit for
//#    locally-initiated bidirectional streams.

varint_transport_parameter!(InitialMaxStreamDataBidiLocal, VarInt::from_u8(0x05));

impl TransportParameterValidator for InitialMaxStreamDataBidiLocal {}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# initial_max_stream_data_bidi_remote (0x06):  This parameter is an
//#    integer value specifying the initial flow control limit for peer-
//#    initiated bidirectional streams.

varint_transport_parameter!(InitialMaxStreamDataBidiRemote, VarInt::from_u8(0x06));

impl TransportParameterValidator for InitialMaxStreamDataBidiRemote {}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# initial_max_stream_data_uni (0x07):  This parameter is an integer
//#    value specifying the initial flow control limit for unidirectional
//#    streams.

varint_transport_parameter!(InitialMaxStreamDataUni, VarInt::from_u8(0x07));

impl TransportParameterValidator for InitialMaxStreamDataUni {}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# initial_max_streams_bidi (0x08):  The initial maximum bidirectional
//#    streams parameter is an integer value that contains the initial
//#    maximum number of bidirectional streams the endpoint that receives
//#    this transport parameter is permitted to initiate.

varint_transport_parameter!(InitialMaxStreamsBidi, VarInt::from_u8(0x08));

impl TransportParameterValidator for InitialMaxStreamsBidi {
    fn validate(self) -> Result<Self, DecoderError> {
        //= https://www.rfc-editor.org/rfc/rfc9000#section-4.6
        //# If a max_streams transport parameter or a MAX_STREAMS frame is
        //# received with a value greater than 2^60, this would allow a maximum
        //# stream ID that cannot be expressed as a variable-length integer; see
        //# Section 16.  If either is received, the connection MUST be closed
        //# immediately with a connection error of type TRANSPORT_PARAMETER_ERROR
        //# if the offending value was received in a transport parameter.
        decoder_invariant!(
            *self <= 2u64.pow(60),
            "initial_max_streams_bidi cannot be greater than 2^60"
        );

        Ok(self)
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# initial_max_streams_uni (0x09):  The initial maximum unidirectional
//#    streams parameter is an integer value that contains the initial
//#    maximum number of unidirectional streams the endpoint that
//#    receives this transport parameter is permitted to initiate.

varint_transport_parameter!(InitialMaxStreamsUni, VarInt::from_u8(0x09));

impl TransportParameterValidator for InitialMaxStreamsUni {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(
            *self <= 2u64.pow(60),
            "initial_max_streams_uni cannot be greater than 2^60"
        );

        Ok(self)
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# ack_delay_exponent (0x0a):  The acknowledgement delay exponent is an
//#    integer value indicating an exponent used to decode the ACK Delay
//#    field in the ACK frame (Section 19.3).  If this value is absent, a
//#    default value of 3 is assumed (indicating a multiplier of 8).
//#    Values above 20 are invalid.

varint_transport_parameter!(AckDelayExponent, VarInt::from_u8(0x0a), VarInt::from_u8(3));

impl TransportParameterValidator for AckDelayExponent {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(*self.0 <= 20, "ack_delay_exponent cannot be greater than 20");
        Ok(self)
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# max_ack_delay (0x0b):  The maximum acknowledgment delay is an integer
//#    value indicating the maximum amount of time in milliseconds by
//#    which the endpoint will delay sending acknowledgments.  If this
//#    value is absent, a default of 25 milliseconds is assumed.  Values
//#    of 2^14 or greater are invalid.

varint_transport_parameter!(MaxAckDelay, VarInt::from_u8(0x0b), VarInt::from_u8(25));

impl MaxAckDelay {
    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.0.as_u64())
    }

    /// Returns the delay in microseconds, for comparison against `min_ack_delay`
    pub const fn as_micros(self) -> u64 {
        self.0.as_u64() * 1000
    }
}

impl TransportParameterValidator for MaxAckDelay {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(
            *self.0 < 2u64.pow(14),
            "max_ack_delay must be less than 2^14"
        );
        Ok(self)
    }
}

impl TryFrom<Duration> for MaxAckDelay {
    type Error = ValidationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        let value: VarInt = value.as_millis().try_into()?;
        value.try_into()
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# disable_active_migration (0x0c): The disable active migration
//#    transport parameter is included if the endpoint does not support
//#    active connection migration (Section 9) on the address being used
//#    during the handshake.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MigrationSupport {
    #[default]
    Enabled,
    Disabled,
}

impl TransportParameter for MigrationSupport {
    type CodecValue = ();

    const ID: TransportParameterId = VarInt::from_u8(0x0c);

    fn from_codec_value(_value: ()) -> Self {
        MigrationSupport::Disabled
    }

    fn try_into_codec_value(&self) -> Option<&()> {
        if let MigrationSupport::Disabled = self {
            Some(&())
        } else {
            None
        }
    }

    fn default_value() -> Self {
        MigrationSupport::Enabled
    }
}

impl TransportParameterValidator for MigrationSupport {}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# preferred_address (0x0d):  The server's preferred address is used to
//#    effect a change in server address at the end of the handshake, as
//#    described in Section 9.6.  This transport parameter is only sent
//#    by a server.  Servers MAY choose to only send a preferred address
//#    of one address family by sending an all-zero address and port
//#    (0.0.0.0:0 or [::]:0) for the other family.  IP addresses are
//#    encoded in network byte order.

optional_transport_parameter!(PreferredAddress);

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# Preferred Address {
//#   IPv4 Address (32),
//#   IPv4 Port (16),
//#   IPv6 Address (128),
//#   IPv6 Port (16),
//#   Connection ID Length (8),
//#   Connection ID (..),
//#   Stateless Reset Token (128),
//# }

type CidLength = u8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreferredAddress {
    pub ipv4_address: Option<SocketAddrV4>,
    pub ipv6_address: Option<SocketAddrV6>,
    pub connection_id: connection::ConnectionId,
    pub stateless_reset_token: stateless_reset::Token,
}

impl TransportParameter for PreferredAddress {
    type CodecValue = Self;

    const ID: TransportParameterId = VarInt::from_u8(0x0d);

    fn from_codec_value(value: Self) -> Self {
        value
    }

    fn try_into_codec_value(&self) -> Option<&Self> {
        Some(self)
    }

    fn default_value() -> Self {
        unimplemented!("PreferredAddress is an optional transport parameter, so the default is None")
    }
}

impl TransportParameterValidator for PreferredAddress {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(
            self.ipv4_address.is_some() || self.ipv6_address.is_some(),
            "at least one address needs to be specified"
        );
        Ok(self)
    }
}

decoder_value!(
    impl<'a> PreferredAddress {
        fn decode(buffer: Buffer) -> Result<Self> {
            let (ip, buffer) = buffer.decode::<u32>()?;
            let (port, buffer) = buffer.decode::<u16>()?;
            let ipv4_address = if ip == 0 && port == 0 {
                None
            } else {
                Some(SocketAddrV4::new(Ipv4Addr::from(ip), port))
            };

            let (ip, buffer) = buffer.decode::<u128>()?;
            let (port, buffer) = buffer.decode::<u16>()?;
            let ipv6_address = if ip == 0 && port == 0 {
                None
            } else {
                Some(SocketAddrV6::new(Ipv6Addr::from(ip), port, 0, 0))
            };

            let (connection_id, buffer) =
                buffer.decode_with_len_prefix::<CidLength, connection::ConnectionId>()?;
            let (stateless_reset_token, buffer) = buffer.decode()?;

            let preferred_address = Self {
                ipv4_address,
                ipv6_address,
                connection_id,
                stateless_reset_token,
            };
            Ok((preferred_address, buffer))
        }
    }
);

impl EncoderValue for PreferredAddress {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        if let Some(addr) = self.ipv4_address.as_ref() {
            buffer.encode(&u32::from(*addr.ip()));
            buffer.encode(&addr.port());
        } else {
            buffer.write_repeated(4 + 2, 0);
        }

        if let Some(addr) = self.ipv6_address.as_ref() {
            buffer.encode(&u128::from(*addr.ip()));
            buffer.encode(&addr.port());
        } else {
            buffer.write_repeated(16 + 2, 0);
        }

        buffer.encode_with_len_prefix::<CidLength, _>(&self.connection_id);
        buffer.encode(&self.stateless_reset_token);
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# active_connection_id_limit (0x0e):  This is an integer value
//#   specifying the maximum number of connection IDs from the peer that
//#   an endpoint is willing to store.  The value of the
//#   active_connection_id_limit parameter MUST be at least 2.  If
//#   this transport parameter is absent, a default of 2 is assumed.

varint_transport_parameter!(
    ActiveConnectionIdLimit,
    VarInt::from_u8(0x0e),
    VarInt::from_u8(2)
);

impl TransportParameterValidator for ActiveConnectionIdLimit {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(
            *self.0 >= 2,
            "active_connection_id_limit must be at least 2"
        );
        Ok(self)
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# initial_source_connection_id (0x0f):  This is the value that the
//# endpoint included in the Source Connection ID field of the first
//# Initial packet it sends for the connection; see Section 7.3.

connection_id_parameter!(InitialSourceConnectionId, VarInt::from_u8(0x0f));
optional_transport_parameter!(InitialSourceConnectionId);

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# retry_source_connection_id (0x10):  This is the value that the server
//#    included in the Source Connection ID field of a Retry packet; see
//#    Section 7.3.  This transport parameter is only sent by a server.

connection_id_parameter!(RetrySourceConnectionId, VarInt::from_u8(0x10));
optional_transport_parameter!(RetrySourceConnectionId);

//= https://www.rfc-editor.org/rfc/rfc9221#section-3
//# Support for receiving the DATAGRAM frame types is advertised by means
//# of a QUIC transport parameter (name=max_datagram_frame_size, value=0x20).
//# The default for this parameter is 0, which indicates that the
//# endpoint does not support DATAGRAM frames.

transport_parameter!(
    MaxDatagramFrameSize(VarInt),
    VarInt::from_u8(0x20),
    VarInt::ZERO
);

impl TransportParameterValidator for MaxDatagramFrameSize {}

// disable_1rtt_encryption (0xbaad): zero-length extension negotiated by
// test endpoints to disable packet protection on 1-RTT packets. Both sides
// must offer it for it to take effect; it never ships in production
// configurations.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OneRttEncryption {
    #[default]
    Enabled,
    Disabled,
}

impl TransportParameter for OneRttEncryption {
    type CodecValue = ();

    const ID: TransportParameterId = VarInt::from_u16(0xbaad);

    fn from_codec_value(_value: ()) -> Self {
        OneRttEncryption::Disabled
    }

    fn try_into_codec_value(&self) -> Option<&()> {
        if let OneRttEncryption::Disabled = self {
            Some(&())
        } else {
            None
        }
    }

    fn default_value() -> Self {
        OneRttEncryption::Enabled
    }
}

impl TransportParameterValidator for OneRttEncryption {}

//= https://www.rfc-editor.org/rfc/rfc9368#section-3
//# The version_information transport parameter (0x11) is used by both
//# client and server to communicate their Chosen Version and Available
//# Versions.

/// The raw contents of the version_information parameter
///
/// Version negotiation happens above this crate, so the blob is stored as
/// an owned, opaque copy rather than being interpreted here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VersionInformation(Bytes);

impl VersionInformation {
    pub fn new<T: Into<Bytes>>(value: T) -> Self {
        Self(value.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

optional_transport_parameter!(VersionInformation);

impl TransportParameter for VersionInformation {
    type CodecValue = Self;

    const ID: TransportParameterId = VarInt::from_u8(0x11);

    fn from_codec_value(value: Self) -> Self {
        value
    }

    fn try_into_codec_value(&self) -> Option<&Self> {
        Some(self)
    }

    fn default_value() -> Self {
        Self(Bytes::new())
    }
}

impl TransportParameterValidator for VersionInformation {}

decoder_value!(
    impl<'a> VersionInformation {
        fn decode(buffer: Buffer) -> Result<Self> {
            let len = buffer.len();
            let (value, buffer) = buffer.decode_slice(len)?;
            let value = Bytes::copy_from_slice(value.into_less_safe_slice());
            Ok((VersionInformation(value), buffer))
        }
    }
);

impl EncoderValue for VersionInformation {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_slice(&self.0);
    }
}

//= https://www.rfc-editor.org/rfc/rfc9002#section-6.2
// min_ack_delay (0xff04de1b): the ACK frequency extension's declaration of
// the smallest delay, in microseconds, the endpoint is willing to use when
// delaying acknowledgements. Must not exceed the peer-facing max_ack_delay.

varint_transport_parameter!(MinAckDelay, VarInt::from_u32(0xff04_de1b));
optional_transport_parameter!(MinAckDelay);

impl MinAckDelay {
    pub const fn as_duration(self) -> Duration {
        Duration::from_micros(self.0.as_u64())
    }
}

impl TransportParameterValidator for MinAckDelay {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(
            *self.0 < 2u64.pow(24),
            "min_ack_delay cannot exceed 2^24 - 1 microseconds"
        );
        Ok(self)
    }
}

decoder_value!(
    impl<'a> MinAckDelay {
        fn decode(buffer: Buffer) -> Result<Self> {
            let (value, buffer) = buffer.decode::<VarInt>()?;
            Ok((MinAckDelay(value), buffer))
        }
    }
);

impl EncoderValue for MinAckDelay {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        self.0.encode(encoder)
    }
}

// cibir_encoding (0x1000): declares the byte range of the connection ID
// that carries the CIBIR identifier.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CibirEncoding {
    pub length: VarInt,
    pub offset: VarInt,
}

optional_transport_parameter!(CibirEncoding);

impl TransportParameter for CibirEncoding {
    type CodecValue = Self;

    const ID: TransportParameterId = VarInt::from_u16(0x1000);

    fn from_codec_value(value: Self) -> Self {
        value
    }

    fn try_into_codec_value(&self) -> Option<&Self> {
        Some(self)
    }

    fn default_value() -> Self {
        unimplemented!("cibir_encoding is an optional transport parameter, so the default is None")
    }
}

impl TransportParameterValidator for CibirEncoding {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(*self.length >= 1, "cibir length must be at least 1");
        decoder_invariant!(
            (*self.length).saturating_add(*self.offset) <= connection::id::MAX_LEN as u64,
            "cibir range cannot extend past the maximum connection id length"
        );
        Ok(self)
    }
}

decoder_value!(
    impl<'a> CibirEncoding {
        fn decode(buffer: Buffer) -> Result<Self> {
            let (length, buffer) = buffer.decode()?;
            let (offset, buffer) = buffer.decode()?;
            Ok((CibirEncoding { length, offset }, buffer))
        }
    }
);

impl EncoderValue for CibirEncoding {
    fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.encode(&self.length);
        encoder.encode(&self.offset);
    }
}

//= https://www.rfc-editor.org/rfc/rfc9287#section-3
//# An endpoint advertises its support of the greasing of the fixed bit
//# by sending the grease_quic_bit (0x2ab2) transport parameter, which
//# has a zero-length value.

flag_transport_parameter!(GreaseQuicBit, VarInt::from_u16(0x2ab2));

// reliable_reset_enabled (0x17f7586d2cb570): zero-length declaration that
// the endpoint supports receiving CLOSE_STREAM frames with reliable sizes.

flag_transport_parameter!(ReliableStreamReset, VarInt::from_u62(0x0017_f758_6d2c_b570));

// enable_timestamp (0x7158): the value declares which directions of the
// timestamp extension the sender supports: 1 = send, 2 = receive, 3 = both.

transport_parameter!(EnableTimestamp(VarInt), VarInt::from_u16(0x7158), VarInt::ZERO);

impl EnableTimestamp {
    pub const SEND: Self = Self(VarInt::from_u8(0b01));
    pub const RECEIVE: Self = Self(VarInt::from_u8(0b10));
    pub const SEND_AND_RECEIVE: Self = Self(VarInt::from_u8(0b11));

    pub const fn send_enabled(self) -> bool {
        self.0.as_u64() & 0b01 != 0
    }

    pub const fn receive_enabled(self) -> bool {
        self.0.as_u64() & 0b10 != 0
    }
}

impl TransportParameterValidator for EnableTimestamp {
    fn validate(self) -> Result<Self, DecoderError> {
        decoder_invariant!(*self.0 <= 3, "enable_timestamp value cannot be greater than 3");
        Ok(self)
    }
}

//= https://www.rfc-editor.org/rfc/rfc9000#section-18.2
//# A client MUST NOT include any server-only transport parameter:
//# original_destination_connection_id, preferred_address,
//# retry_source_connection_id, or stateless_reset_token.  A server MUST
//# treat receipt of any of these transport parameters as a connection
//# error of type TRANSPORT_PARAMETER_ERROR.

/// Specific transport parameters sent by the client endpoint
pub type ClientTransportParameters = TransportParameters<
    DisabledParameter<OriginalDestinationConnectionId>,
    DisabledParameter<stateless_reset::Token>,
    DisabledParameter<PreferredAddress>,
    DisabledParameter<RetrySourceConnectionId>,
>;

/// Specific transport parameters sent by the server endpoint
pub type ServerTransportParameters = TransportParameters<
    Option<OriginalDestinationConnectionId>,
    Option<stateless_reset::Token>,
    Option<PreferredAddress>,
    Option<RetrySourceConnectionId>,
>;

decoder_value!(
    impl<'a> ClientTransportParameters {
        fn decode(buffer: Buffer) -> Result<Self> {
            let len = buffer.len();
            let (slice, buffer) = buffer.decode_slice(len)?;
            let parameters = Self::decode_parameters(slice.peek())?;
            Ok((parameters, buffer))
        }
    }
);

decoder_value!(
    impl<'a> ServerTransportParameters {
        fn decode(buffer: Buffer) -> Result<Self> {
            let len = buffer.len();
            let (slice, buffer) = buffer.decode_slice(len)?;
            let parameters = Self::decode_parameters(slice.peek())?;
            Ok((parameters, buffer))
        }
    }
);

macro_rules! impl_transport_parameters {
    (
        pub struct TransportParameters <
        $($server_param:ident),* $(,)? >
        { $($field:ident : $field_ty:ty),* $(,)? }
    ) => {
        #[derive(Clone, Debug, PartialEq)]
        pub struct TransportParameters<$($server_param),*> {
            $(
                pub $field: $field_ty
            ),*
        }

        impl<$($server_param),*> Default for TransportParameters<$($server_param),*>
        where
            $(
                $server_param: TransportParameter,
            )*
        {
            fn default() -> Self {
                Self {
                    $(
                        $field: TransportParameter::default_value(),
                    )*
                }
            }
        }

        impl<$($server_param),*> EncoderValue for TransportParameters<$($server_param),*>
        where
            $(
                $server_param: TransportParameter,
                $server_param::CodecValue: EncoderValue,
            )*
        {
            // Parameters are written in struct order; the same pass drives
            // both the length estimator and the actual buffer, so the
            // pre-computed size always matches the written size.
            fn encode<E: Encoder>(&self, buffer: &mut E) {
                $(
                    buffer.encode(&TransportParameterCodec(&self.$field));
                )*
            }
        }

        impl<'a, $($server_param),*> TransportParameters<$($server_param),*>
        where
            $(
                $server_param: TransportParameter + TransportParameterValidator,
                $server_param::CodecValue: DecoderValue<'a>,
            )*
        {
            fn decode_parameters(
                mut buffer: DecoderBuffer<'a>
            ) -> Result<TransportParameters<$($server_param),*>, DecoderError> {
                let mut parameters = Self::default();

                // Duplicates are only tracked for the first 64 ids; for
                // extension ids above that bound the last value wins.
                let mut seen_ids = 0u64;

                while !buffer.is_empty() {
                    let (tag, inner_buffer) = buffer.decode::<TransportParameterId>()?;

                    if *tag < 64 {
                        //= https://www.rfc-editor.org/rfc/rfc9000#section-7.4
                        //# An endpoint MUST NOT send a parameter more than once in a given
                        //# transport parameters extension.
                        let bit = 1u64 << *tag;
                        decoder_invariant!(seen_ids & bit == 0, "duplicate transport parameter");
                        seen_ids |= bit;
                    }

                    buffer = match tag {
                        $(
                            tag if tag == <$field_ty>::ID => {
                                // ensure the field is enabled in this context
                                s2n_codec::decoder_invariant!(
                                    <$field_ty>::ENABLED,
                                    concat!(stringify!($field), " is not allowed in this context")
                                );

                                let (value, inner_buffer) =
                                    inner_buffer.decode::<TransportParameterCodec<$field_ty>>()?;

                                //= https://www.rfc-editor.org/rfc/rfc9000#section-7.4
                                //# An endpoint MUST treat receipt of a transport parameter with an
                                //# invalid value as a connection error of type
                                //# TRANSPORT_PARAMETER_ERROR.
                                parameters.$field = value.0.validate()?;

                                inner_buffer
                            }
                        )*
                        _ => {
                            //= https://www.rfc-editor.org/rfc/rfc9000#section-7.4.2
                            //# An endpoint MUST ignore transport parameters that it does
                            //# not support.

                            // Reserved ids (31 * N + 27) land here as well; the
                            // content is skipped over its length prefix.
                            inner_buffer.skip_with_len_prefix::<TransportParameterLength>()?
                        }
                    };
                }

                parameters.validate_constraints()?;

                Ok(parameters)
            }
        }
    };
}

impl_transport_parameters!(
    pub struct TransportParameters<
        OriginalDestinationConnectionId,
        StatelessResetToken,
        PreferredAddress,
        RetrySourceConnectionId,
    > {
        original_destination_connection_id: OriginalDestinationConnectionId,
        max_idle_timeout: MaxIdleTimeout,
        stateless_reset_token: StatelessResetToken,
        max_udp_payload_size: MaxUdpPayloadSize,
        initial_max_data: InitialMaxData,
        initial_max_stream_data_bidi_local: InitialMaxStreamDataBidiLocal,
        initial_max_stream_data_bidi_remote: InitialMaxStreamDataBidiRemote,
        initial_max_stream_data_uni: InitialMaxStreamDataUni,
        initial_max_streams_bidi: InitialMaxStreamsBidi,
        initial_max_streams_uni: InitialMaxStreamsUni,
        ack_delay_exponent: AckDelayExponent,
        max_ack_delay: MaxAckDelay,
        migration_support: MigrationSupport,
        preferred_address: PreferredAddress,
        active_connection_id_limit: ActiveConnectionIdLimit,
        initial_source_connection_id: Option<InitialSourceConnectionId>,
        retry_source_connection_id: RetrySourceConnectionId,
        max_datagram_frame_size: MaxDatagramFrameSize,
        one_rtt_encryption: OneRttEncryption,
        version_information: Option<VersionInformation>,
        min_ack_delay: Option<MinAckDelay>,
        cibir_encoding: Option<CibirEncoding>,
        grease_quic_bit: GreaseQuicBit,
        reliable_stream_reset: ReliableStreamReset,
        enable_timestamp: EnableTimestamp,
    }
);

impl<
        OriginalDestinationConnectionId,
        StatelessResetToken,
        PreferredAddress,
        RetrySourceConnectionId,
    >
    TransportParameters<
        OriginalDestinationConnectionId,
        StatelessResetToken,
        PreferredAddress,
        RetrySourceConnectionId,
    >
{
    /// Checks the requirements that span multiple parameters
    fn validate_constraints(&self) -> Result<(), DecoderError> {
        if let Some(min_ack_delay) = self.min_ack_delay {
            // min_ack_delay is in microseconds while max_ack_delay is in
            // milliseconds; the comparison also applies when max_ack_delay
            // is assumed from its default.
            decoder_invariant!(
                **min_ack_delay <= self.max_ack_delay.as_micros(),
                "min_ack_delay cannot be greater than max_ack_delay"
            );
        }
        Ok(())
    }
}

/// A transport parameter entry with a caller-chosen id
///
/// Appending one of these after an encoded parameter set produces an
/// entry the peer does not know, which exercises the requirement that
/// unknown and reserved parameters be ignored.
#[derive(Clone, Copy, Debug)]
pub struct PrivateTransportParameter<'a> {
    pub id: VarInt,
    pub value: &'a [u8],
}

impl EncoderValue for PrivateTransportParameter<'_> {
    fn encode<E: Encoder>(&self, buffer: &mut E) {
        buffer.encode(&self.id);
        buffer.encode_with_len_prefix::<TransportParameterLength, _>(&self.value);
    }
}
