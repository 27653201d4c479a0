// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Parsing for the client's first TLS flight
//!
//! A server needs three things out of the CRYPTO bytes of a client's
//! Initial packets before handing the handshake to a TLS stack: the server
//! name the client is asking for, the application protocols it offers, and
//! its QUIC transport parameters. [`read_initial`] extracts all three from
//! the ClientHello without allocating for any of the borrowed fields.

use crate::transport::{parameters::ClientTransportParameters, Error};
use core::convert::TryFrom;
use s2n_codec::{decoder_value, DecoderBuffer};

const MESSAGE_HEADER_LEN: usize = 4;

//= https://www.rfc-editor.org/rfc/rfc8446#section-4.1.2
//# In TLS 1.3, the client indicates its version preferences in the
//# "supported_versions" extension (Section 4.2.1) and the
//# legacy_version field MUST be set to 0x0303, which is the version
//# number for TLS 1.2.
const MIN_PROTOCOL_VERSION: u16 = 0x0301;

const RANDOM_LEN: usize = 32;
const SESSION_ID_MAX_LEN: usize = 32;

const EXTENSION_SERVER_NAME: u16 = 0x0000;
const EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION: u16 = 0x0010;

//= https://www.rfc-editor.org/rfc/rfc9001#section-8.2
//# The quic_transport_parameters extension is carried in the ClientHello
//# and the EncryptedExtensions messages during the handshake.
const EXTENSION_QUIC_TRANSPORT_PARAMETERS: u16 = 0x0039;
const EXTENSION_QUIC_TRANSPORT_PARAMETERS_DRAFT: u16 = 0xffa5;

const SNI_NAME_TYPE_HOST_NAME: u8 = 0;

/// The only QUIC version that still negotiates transport parameters under
/// the pre-standardization extension type
pub const QUIC_VERSION_DRAFT_29: u32 = 0xff00_001d;

macro_rules! handshake_type {
    ($($variant:ident($value:literal)),* $(,)?) => {
        //= https://www.rfc-editor.org/rfc/rfc5246#A.4
        //# enum {
        //#     hello_request(0), client_hello(1), server_hello(2),
        //#     certificate(11), server_key_exchange (12),
        //#     certificate_request(13), server_hello_done(14),
        //#     certificate_verify(15), client_key_exchange(16),
        //#     finished(20)
        //#     (255)
        //# } HandshakeType;
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum HandshakeType {
            $($variant = $value),*
        }

        impl TryFrom<u8> for HandshakeType {
            type Error = ();

            #[inline]
            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)*
                    _ => Err(()),
                }
            }
        }
    };
}

handshake_type!(
    HelloRequest(0),
    ClientHello(1),
    ServerHello(2),
    Certificate(11),
    ServerKeyExchange(12),
    CertificateRequest(13),
    ServerHelloDone(14),
    CertificateVerify(15),
    ClientKeyExchange(16),
    Finished(20),
);

/// The outer framing of a TLS handshake message: a one-byte type followed
/// by a 24-bit big-endian body length
#[derive(Clone, Copy, Debug)]
pub struct HandshakeHeader {
    msg_type: u8,
    length: [u8; 3],
}

impl HandshakeHeader {
    #[inline]
    pub fn msg_type(self) -> Option<HandshakeType> {
        HandshakeType::try_from(self.msg_type).ok()
    }

    #[inline]
    pub fn len(self) -> usize {
        let [a, b, c] = self.length;
        u32::from_be_bytes([0, a, b, c]) as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

decoder_value!(
    impl<'a> HandshakeHeader {
        fn decode(buffer: Buffer) -> Result<Self> {
            let (msg_type, buffer) = buffer.decode::<u8>()?;
            let (length, buffer) = buffer.decode_slice(3)?;
            let mut bytes = [0u8; 3];
            bytes.copy_from_slice(length.as_less_safe_slice());
            let header = HandshakeHeader {
                msg_type,
                length: bytes,
            };
            Ok((header, buffer))
        }
    }
);

/// Returns the length of the prefix of `buffer` that holds only whole TLS
/// handshake messages
///
/// Callers use this to know how many buffered CRYPTO bytes can be flushed
/// to the TLS stack; the remainder is an incomplete message that needs more
/// data.
pub fn complete_messages_len(buffer: &[u8]) -> usize {
    let mut complete_len = 0;
    let mut remaining = DecoderBuffer::new(buffer);

    while let Ok((header, _)) = remaining.decode::<HandshakeHeader>() {
        let message_len = MESSAGE_HEADER_LEN + header.len();
        match remaining.skip(message_len) {
            Ok(rest) => {
                complete_len += message_len;
                remaining = rest;
            }
            Err(_) => break,
        }
    }

    complete_len
}

/// Fields of interest extracted from a client's initial flight
///
/// The name and protocol list borrow directly from the parsed buffer and
/// share its lifetime; copy them before releasing the buffer if they need
/// to outlive it.
#[derive(Debug)]
pub struct ClientHello<'a> {
    /// The first host name entry of the server name indication extension,
    /// if the client sent one. Not NUL-terminated and not validated as a
    /// DNS name.
    pub server_name: Option<&'a [u8]>,
    /// The offered application protocols: the ALPN protocol name list
    /// without its outer length, each entry still carrying its one-byte
    /// length prefix.
    pub application_protocols: &'a [u8],
    /// The client's transport parameters
    pub transport_parameters: ClientTransportParameters,
}

impl<'a> ClientHello<'a> {
    /// Iterates over the individual offered application protocol ids
    pub fn iter_protocols(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let mut remaining = DecoderBuffer::new(self.application_protocols);
        core::iter::from_fn(move || {
            let (protocol, rest) = remaining.decode_slice_with_len_prefix::<u8>().ok()?;
            remaining = rest;
            Some(protocol.into_less_safe_slice())
        })
    }
}

#[derive(Debug, Default)]
struct Extensions<'a> {
    server_name: Option<&'a [u8]>,
    application_protocols: Option<&'a [u8]>,
    transport_parameters: Option<ClientTransportParameters>,
}

/// Reads the client's initial flight from buffered CRYPTO bytes
///
/// Returns `Ok(None)` while the buffer ends in an incomplete handshake
/// message; the caller retries once more CRYPTO data arrives. Any complete
/// message that is not a ClientHello fails the handshake, as does a flight
/// without an ALPN offer or without transport parameters.
///
/// `quic_version` selects the transport parameter extension codepoint;
/// only [`QUIC_VERSION_DRAFT_29`] still uses the draft value.
pub fn read_initial(quic_version: u32, buffer: &[u8]) -> Result<Option<ClientHello>, Error> {
    let mut extensions = Extensions::default();
    let mut remaining = DecoderBuffer::new(buffer);

    loop {
        let header = match remaining.decode::<HandshakeHeader>() {
            Ok((header, _)) => header,
            // not enough bytes for a message header yet
            Err(_) => return Ok(None),
        };

        if header.msg_type() != Some(HandshakeType::ClientHello) {
            return Err(Error::PROTOCOL_VIOLATION
                .with_reason("initial CRYPTO data may only carry client hello messages"));
        }

        let (message, rest) = match remaining
            .skip(MESSAGE_HEADER_LEN)
            .and_then(|buffer| buffer.decode_slice(header.len()))
        {
            Ok(split) => split,
            // the message body is still in flight
            Err(_) => return Ok(None),
        };

        read_client_hello(quic_version, message, &mut extensions)?;

        if rest.is_empty() {
            break;
        }
        remaining = rest;
    }

    let application_protocols = match extensions.application_protocols {
        Some(protocols) => protocols,
        None => {
            return Err(Error::PROTOCOL_VIOLATION
                .with_reason("client hello did not offer any application protocols"))
        }
    };

    let transport_parameters = match extensions.transport_parameters {
        Some(parameters) => parameters,
        None => {
            return Err(Error::TRANSPORT_PARAMETER_ERROR
                .with_reason("client hello is missing the transport parameters extension"))
        }
    };

    // absence of a server name is not an error; virtual hosting simply
    // isn't available for the connection

    Ok(Some(ClientHello {
        server_name: extensions.server_name,
        application_protocols,
        transport_parameters,
    }))
}

/// Copies the client random out of a complete ClientHello message,
/// including its handshake header; used for key-log export
pub fn read_client_random(buffer: &[u8]) -> Result<[u8; RANDOM_LEN], Error> {
    let buffer = DecoderBuffer::new(buffer);
    // handshake header, then the two-byte legacy protocol version
    let buffer = buffer.skip(MESSAGE_HEADER_LEN + 2)?;
    let (random, _) = buffer.decode_slice(RANDOM_LEN)?;

    let mut client_random = [0u8; RANDOM_LEN];
    client_random.copy_from_slice(random.into_less_safe_slice());
    Ok(client_random)
}

//= https://www.rfc-editor.org/rfc/rfc8446#section-4.1.2
//# uint16 ProtocolVersion;
//# opaque Random[32];
//#
//# uint8 CipherSuite[2];    /* Cryptographic suite selector */
//#
//# struct {
//#     ProtocolVersion legacy_version = 0x0303;    /* TLS v1.2 */
//#     Random random;
//#     opaque legacy_session_id<0..32>;
//#     CipherSuite cipher_suites<2..2^16-2>;
//#     opaque legacy_compression_methods<1..2^8-1>;
//#     Extension extensions<8..2^16-1>;
//# } ClientHello;
fn read_client_hello<'a>(
    quic_version: u32,
    buffer: DecoderBuffer<'a>,
    extensions: &mut Extensions<'a>,
) -> Result<(), Error> {
    let (protocol_version, buffer) = buffer.decode::<u16>()?;
    if protocol_version < MIN_PROTOCOL_VERSION {
        return Err(Error::PROTOCOL_VIOLATION.with_reason("unsupported legacy protocol version"));
    }

    let buffer = buffer.skip(RANDOM_LEN)?;

    let (session_id, buffer) = buffer.decode_slice_with_len_prefix::<u8>()?;
    if session_id.len() > SESSION_ID_MAX_LEN {
        return Err(Error::PROTOCOL_VIOLATION.with_reason("legacy session id is too long"));
    }

    let (cipher_suites, buffer) = buffer.decode_slice_with_len_prefix::<u16>()?;
    if cipher_suites.len() % 2 != 0 {
        return Err(
            Error::PROTOCOL_VIOLATION.with_reason("cipher suite vector is not a whole number of suites")
        );
    }

    let (compression_methods, buffer) = buffer.decode_slice_with_len_prefix::<u8>()?;
    if compression_methods.is_empty() {
        return Err(Error::PROTOCOL_VIOLATION.with_reason("at least one compression method is required"));
    }

    // a hello that stops here just offers no extensions
    if buffer.len() < 2 {
        return Ok(());
    }

    let (extension_list, _) = buffer.decode_slice_with_len_prefix::<u16>()?;

    read_extensions(quic_version, extension_list, extensions)
}

//= https://www.rfc-editor.org/rfc/rfc8446#section-4.2
//# struct {
//#     ExtensionType extension_type;
//#     opaque extension_data<0..2^16-1>;
//# } Extension;
fn read_extensions<'a>(
    quic_version: u32,
    mut buffer: DecoderBuffer<'a>,
    extensions: &mut Extensions<'a>,
) -> Result<(), Error> {
    let transport_parameters_type = if quic_version == QUIC_VERSION_DRAFT_29 {
        EXTENSION_QUIC_TRANSPORT_PARAMETERS_DRAFT
    } else {
        EXTENSION_QUIC_TRANSPORT_PARAMETERS
    };

    let mut server_name_seen = false;
    let mut application_protocols_seen = false;
    let mut transport_parameters_seen = false;

    while !buffer.is_empty() {
        let (extension_type, rest) = buffer.decode::<u16>()?;
        let (payload, rest) = rest.decode_slice_with_len_prefix::<u16>()?;

        match extension_type {
            EXTENSION_SERVER_NAME => {
                if core::mem::replace(&mut server_name_seen, true) {
                    return Err(
                        Error::PROTOCOL_VIOLATION.with_reason("duplicate server name extension")
                    );
                }
                if let Some(server_name) = read_server_name(payload)? {
                    extensions.server_name = Some(server_name);
                }
            }
            EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION => {
                if core::mem::replace(&mut application_protocols_seen, true) {
                    return Err(Error::PROTOCOL_VIOLATION
                        .with_reason("duplicate application protocol negotiation extension"));
                }
                extensions.application_protocols = Some(read_application_protocols(payload)?);
            }
            extension_type if extension_type == transport_parameters_type => {
                if core::mem::replace(&mut transport_parameters_seen, true) {
                    return Err(Error::TRANSPORT_PARAMETER_ERROR
                        .with_reason("duplicate transport parameters extension"));
                }
                let (transport_parameters, _) =
                    payload.decode::<ClientTransportParameters>().map_err(|error| {
                        Error::TRANSPORT_PARAMETER_ERROR.with_reason(error.into())
                    })?;
                extensions.transport_parameters = Some(transport_parameters);
            }
            _ => {
                // clients offer plenty of extensions this layer does not
                // care about; the TLS stack sees them later
            }
        }

        buffer = rest;
    }

    if !transport_parameters_seen {
        return Err(Error::TRANSPORT_PARAMETER_ERROR
            .with_reason("client hello is missing the transport parameters extension"));
    }

    Ok(())
}

//= https://www.rfc-editor.org/rfc/rfc6066#section-3
//# struct {
//#     NameType name_type;
//#     select (name_type) {
//#         case host_name: HostName;
//#     } name;
//# } ServerName;
//#
//# enum {
//#     host_name(0), (255)
//# } NameType;
//#
//# opaque HostName<1..2^16-1>;
//#
//# struct {
//#     ServerName server_name_list<1..2^16-1>
//# } ServerNameList;
fn read_server_name(buffer: DecoderBuffer) -> Result<Option<&[u8]>, Error> {
    let (list_len, mut buffer) = buffer.decode::<u16>()?;

    // the smallest list holds one name type and an empty host name
    if list_len < 3 {
        return Err(Error::PROTOCOL_VIOLATION.with_reason("server name list is too short"));
    }

    let mut server_name = None;

    // every entry gets its framing checked, even though only the first
    // host name is captured
    while !buffer.is_empty() {
        let (name_type, rest) = buffer.decode::<u8>()?;
        let (name, rest) = rest.decode_slice_with_len_prefix::<u16>()?;

        if name_type == SNI_NAME_TYPE_HOST_NAME && server_name.is_none() {
            server_name = Some(name.into_less_safe_slice());
        }

        buffer = rest;
    }

    Ok(server_name)
}

//= https://www.rfc-editor.org/rfc/rfc7301#section-3.1
//# opaque ProtocolName<1..2^8-1>;
//#
//# struct {
//#     ProtocolName protocol_name_list<2..2^16-1>
//# } ProtocolNameList;
fn read_application_protocols(buffer: DecoderBuffer) -> Result<&[u8], Error> {
    let (list_len, list) = buffer.decode::<u16>()?;

    if usize::from(list_len) != list.len() {
        return Err(Error::PROTOCOL_VIOLATION
            .with_reason("protocol name list length does not match the extension"));
    }

    if list.is_empty() {
        return Err(
            Error::PROTOCOL_VIOLATION.with_reason("at least one protocol name is required")
        );
    }

    let mut remaining = list;
    while !remaining.is_empty() {
        let (protocol, rest) = remaining.decode_slice_with_len_prefix::<u8>()?;
        if protocol.is_empty() {
            return Err(Error::PROTOCOL_VIOLATION.with_reason("protocol names cannot be empty"));
        }
        remaining = rest;
    }

    Ok(list.into_less_safe_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::VarInt;
    use bolero::check;
    use hex_literal::hex;

    macro_rules! h {
        ($($tt:tt)*) => {
            &hex!($($tt)*)[..]
        }
    }

    /// `max_idle_timeout = 30000ms` as an encoded parameter set
    const TRANSPORT_PARAMETERS: &[u8] = &hex!("01 04 80 00 75 30");

    const SERVER_NAME: &[u8] = &hex!("00 0e 00 00 0b 65 78 61 6d 70 6c 65 2e 63 6f 6d");

    const APPLICATION_PROTOCOLS: &[u8] = &hex!("00 0c 02 68 32 08 68 74 74 70 2f 31 2e 31");

    fn extension(extension_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = extension_type.to_be_bytes().to_vec();
        bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn client_hello_message(extension_lists: &[Vec<u8>]) -> Vec<u8> {
        let mut body = 0x0303u16.to_be_bytes().to_vec();
        body.extend_from_slice(&[0u8; RANDOM_LEN]);
        // empty legacy session id
        body.push(0);
        // one cipher suite
        body.extend_from_slice(&hex!("00 02 13 01"));
        // null compression
        body.extend_from_slice(&hex!("01 00"));

        let extensions = extension_lists.concat();
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend_from_slice(&extensions);

        let mut message = vec![0x01];
        message.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        message.extend_from_slice(&body);
        message
    }

    fn default_client_hello() -> Vec<u8> {
        client_hello_message(&[
            extension(EXTENSION_SERVER_NAME, SERVER_NAME),
            extension(EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION, APPLICATION_PROTOCOLS),
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS, TRANSPORT_PARAMETERS),
        ])
    }

    const QUIC_VERSION_1: u32 = 0x0000_0001;

    #[test]
    fn complete_messages_len_test() {
        let tests = [
            (&[][..], 0),
            // partial header
            (h!("01 00 00"), 0),
            // complete message with a missing body
            (h!("01 00 00 01"), 0),
            // empty message
            (h!("01 00 00 00"), 4),
            // complete message
            (h!("01 00 00 02 aa bb"), 6),
            // complete message and a partial trailer
            (h!("01 00 00 02 aa bb 02 00 00 04 cc"), 6),
            // two complete messages
            (h!("01 00 00 02 aa bb 02 00 00 01 cc"), 11),
        ];

        for (input, expected) in tests {
            assert_eq!(complete_messages_len(input), expected);
        }
    }

    #[test]
    fn complete_messages_len_is_monotone_test() {
        check!().for_each(|input: &[u8]| {
            let len = complete_messages_len(input);
            assert!(len <= input.len());
            if !input.is_empty() {
                assert!(complete_messages_len(&input[..input.len() - 1]) <= len);
            }
        });
    }

    #[test]
    fn read_initial_test() {
        let message = default_client_hello();
        let hello = read_initial(QUIC_VERSION_1, &message).unwrap().unwrap();

        assert_eq!(hello.server_name, Some(&b"example.com"[..]));
        assert_eq!(
            hello.application_protocols,
            h!("02 68 32 08 68 74 74 70 2f 31 2e 31")
        );
        assert_eq!(
            hello.iter_protocols().collect::<Vec<_>>(),
            [&b"h2"[..], &b"http/1.1"[..]]
        );
        assert_eq!(
            hello.transport_parameters.max_idle_timeout,
            VarInt::from_u32(30_000)
        );
    }

    #[test]
    fn read_initial_pending_test() {
        let message = default_client_hello();

        // every proper prefix needs more data
        for len in 0..message.len() {
            assert!(
                read_initial(QUIC_VERSION_1, &message[..len]).unwrap().is_none(),
                "prefix of {len} bytes should be pending"
            );
        }
    }

    #[test]
    fn read_initial_trailing_partial_message_test() {
        let mut message = default_client_hello();
        message.extend_from_slice(h!("01 00 00 20 aa bb"));

        assert!(read_initial(QUIC_VERSION_1, &message).unwrap().is_none());
    }

    #[test]
    fn read_initial_rejects_other_messages_test() {
        // a complete ServerHello-typed message
        let mut message = default_client_hello();
        message[0] = 0x02;

        let error = read_initial(QUIC_VERSION_1, &message).unwrap_err();
        assert_eq!(error.code, Error::PROTOCOL_VIOLATION.code);
    }

    #[test]
    fn read_initial_requires_transport_parameters_test() {
        let message = client_hello_message(&[
            extension(EXTENSION_SERVER_NAME, SERVER_NAME),
            extension(EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION, APPLICATION_PROTOCOLS),
        ]);

        let error = read_initial(QUIC_VERSION_1, &message).unwrap_err();
        assert_eq!(error.code, Error::TRANSPORT_PARAMETER_ERROR.code);
    }

    #[test]
    fn read_initial_requires_application_protocols_test() {
        let message = client_hello_message(&[
            extension(EXTENSION_SERVER_NAME, SERVER_NAME),
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS, TRANSPORT_PARAMETERS),
        ]);

        let error = read_initial(QUIC_VERSION_1, &message).unwrap_err();
        assert_eq!(error.code, Error::PROTOCOL_VIOLATION.code);
    }

    #[test]
    fn read_initial_without_server_name_test() {
        let message = client_hello_message(&[
            extension(EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION, APPLICATION_PROTOCOLS),
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS, TRANSPORT_PARAMETERS),
        ]);

        let hello = read_initial(QUIC_VERSION_1, &message).unwrap().unwrap();
        assert!(hello.server_name.is_none());
    }

    #[test]
    fn read_initial_no_extensions_test() {
        // a hello that ends after the compression methods parses, but the
        // flight is unusable without an ALPN offer
        let mut body = 0x0303u16.to_be_bytes().to_vec();
        body.extend_from_slice(&[0u8; RANDOM_LEN]);
        body.push(0);
        body.extend_from_slice(&hex!("00 02 13 01"));
        body.extend_from_slice(&hex!("01 00"));

        let mut message = vec![0x01];
        message.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        message.extend_from_slice(&body);

        let error = read_initial(QUIC_VERSION_1, &message).unwrap_err();
        assert_eq!(error.code, Error::PROTOCOL_VIOLATION.code);
    }

    #[test]
    fn read_initial_multiple_messages_test() {
        // fields may be spread over several hello messages
        let mut messages = client_hello_message(&[
            extension(EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION, APPLICATION_PROTOCOLS),
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS, TRANSPORT_PARAMETERS),
        ]);
        messages.extend_from_slice(&client_hello_message(&[
            extension(EXTENSION_SERVER_NAME, SERVER_NAME),
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS, TRANSPORT_PARAMETERS),
        ]));

        let hello = read_initial(QUIC_VERSION_1, &messages).unwrap().unwrap();
        assert_eq!(hello.server_name, Some(&b"example.com"[..]));
        assert!(hello.iter_protocols().any(|protocol| protocol == b"h2"));
    }

    #[test]
    fn read_initial_duplicate_extension_test() {
        let alpn = extension(EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION, APPLICATION_PROTOCOLS);
        let message = client_hello_message(&[
            alpn.clone(),
            alpn,
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS, TRANSPORT_PARAMETERS),
        ]);

        assert!(read_initial(QUIC_VERSION_1, &message).is_err());
    }

    #[test]
    fn read_initial_skips_unknown_extensions_test() {
        let message = client_hello_message(&[
            // session ticket
            extension(0x0023, &[1, 2, 3]),
            extension(EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION, APPLICATION_PROTOCOLS),
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS, TRANSPORT_PARAMETERS),
        ]);

        assert!(read_initial(QUIC_VERSION_1, &message).unwrap().is_some());
    }

    #[test]
    fn read_initial_version_test() {
        let mut message = default_client_hello();
        // downgrade the legacy version below TLS 1.0
        message[4] = 0x02;

        assert!(read_initial(QUIC_VERSION_1, &message).is_err());
    }

    #[test]
    fn read_initial_draft_29_test() {
        let standard = default_client_hello();
        let draft = client_hello_message(&[
            extension(EXTENSION_APPLICATION_PROTOCOL_NEGOTIATION, APPLICATION_PROTOCOLS),
            extension(EXTENSION_QUIC_TRANSPORT_PARAMETERS_DRAFT, TRANSPORT_PARAMETERS),
        ]);

        // each version honors exactly one of the two codepoints
        assert!(read_initial(QUIC_VERSION_1, &standard).unwrap().is_some());
        assert!(read_initial(QUIC_VERSION_1, &draft).is_err());
        assert!(read_initial(QUIC_VERSION_DRAFT_29, &draft).unwrap().is_some());
        assert!(read_initial(QUIC_VERSION_DRAFT_29, &standard).is_err());
    }

    #[test]
    fn read_client_random_test() {
        let mut message = default_client_hello();
        for (index, byte) in message[6..6 + RANDOM_LEN].iter_mut().enumerate() {
            *byte = index as u8;
        }

        let random = read_client_random(&message).unwrap();
        for (index, byte) in random.iter().enumerate() {
            assert_eq!(*byte, index as u8);
        }

        assert!(read_client_random(&message[..20]).is_err());
    }

    #[test]
    fn read_server_name_test() {
        let buffer = DecoderBuffer::new(SERVER_NAME);
        assert_eq!(read_server_name(buffer).unwrap(), Some(&b"example.com"[..]));

        // only the first host name is captured
        let list = hex!("00 1a 00 00 0b 65 78 61 6d 70 6c 65 2e 63 6f 6d 00 00 09 6f 74 68 65 72 2e 63 6f 6d");
        let buffer = DecoderBuffer::new(&list);
        assert_eq!(read_server_name(buffer).unwrap(), Some(&b"example.com"[..]));

        // a zero-length host name is captured as an empty slice
        let list = hex!("00 03 00 00 00");
        let buffer = DecoderBuffer::new(&list);
        assert_eq!(read_server_name(buffer).unwrap(), Some(&b""[..]));

        // non-host-name entries are validated but not captured
        let list = hex!("00 04 01 00 01 aa");
        let buffer = DecoderBuffer::new(&list);
        assert_eq!(read_server_name(buffer).unwrap(), None);

        let invalid = [
            // empty payload
            &[][..],
            // list length below the minimum
            h!("00 02 00 00"),
            // name length runs past the extension
            h!("00 0e 00 00 0b 65 78"),
        ];
        for input in invalid {
            assert!(read_server_name(DecoderBuffer::new(input)).is_err());
        }
    }

    #[test]
    fn read_application_protocols_test() {
        let buffer = DecoderBuffer::new(APPLICATION_PROTOCOLS);
        assert_eq!(
            read_application_protocols(buffer).unwrap(),
            h!("02 68 32 08 68 74 74 70 2f 31 2e 31")
        );

        let invalid = [
            // empty payload
            &[][..],
            // empty list
            h!("00 00"),
            // list length disagrees with the payload length
            h!("00 0a 02 68 32 08 68 74 74 70 2f 31 2e 31"),
            // entry runs past the list
            h!("00 03 04 68 32"),
            // empty protocol name
            h!("00 01 00"),
        ];
        for input in invalid {
            assert!(read_application_protocols(DecoderBuffer::new(input)).is_err());
        }
    }

    /// The parsers must never panic, no matter the input
    #[test]
    fn unpredictable_input_test() {
        check!().for_each(|input: &[u8]| {
            let _ = complete_messages_len(input);
            let _ = read_initial(QUIC_VERSION_1, input);
            let _ = read_initial(QUIC_VERSION_DRAFT_29, input);
            let _ = read_client_random(input);
        });
    }
}
