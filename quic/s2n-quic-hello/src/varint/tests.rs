// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use bolero::check;
use s2n_codec::{assert_codec_round_trip_bytes, assert_codec_round_trip_value};

#[test]
#[cfg_attr(miri, ignore)] // This test is too expensive for miri to complete in a reasonable amount of time
fn round_trip_bytes_test() {
    check!().for_each(|input| {
        assert_codec_round_trip_bytes!(VarInt, input);
    });
}

#[test]
fn round_trip_values_test() {
    check!().with_type().cloned().for_each(|value: u64| {
        if let Ok(value) = VarInt::new(value) {
            let bytes = assert_codec_round_trip_value!(VarInt, value);
            assert_eq!(bytes.len(), value.encoding_size());
        } else {
            assert!(value > MAX_VARINT_VALUE);
        }
    })
}

macro_rules! sequence_test {
    ($name:ident($input:expr, $expected:expr)) => {
        #[test]
        fn $name() {
            let input = $input;
            let expected = VarInt::new($expected).unwrap();
            let actual_bytes = assert_codec_round_trip_value!(VarInt, expected);
            assert_eq!(&input[..], &actual_bytes[..]);
        }
    };
}

// Boundary values for each of the four encoding lengths
sequence_test!(one_byte_min([0x00], 0));
sequence_test!(one_byte_max([0x3f], 63));
sequence_test!(two_byte_min([0x40, 0x40], 64));
sequence_test!(two_byte_max([0x7f, 0xff], 16_383));
sequence_test!(four_byte_min([0x80, 0x00, 0x40, 0x00], 16_384));
sequence_test!(four_byte_max([0xbf, 0xff, 0xff, 0xff], 1_073_741_823));
sequence_test!(eight_byte_min(
    [0xc0, 0x00, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00],
    1_073_741_824
));

//= https://www.rfc-editor.org/rfc/rfc9000#appendix-A.1
//= type=test
//# For example, the eight-byte sequence 0xc2197c5eff14e88c decodes to
//# the decimal value 151,288,809,941,952,652; the four-byte sequence
//# 0x9d7f3e7d decodes to 494,878,333; the two-byte sequence 0x7bbd
//# decodes to 15,293; and the single byte 0x25 decodes to 37 (as does
//# the two-byte sequence 0x4025).
sequence_test!(eight_byte_sequence_example(
    [0xc2, 0x19, 0x7c, 0x5e, 0xff, 0x14, 0xe8, 0x8c],
    151_288_809_941_952_652
));
sequence_test!(four_byte_sequence_example(
    [0x9d, 0x7f, 0x3e, 0x7d],
    494_878_333
));
sequence_test!(two_byte_sequence_example([0x7b, 0xbd], 15_293));
sequence_test!(one_byte_sequence_example([0x25], 37));

#[test]
fn non_minimal_encoding_test() {
    // 37 also decodes from the two-byte sequence 0x4025
    let buffer = s2n_codec::DecoderBuffer::new(&[0x40, 0x25]);
    let (value, remaining) = buffer.decode::<VarInt>().unwrap();
    assert_eq!(value, VarInt::from_u8(37));
    assert!(remaining.is_empty());
}

#[test]
fn insufficient_bytes_test() {
    // every prefix of a valid encoding fails to decode
    let bytes = [0xc2, 0x19, 0x7c, 0x5e, 0xff, 0x14, 0xe8, 0x8c];
    for len in 0..bytes.len() {
        let buffer = s2n_codec::DecoderBuffer::new(&bytes[..len]);
        assert!(buffer.decode::<VarInt>().is_err());
    }
}

#[test]
fn encoding_size_test() {
    for (value, expected) in [
        (0, 1),
        (63, 1),
        (64, 2),
        (16_383, 2),
        (16_384, 4),
        (1_073_741_823, 4),
        (1_073_741_824, 8),
        (MAX_VARINT_VALUE, 8),
    ] {
        assert_eq!(VarInt::new(value).unwrap().encoding_size(), expected);
    }
}

#[test]
fn checked_ops_test() {
    check!().with_type().cloned().for_each(|(a, b): (u64, u64)| {
        if let (Ok(a_v), Ok(b_v)) = (VarInt::new(a), VarInt::new(b)) {
            // checked operations agree with the underlying u64 operations,
            // except where the result leaves the varint range
            assert_eq!(
                a_v.checked_add(b_v).map(|v| v.as_u64()),
                a.checked_add(b).filter(|v| *v <= MAX_VARINT_VALUE)
            );
            assert_eq!(
                a_v.checked_sub(b_v).map(|v| v.as_u64()),
                a.checked_sub(b)
            );
            assert_eq!(
                a_v.checked_mul(b_v).map(|v| v.as_u64()),
                a.checked_mul(b).filter(|v| *v <= MAX_VARINT_VALUE)
            );
            assert_eq!(
                a_v.saturating_add(b_v).as_u64(),
                a.saturating_add(b).min(MAX_VARINT_VALUE)
            );
            assert_eq!(
                a_v.saturating_mul(b_v).as_u64(),
                a.saturating_mul(b).min(MAX_VARINT_VALUE)
            );
        }
    })
}
