//! Broadcast payload codec.
//!
//! Every broadcast carries a small metadata header in front of the message
//! body. Fields are written in fixed order with no padding:
//!
//! ```text
//! +--------+-----------+-------------+-------------------+-----------------+
//! |  tag   | timestamp | usernameLen |     username      |     payload     |
//! | 1 byte |  8 bytes  |   1 byte    | usernameLen bytes | remaining bytes |
//! +--------+-----------+-------------+-------------------+-----------------+
//! ```
//!
//! The timestamp is the send time in nanoseconds since the Unix epoch,
//! little-endian.

use crate::client::tag::Tag;
use chrono::{DateTime, Utc};
use thiserror::Error;

const TAG_SIZE: usize = 1;
const TIMESTAMP_SIZE: usize = 8;
const USERNAME_LEN_SIZE: usize = 1;

/// Size of the fixed part of the header.
pub const HEADER_SIZE: usize = TAG_SIZE + TIMESTAMP_SIZE + USERNAME_LEN_SIZE;

/// Longest username the one-byte length field can describe.
pub const MAX_USERNAME_LEN: usize = u8::MAX as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("max size of payload ({0}) must be at least {min}", min = HEADER_SIZE)]
    Size(usize),
    #[error("length of username ({0}) cannot exceed {max}", max = MAX_USERNAME_LEN)]
    UsernameTooLong(usize),
    #[error("combined size of payload ({size}) cannot exceed {max}")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("timestamp cannot be represented in nanoseconds")]
    TimestampOutOfRange,
    #[error("broadcast of {len} bytes is shorter than the {needed} bytes its header declares")]
    Truncated { len: usize, needed: usize },
    #[error("unknown message tag {0}")]
    UnknownTag(u8),
}

/// A broadcast with its metadata, as produced by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBroadcast {
    pub tag: Tag,
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub payload: Vec<u8>,
}

/// Maximum message body that fits in `max_wire_size` once the header and
/// `username` are accounted for.
pub fn max_payload_size(max_wire_size: usize, username: &str) -> usize {
    max_wire_size.saturating_sub(HEADER_SIZE + username.len())
}

/// Encode a payload and its metadata into a single broadcast.
pub fn encode(
    max_size: usize,
    tag: Tag,
    timestamp: DateTime<Utc>,
    username: &str,
    payload: &[u8],
) -> Result<Vec<u8>, CodecError> {
    if max_size < HEADER_SIZE {
        return Err(CodecError::Size(max_size));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(CodecError::UsernameTooLong(username.len()));
    }
    let size = HEADER_SIZE + username.len() + payload.len();
    if size > max_size {
        return Err(CodecError::PayloadTooLarge { size, max: max_size });
    }
    let nanos = timestamp
        .timestamp_nanos_opt()
        .ok_or(CodecError::TimestampOutOfRange)?;

    let mut buf = Vec::with_capacity(size);
    buf.push(tag.as_byte());
    buf.extend_from_slice(&(nanos as u64).to_le_bytes());
    buf.push(username.len() as u8);
    buf.extend_from_slice(username.as_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decode a broadcast produced by [`encode`].
///
/// Short input is reported as [`CodecError::Truncated`] rather than read past.
pub fn decode(data: &[u8]) -> Result<DecodedBroadcast, CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::Truncated {
            len: data.len(),
            needed: HEADER_SIZE,
        });
    }

    let tag = Tag::try_from(data[0]).map_err(CodecError::UnknownTag)?;

    let mut ts = [0u8; TIMESTAMP_SIZE];
    ts.copy_from_slice(&data[TAG_SIZE..TAG_SIZE + TIMESTAMP_SIZE]);
    let timestamp = DateTime::from_timestamp_nanos(u64::from_le_bytes(ts) as i64);

    let username_len = data[TAG_SIZE + TIMESTAMP_SIZE] as usize;
    let username_end = HEADER_SIZE + username_len;
    if data.len() < username_end {
        return Err(CodecError::Truncated {
            len: data.len(),
            needed: username_end,
        });
    }
    let username = String::from_utf8_lossy(&data[HEADER_SIZE..username_end]).into_owned();
    let payload = data[username_end..].to_vec();

    Ok(DecodedBroadcast {
        tag,
        timestamp,
        username,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngExt;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_encode_decode() {
        let timestamp = now();
        let payload = b"This is my payload.";
        let encoded = encode(1024, Tag::Join, timestamp, "myUsername", payload).unwrap();
        assert_eq!(encoded.len(), HEADER_SIZE + "myUsername".len() + payload.len());

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.tag, Tag::Join);
        assert_eq!(decoded.timestamp, timestamp);
        assert_eq!(decoded.username, "myUsername");
        assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn test_encode_decode_edges() {
        let timestamp = DateTime::from_timestamp_nanos(0);
        let username = "u".repeat(MAX_USERNAME_LEN);
        let max = HEADER_SIZE + username.len();

        // Exactly at the limit with an empty body.
        let encoded = encode(max, Tag::Exit, timestamp, &username, &[]).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.username, username);
        assert!(decoded.payload.is_empty());
        assert_eq!(decoded.timestamp, timestamp);

        // Empty username and a body with an embedded NUL.
        let encoded = encode(HEADER_SIZE + 3, Tag::Admin, timestamp, "", b"a\0b").unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.tag, Tag::Admin);
        assert_eq!(decoded.username, "");
        assert_eq!(decoded.payload, b"a\0b");
    }

    #[test]
    fn test_random_round_trips() {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-";
        let tags = [Tag::Default, Tag::Join, Tag::Exit, Tag::Admin];
        let mut rng = rand::rng();

        for i in 0..2000 {
            let tag = tags[i % tags.len()];
            let username: String = (0..rng.random_range(0..=MAX_USERNAME_LEN))
                .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
                .collect();
            let nanos = match i % 5 {
                0 => i64::MIN,
                1 => i64::MAX,
                2 => rng.random_range(i64::MIN..0),
                _ => rng.random_range(i64::MIN..=i64::MAX),
            };
            let timestamp = DateTime::from_timestamp_nanos(nanos);
            let max_size = rng.random_range(HEADER_SIZE + username.len()..=2048);
            let room = max_payload_size(max_size, &username);
            let payload: Vec<u8> = (0..rng.random_range(0..=room))
                .map(|_| rng.random_range(0..=u8::MAX))
                .collect();

            let encoded = encode(max_size, tag, timestamp, &username, &payload).unwrap();
            assert!(encoded.len() <= max_size);
            let decoded = decode(&encoded).unwrap();
            assert_eq!(
                decoded,
                DecodedBroadcast {
                    tag,
                    timestamp,
                    username,
                    payload,
                }
            );
        }
    }

    #[test]
    fn test_encode_max_size_below_header() {
        assert_eq!(
            encode(9, Tag::Default, now(), "", &[]),
            Err(CodecError::Size(9))
        );
        assert_eq!(
            encode(0, Tag::Default, now(), "bob", b"x"),
            Err(CodecError::Size(0))
        );
    }

    #[test]
    fn test_encode_username_too_long() {
        let username = "x".repeat(256);
        assert_eq!(
            encode(4096, Tag::Default, now(), &username, b"hi"),
            Err(CodecError::UsernameTooLong(256))
        );
    }

    #[test]
    fn test_encode_payload_too_large() {
        let err = encode(HEADER_SIZE + 5, Tag::Default, now(), "alice", b"!").unwrap_err();
        assert_eq!(
            err,
            CodecError::PayloadTooLarge {
                size: HEADER_SIZE + 6,
                max: HEADER_SIZE + 5
            }
        );
    }

    #[test]
    fn test_decode_short_input() {
        assert!(matches!(decode(&[]), Err(CodecError::Truncated { .. })));
        assert!(matches!(decode(&[0; 9]), Err(CodecError::Truncated { .. })));

        // Header declares a 5-byte username but only 2 bytes follow.
        let mut data = vec![0u8; HEADER_SIZE];
        data[HEADER_SIZE - 1] = 5;
        data.extend_from_slice(b"ab");
        assert_eq!(
            decode(&data),
            Err(CodecError::Truncated {
                len: HEADER_SIZE + 2,
                needed: HEADER_SIZE + 5
            })
        );
    }

    #[test]
    fn test_decode_unknown_tag() {
        let mut data = encode(64, Tag::Default, now(), "bob", b"hey").unwrap();
        data[0] = 9;
        assert_eq!(decode(&data), Err(CodecError::UnknownTag(9)));
    }

    #[test]
    fn test_max_payload_size() {
        assert_eq!(max_payload_size(100, "alice"), 85);
        assert_eq!(max_payload_size(100, ""), 90);
        assert_eq!(max_payload_size(5, "alice"), 0);
    }
}
