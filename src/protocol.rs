//! Binary wire protocol for the command channel.
//!
//! Framing is fixed: a 4-byte native-endian tag, then a payload whose size
//! is fixed per tag. String fields are zero-padded UTF-8; padding is
//! stripped on decode. There are no length prefixes; a reader always knows
//! exactly how many bytes to consume next.

use std::path::PathBuf;

/// Tag size on the wire.
pub const TAG_SIZE: usize = 4;

/// `LoadJar` payload field sizes.
pub const PATH_FIELD: usize = 512;
pub const ENTRY_FIELD: usize = 256;
pub const LOAD_JAR_PAYLOAD: usize = PATH_FIELD + ENTRY_FIELD;

pub const TAG_LOAD_JAR: u32 = 0;
pub const TAG_SHUTDOWN: u32 = 1;

/// A fully decoded control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Load the jar at `path` and invoke `entry_class`'s agent-load routine.
    LoadJar { path: PathBuf, entry_class: String },
    /// Tear the session down.
    Shutdown,
}

impl Message {
    /// Payload size for a decoded tag, or `None` for an unknown tag.
    pub fn payload_size(tag: u32) -> Option<usize> {
        match tag {
            TAG_LOAD_JAR => Some(LOAD_JAR_PAYLOAD),
            TAG_SHUTDOWN => Some(0),
            _ => None,
        }
    }

    pub fn tag(&self) -> u32 {
        match self {
            Message::LoadJar { .. } => TAG_LOAD_JAR,
            Message::Shutdown => TAG_SHUTDOWN,
        }
    }

    /// Decode a payload for `tag`. `payload` must be exactly
    /// [`Message::payload_size`] bytes; callers read that many off the wire
    /// before coming here.
    pub fn decode(tag: u32, payload: &[u8]) -> Option<Message> {
        match tag {
            TAG_LOAD_JAR => {
                if payload.len() != LOAD_JAR_PAYLOAD {
                    return None;
                }
                let path = decode_padded(&payload[..PATH_FIELD]);
                let entry_class = decode_padded(&payload[PATH_FIELD..]);
                Some(Message::LoadJar {
                    path: PathBuf::from(path),
                    entry_class,
                })
            }
            TAG_SHUTDOWN => payload.is_empty().then_some(Message::Shutdown),
            _ => None,
        }
    }

    /// Encode the full frame (tag + payload). Oversized strings are
    /// truncated to their field width; controllers are expected to stay
    /// within the limits.
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(TAG_SIZE + LOAD_JAR_PAYLOAD);
        frame.extend_from_slice(&self.tag().to_ne_bytes());
        if let Message::LoadJar { path, entry_class } = self {
            encode_padded(&mut frame, path.to_string_lossy().as_bytes(), PATH_FIELD);
            encode_padded(&mut frame, entry_class.as_bytes(), ENTRY_FIELD);
        }
        frame
    }
}

fn encode_padded(out: &mut Vec<u8>, value: &[u8], width: usize) {
    let len = value.len().min(width);
    out.extend_from_slice(&value[..len]);
    out.resize(out.len() + (width - len), 0);
}

fn decode_padded(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_jar_round_trip() {
        let message = Message::LoadJar {
            path: PathBuf::from("/tmp/x.jar"),
            entry_class: "a.B".to_string(),
        };
        let frame = message.encode();
        assert_eq!(frame.len(), TAG_SIZE + LOAD_JAR_PAYLOAD);

        let tag = u32::from_ne_bytes(frame[..TAG_SIZE].try_into().unwrap());
        assert_eq!(tag, TAG_LOAD_JAR);
        let decoded = Message::decode(tag, &frame[TAG_SIZE..]).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn shutdown_is_tag_only() {
        let frame = Message::Shutdown.encode();
        assert_eq!(frame.len(), TAG_SIZE);
        assert_eq!(Message::decode(TAG_SHUTDOWN, &[]), Some(Message::Shutdown));
    }

    #[test]
    fn padding_is_stripped() {
        let mut payload = vec![0u8; LOAD_JAR_PAYLOAD];
        payload[..4].copy_from_slice(b"/j.j");
        payload[PATH_FIELD..PATH_FIELD + 3].copy_from_slice(b"a.B");
        let decoded = Message::decode(TAG_LOAD_JAR, &payload).unwrap();
        assert_eq!(
            decoded,
            Message::LoadJar {
                path: PathBuf::from("/j.j"),
                entry_class: "a.B".to_string(),
            }
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(Message::payload_size(7), None);
        assert_eq!(Message::decode(7, &[]), None);
    }

    #[test]
    fn oversized_fields_are_truncated_to_width() {
        let long = "x".repeat(PATH_FIELD + 64);
        let frame = Message::LoadJar {
            path: PathBuf::from(&long),
            entry_class: "E".to_string(),
        }
        .encode();
        assert_eq!(frame.len(), TAG_SIZE + LOAD_JAR_PAYLOAD);
        let decoded = Message::decode(TAG_LOAD_JAR, &frame[TAG_SIZE..]).unwrap();
        match decoded {
            Message::LoadJar { path, .. } => {
                assert_eq!(path.to_string_lossy().len(), PATH_FIELD);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
