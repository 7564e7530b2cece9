//! Text framing used inside command and reply records.
//!
//! A frame is one ASCII digit for the kind followed by every parameter, each
//! terminated by a single space: `<digit><param> <param> ...`. There is no
//! other terminator; the end of the record payload ends the frame, and also
//! ends the final token when a writer leaves off its trailing space.

use crate::error::{RecordError, RecordResult};
use crate::event::{Event, EventKind, Params, Reply};
use crate::record::PayloadClass;

const DELIMITER: u8 = b' ';

/// Message that can be framed into and out of a record payload.
pub trait Frame: Sized {
    /// Payload family of the records this frame travels on.
    const CLASS: PayloadClass;

    fn encode_into(&self, out: &mut Vec<u8>) -> RecordResult<()>;

    fn decode(bytes: &[u8]) -> RecordResult<Self>;

    fn encode(&self) -> RecordResult<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }
}

impl Frame for Event {
    const CLASS: PayloadClass = PayloadClass::Command;

    fn encode_into(&self, out: &mut Vec<u8>) -> RecordResult<()> {
        // `Event` cannot be built with the wrong arity; only the delimiter
        // needs checking here.
        if let Some(index) = self.params().iter().position(|p| p.contains(' ')) {
            return Err(RecordError::Delimiter { index });
        }
        out.push(b'0' + self.kind().code());
        for param in self.params() {
            out.extend_from_slice(param.as_bytes());
            out.push(DELIMITER);
        }
        Ok(())
    }

    fn decode(bytes: &[u8]) -> RecordResult<Self> {
        let (&lead, rest) = bytes.split_first().ok_or(RecordError::Empty)?;
        let kind = kind_from_digit(lead)?;
        let params = read_params(kind, rest)?;
        Event::new(kind, params)
    }
}

impl Frame for Reply {
    const CLASS: PayloadClass = PayloadClass::Reply;

    fn encode_into(&self, out: &mut Vec<u8>) -> RecordResult<()> {
        out.push(b'0' + self.code());
        out.push(DELIMITER);
        Ok(())
    }

    fn decode(bytes: &[u8]) -> RecordResult<Self> {
        let (&lead, rest) = bytes.split_first().ok_or(RecordError::Empty)?;
        let reply = lead
            .checked_sub(b'0')
            .and_then(Reply::from_code)
            .ok_or(RecordError::InvalidKind { byte: lead })?;
        // Replies carry the same single placeholder as a NONE event.
        let kind = if reply == Reply::Idle {
            EventKind::None
        } else {
            EventKind::Draw
        };
        let tokens = read_tokens(kind, rest)?;
        if !tokens[0].is_empty() {
            return Err(RecordError::Arity {
                kind,
                expected: 1,
                found: 2,
            });
        }
        Ok(reply)
    }
}

fn kind_from_digit(byte: u8) -> RecordResult<EventKind> {
    match byte {
        b'0'..=b'4' => EventKind::from_code(byte - b'0'),
        _ => Err(RecordError::InvalidKind { byte }),
    }
}

/// Splits a parameter section into space-terminated tokens. A trailing
/// fragment without its delimiter is kept as the last token.
fn split_tokens(rest: &[u8]) -> Vec<&[u8]> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, &byte) in rest.iter().enumerate() {
        if byte == DELIMITER {
            tokens.push(&rest[start..idx]);
            start = idx + 1;
        }
    }
    if start < rest.len() {
        tokens.push(&rest[start..]);
    }
    tokens
}

/// Reads exactly `kind.arity()` tokens. Each token runs to the next space or
/// to the end of the payload; a payload that ends early, or has bytes left
/// over, is an arity violation.
fn read_tokens(kind: EventKind, rest: &[u8]) -> RecordResult<Vec<&[u8]>> {
    let expected = kind.arity();
    let mut tokens = Vec::with_capacity(expected);
    let mut cursor = rest;
    let mut exhausted = false;
    while tokens.len() < expected && !exhausted {
        match cursor.iter().position(|&b| b == DELIMITER) {
            Some(idx) => {
                tokens.push(&cursor[..idx]);
                cursor = &cursor[idx + 1..];
            }
            None => {
                tokens.push(cursor);
                cursor = &[];
                exhausted = true;
            }
        }
    }
    let found = tokens.len() + split_tokens(cursor).len();
    if found != expected {
        return Err(RecordError::Arity {
            kind,
            expected,
            found,
        });
    }
    Ok(tokens)
}

fn read_params(kind: EventKind, rest: &[u8]) -> RecordResult<Params> {
    read_tokens(kind, rest)?
        .into_iter()
        .enumerate()
        .map(|(index, token)| {
            std::str::from_utf8(token)
                .map(str::to_owned)
                .map_err(|_| RecordError::InvalidUtf8 { index })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_raster_round_trip_preserves_order() {
        let event = Event::new(EventKind::ClearRaster, ["0", "127", "255"]).unwrap();
        let bytes = event.encode().unwrap();
        assert_eq!(bytes, b"30 127 255 ");
        let decoded = Event::decode(&bytes).unwrap();
        assert_eq!(decoded.kind(), EventKind::ClearRaster);
        assert_eq!(decoded.params(), ["0", "127", "255"]);
    }

    #[test]
    fn placeholder_events_write_one_empty_token() {
        assert_eq!(Event::none().encode().unwrap(), b"0 ");
        assert_eq!(Event::shutdown().encode().unwrap(), b"2 ");
        assert_eq!(Event::decode(b"2 ").unwrap(), Event::shutdown());
    }

    #[test]
    fn leading_byte_must_be_a_known_kind_digit() {
        for bad in [&b"5 "[..], b"9 ", b"x ", b"- "] {
            assert!(matches!(
                Event::decode(bad),
                Err(RecordError::InvalidKind { .. })
            ));
        }
        assert!(matches!(Event::decode(b""), Err(RecordError::Empty)));
    }

    #[test]
    fn truncated_frame_is_an_arity_violation() {
        let err = Event::decode(b"310 20").unwrap_err();
        assert!(matches!(
            err,
            RecordError::Arity {
                kind: EventKind::ClearRaster,
                expected: 3,
                found: 2
            }
        ));
        assert!(matches!(
            Event::decode(b"3"),
            Err(RecordError::Arity { found: 1, .. })
        ));
    }

    #[test]
    fn final_token_may_end_at_end_of_stream() {
        assert_eq!(Event::decode(b"2").unwrap(), Event::shutdown());
        assert_eq!(Event::decode(b"0").unwrap(), Event::none());
        let clear = Event::decode(b"30 127 255").unwrap();
        assert_eq!(clear.kind(), EventKind::ClearRaster);
        assert_eq!(clear.params(), ["0", "127", "255"]);
        let depth = Event::decode(b"4-12").unwrap();
        assert_eq!(depth.params(), ["-12"]);
    }

    #[test]
    fn surplus_parameters_are_an_arity_violation() {
        let err = Event::decode(b"47 8 ").unwrap_err();
        assert!(matches!(
            err,
            RecordError::Arity {
                kind: EventKind::ClearDepth,
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn parameters_with_spaces_cannot_be_framed() {
        let event = Event::new(EventKind::ClearDepth, ["1 2"]).unwrap();
        assert!(matches!(
            event.encode(),
            Err(RecordError::Delimiter { index: 0 })
        ));
    }

    #[test]
    fn replies_use_a_single_placeholder() {
        assert_eq!(Reply::Done.encode().unwrap(), b"1 ");
        assert_eq!(Reply::decode(b"0 ").unwrap(), Reply::Idle);
        assert_eq!(Reply::decode(b"1 ").unwrap(), Reply::Done);
        assert!(Reply::decode(b"3 ").is_err());
        assert!(Reply::decode(b"1 x ").is_err());
        assert!(Reply::decode(b"1x").is_err());
        assert_eq!(Reply::decode(b"1").unwrap(), Reply::Done);
    }
}
