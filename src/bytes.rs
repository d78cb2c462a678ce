//! Byte-level codecs shared by the wire formats.
//!
//! Strings travel as a big-endian `u16` byte length followed by modified
//! UTF-8: NUL as `C0 80`, the basic plane as standard UTF-8, supplementary
//! characters as surrogate pairs of three-byte sequences.

use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

pub(crate) fn write_string<W: io::Write>(value: &str, sink: &mut W) -> Result<()> {
    let mut encoded = Vec::with_capacity(value.len());
    for c in value.chars() {
        push_code_point(c as u32, &mut encoded);
    }
    if encoded.len() > u16::MAX as usize {
        return Err(Error::StringTooLong(encoded.len()));
    }
    sink.write_u16::<BigEndian>(encoded.len() as u16)?;
    sink.write_all(&encoded)?;
    Ok(())
}

fn push_code_point(point: u32, out: &mut Vec<u8>) {
    match point {
        1..=0x7F => out.push(point as u8),
        0 | 0x80..=0x7FF => {
            out.push(0xC0 | (point >> 6) as u8);
            out.push(0x80 | (point & 0x3F) as u8);
        }
        0x800..=0xFFFF => {
            out.push(0xE0 | (point >> 12) as u8);
            out.push(0x80 | ((point >> 6) & 0x3F) as u8);
            out.push(0x80 | (point & 0x3F) as u8);
        }
        _ => {
            // Outside the basic plane: a surrogate pair, each half above.
            let split = point - 0x1_0000;
            push_code_point(0xD800 + (split >> 10), out);
            push_code_point(0xDC00 + (split & 0x3FF), out);
        }
    }
}

pub(crate) fn read_string<R: io::Read>(source: &mut R) -> Result<String> {
    let len = source.read_u16::<BigEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    source.read_exact(&mut bytes)?;
    let mut units: Vec<u16> = Vec::with_capacity(len);
    let mut at = 0;
    while at < len {
        let lead = bytes[at];
        if lead & 0x80 == 0 {
            units.push(lead as u16);
            at += 1;
        } else if lead & 0xE0 == 0xC0 {
            let tail = continuation(&bytes, at + 1)?;
            units.push((((lead & 0x1F) as u16) << 6) | tail as u16);
            at += 2;
        } else if lead & 0xF0 == 0xE0 {
            let mid = continuation(&bytes, at + 1)?;
            let tail = continuation(&bytes, at + 2)?;
            units.push((((lead & 0x0F) as u16) << 12) | ((mid as u16) << 6) | tail as u16);
            at += 3;
        } else {
            return Err(Error::MalformedString);
        }
    }
    String::from_utf16(&units).map_err(|_| Error::MalformedString)
}

fn continuation(bytes: &[u8], at: usize) -> Result<u8> {
    match bytes.get(at) {
        Some(&byte) if byte & 0xC0 == 0x80 => Ok(byte & 0x3F),
        _ => Err(Error::MalformedString),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(value: &str) -> String {
        let mut buffer = Vec::new();
        write_string(value, &mut buffer).unwrap();
        read_string(&mut buffer.as_slice()).unwrap()
    }

    #[test]
    fn round_trips() {
        for value in ["", "ascii", "naïve", "木本植物", "a\u{0}b", "tree \u{1F333}"] {
            assert_eq!(round_trip(value), value);
        }
    }

    #[test]
    fn nul_is_two_bytes() {
        let mut buffer = Vec::new();
        write_string("\u{0}", &mut buffer).unwrap();
        assert_eq!(buffer, [0, 2, 0xC0, 0x80]);
    }

    #[test]
    fn supplementary_is_a_surrogate_pair() {
        let mut buffer = Vec::new();
        write_string("\u{1F333}", &mut buffer).unwrap();
        // Six payload bytes: two three-byte halves.
        assert_eq!(buffer[..2], [0, 6]);
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn oversized_string_is_rejected() {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut buffer = Vec::new();
        assert!(matches!(
            write_string(&long, &mut buffer),
            Err(Error::StringTooLong(_))
        ));
    }

    #[test]
    fn truncated_sequence_is_rejected() {
        let mut source: &[u8] = &[0, 2, 0xC3, 0x28];
        assert!(matches!(read_string(&mut source), Err(Error::MalformedString)));
    }
}
