//! Canonical length-value encoding of signed bytes.
//!
//! ```text
//! LV(c1, .., cn) = LE32(len(c1)) || c1 || .. || LE32(len(cn)) || cn
//! ```
//!
//! Signer and verifier must produce identical bytes; there is no separator,
//! terminator, or total-length prefix.

use crate::error::{ProtocolError, ProtocolResult};

const LENGTH_PREFIX: usize = 4;

/// Encode chunks in order as length-prefixed records.
pub fn to_length_value<I, C>(chunks: I) -> ProtocolResult<Vec<u8>>
where
    I: IntoIterator<Item = C>,
    C: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for chunk in chunks {
        let chunk = chunk.as_ref();
        let len = u32::try_from(chunk.len()).map_err(|_| ProtocolError::MalformedMessage {
            message: format!("chunk of {} bytes exceeds length prefix", chunk.len()),
        })?;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(chunk);
    }
    Ok(out)
}

/// Split an encoding back into its chunks. `None` if the input is truncated.
pub fn split_length_value(mut bytes: &[u8]) -> Option<Vec<&[u8]>> {
    let mut chunks = Vec::new();
    while !bytes.is_empty() {
        let (prefix, rest) = bytes.split_at_checked(LENGTH_PREFIX)?;
        let len = u32::from_le_bytes(prefix.try_into().ok()?) as usize;
        let (chunk, rest) = rest.split_at_checked(len)?;
        chunks.push(chunk);
        bytes = rest;
    }
    Some(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_layout() {
        let encoded = to_length_value(["a", "bb", "ccc"]).unwrap();
        let expected: Vec<u8> = vec![
            1, 0, 0, 0, b'a', //
            2, 0, 0, 0, b'b', b'b', //
            3, 0, 0, 0, b'c', b'c', b'c',
        ];
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_decodes_back_to_chunks() {
        let encoded = to_length_value(["a", "bb", "ccc"]).unwrap();
        let chunks = split_length_value(&encoded).unwrap();
        assert_eq!(
            chunks,
            vec![b"a".as_slice(), b"bb".as_slice(), b"ccc".as_slice()]
        );
    }

    #[test]
    fn test_empty_chunks_and_lists() {
        assert!(to_length_value(Vec::<&str>::new()).unwrap().is_empty());
        assert_eq!(to_length_value([""]).unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(split_length_value(&[]).unwrap(), Vec::<&[u8]>::new());
    }

    #[test]
    fn test_deterministic() {
        let chunks = ["Google", "ECv2SigningOnly", "{\"keyValue\":\"x\"}"];
        assert_eq!(
            to_length_value(chunks).unwrap(),
            to_length_value(chunks).unwrap()
        );
    }

    #[test]
    fn test_concatenation_composes() {
        let left = to_length_value(["Google", "merchant:1"]).unwrap();
        let right = to_length_value(["ECv2SigningOnly", "payload"]).unwrap();
        let whole =
            to_length_value(["Google", "merchant:1", "ECv2SigningOnly", "payload"]).unwrap();
        assert_eq!([left, right].concat(), whole);
    }

    #[test]
    fn test_length_counts_bytes_not_chars() {
        let encoded = to_length_value(["é"]).unwrap();
        assert_eq!(&encoded[..4], &[2, 0, 0, 0]);
    }

    #[test]
    fn test_truncated_input_rejected() {
        let encoded = to_length_value(["abc"]).unwrap();
        assert!(split_length_value(&encoded[..2]).is_none());
        assert!(split_length_value(&encoded[..5]).is_none());
    }
}
