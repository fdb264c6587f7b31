//! Index key codec
//!
//! An index key is a non-empty sequence of u16 mod values:
//!
//! ```text
//! +--------------+--------------+-----+
//! | values[0] BE | values[1] BE | ... |  (2 bytes each)
//! +--------------+--------------+-----+
//! ```
//!
//! `values[0]` is the primary value, the scaled average the query
//! predicate reads. The remaining values are the mod's raw template
//! values; they keep keys distinct between mods whose averages collide
//! and carry no query semantics.
//!
//! Big-endian encoding makes lexicographic byte order equal numeric order
//! of the primary value, which is what lets a descending cursor visit
//! higher-valued entries first.

use super::errors::{IndexError, IndexResult};

/// Encodes a value sequence into index key bytes.
///
/// Callers guarantee `values` is non-empty; the writer never indexes a
/// mod without a primary value.
pub fn encode_mod_index_key(values: &[u16]) -> Vec<u8> {
    let mut key = Vec::with_capacity(values.len() * 2);
    for value in values {
        key.extend_from_slice(&value.to_be_bytes());
    }
    key
}

/// Decodes index key bytes back into the value sequence.
///
/// Rejects empty keys and keys whose length is not a multiple of two;
/// either means the bucket holds something that is not an index key and
/// the query touching it must abort.
pub fn decode_mod_index_key(key: &[u8]) -> IndexResult<Vec<u16>> {
    if key.is_empty() {
        return Err(IndexError::key_decode("empty key", key));
    }
    if key.len() % 2 != 0 {
        return Err(IndexError::key_decode("odd key length", key));
    }

    Ok(key
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let values = vec![240u16, 24, 30];
        let key = encode_mod_index_key(&values);
        assert_eq!(decode_mod_index_key(&key).unwrap(), values);
    }

    #[test]
    fn test_single_value() {
        let key = encode_mod_index_key(&[150]);
        assert_eq!(key, vec![0x00, 0x96]);
        assert_eq!(decode_mod_index_key(&key).unwrap(), vec![150]);
    }

    #[test]
    fn test_byte_order_matches_primary_order() {
        // Across the full range, including the byte boundary at 256
        let primaries = [0u16, 1, 255, 256, 257, 4095, 65535];
        let mut keys: Vec<Vec<u8>> = primaries
            .iter()
            .map(|p| encode_mod_index_key(&[*p, 7]))
            .collect();

        let unsorted = keys.clone();
        keys.sort();
        assert_eq!(keys, unsorted);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(
            decode_mod_index_key(&[]),
            Err(IndexError::KeyDecode { reason: "empty key", .. })
        ));
    }

    #[test]
    fn test_odd_length_is_rejected() {
        assert!(matches!(
            decode_mod_index_key(&[0x01, 0x02, 0x03]),
            Err(IndexError::KeyDecode { reason: "odd key length", .. })
        ));
    }
}
