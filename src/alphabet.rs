use crate::Result;

/// The model's alphabet: the first 128 code points (ASCII).
/// A character's id is its code point, so the mapping is a fixed bijection.
pub const ALPHABET_SIZE: usize = 128;

pub type CharId = u32;

/// Encode a string as a sequence of alphabet ids.
/// Fails on the first character outside the alphabet.
pub fn encode(text: &str) -> Result<Vec<CharId>> {
    text.chars()
        .map(|c| {
            let id = c as u32;
            if (id as usize) < ALPHABET_SIZE {
                Ok(id)
            } else {
                Err(crate::Error::Alphabet(format!(
                    "character {:?} (U+{:04X}) is outside the {}-character alphabet",
                    c, id, ALPHABET_SIZE
                )))
            }
        })
        .collect()
}

/// Decode a single alphabet id back to its character.
pub fn decode(id: CharId) -> Result<char> {
    if (id as usize) >= ALPHABET_SIZE {
        return Err(crate::Error::Alphabet(format!(
            "id {} is outside the {}-character alphabet",
            id, ALPHABET_SIZE
        )));
    }
    char::from_u32(id).ok_or_else(|| {
        crate::Error::Alphabet(format!("id {} is not a valid code point", id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_whole_alphabet() {
        for id in 0..ALPHABET_SIZE as u32 {
            let c = char::from_u32(id).unwrap();
            let encoded = encode(&c.to_string()).unwrap();
            assert_eq!(encoded, vec![id]);
            assert_eq!(decode(encoded[0]).unwrap(), c);
        }
    }

    #[test]
    fn encode_is_the_code_point() {
        assert_eq!(encode("Who").unwrap(), vec![87, 104, 111]);
    }

    #[test]
    fn rejects_out_of_alphabet_character() {
        assert!(encode("café").is_err());
    }

    #[test]
    fn rejects_out_of_range_id() {
        assert!(decode(128).is_err());
        assert!(decode(u32::MAX).is_err());
    }
}
