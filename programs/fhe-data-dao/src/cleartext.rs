//! Borsh shapes of the cleartexts the oracle hands back.
//!
//! Decoding is all-or-nothing: trailing bytes or a short buffer fail with
//! `MalformedCleartext` and nothing is applied.

use anchor_lang::prelude::*;

use crate::error::DaoError;

/// Revealed phishing sample.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct SamplePlaintext {
    pub url: String,
    pub headers: String,
}

pub fn decode<T: AnchorDeserialize>(cleartext: &[u8]) -> Result<T> {
    T::try_from_slice(cleartext).map_err(|_| error!(DaoError::MalformedCleartext))
}

pub fn encode<T: AnchorSerialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    value
        .serialize(&mut buf)
        .map_err(|_| error!(DaoError::MalformedCleartext))?;
    Ok(buf)
}

pub fn decode_sample(cleartext: &[u8]) -> Result<SamplePlaintext> {
    decode(cleartext)
}

/// Aggregate model weight.
pub fn decode_weight(cleartext: &[u8]) -> Result<u64> {
    decode(cleartext)
}

/// Locator of an analysis result.
pub fn decode_analysis(cleartext: &[u8]) -> Result<String> {
    let locator: String = decode(cleartext)?;
    require!(!locator.is_empty(), DaoError::MalformedCleartext);
    Ok(locator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::assert_dao_err;

    #[test]
    fn test_sample_decodes_pair_of_strings() {
        let bytes = encode(&SamplePlaintext {
            url: "http://evil.test".to_string(),
            headers: "From: a@b".to_string(),
        })
        .unwrap();

        let sample = decode_sample(&bytes).unwrap();
        assert_eq!(sample.url, "http://evil.test");
        assert_eq!(sample.headers, "From: a@b");
    }

    #[test]
    fn test_weight_rejects_trailing_bytes() {
        let mut bytes = encode(&42u64).unwrap();
        assert_eq!(decode_weight(&bytes).unwrap(), 42);

        bytes.push(0);
        assert_dao_err(decode_weight(&bytes), DaoError::MalformedCleartext);
    }

    #[test]
    fn test_sample_rejects_single_string() {
        let bytes = encode(&"http://evil.test".to_string()).unwrap();
        assert_dao_err(decode_sample(&bytes), DaoError::MalformedCleartext);
    }

    #[test]
    fn test_weight_rejects_short_buffer() {
        assert_dao_err(decode_weight(&[1, 2, 3]), DaoError::MalformedCleartext);
    }

    #[test]
    fn test_analysis_rejects_empty_locator() {
        let bytes = encode(&String::new()).unwrap();
        assert_dao_err(decode_analysis(&bytes), DaoError::MalformedCleartext);
    }
}
