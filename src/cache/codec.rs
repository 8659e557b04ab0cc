use std::io::{Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

use crate::error::CacheError;

/// Compresses a string payload for storage.
pub fn compress(text: &str) -> Result<Vec<u8>, CacheError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Reverses [`compress`].
pub fn decompress(bytes: &[u8]) -> Result<String, CacheError> {
    let mut out = Vec::new();
    ZlibDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(String::from_utf8(out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repetitive_payloads_shrink() {
        let text = r#"{"time":"2024-01-01","conceptUuid":"a"},"#.repeat(200);
        let packed = compress(&text).unwrap();
        assert!(packed.len() < text.len() / 4);
        assert_eq!(decompress(&packed).unwrap(), text);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decompress(b"definitely not zlib").is_err());
    }
}
