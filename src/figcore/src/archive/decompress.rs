use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::error::FigError;

pub fn inflate(bytes: &[u8]) -> Result<Vec<u8>, FigError> {
    let mut decoder = DeflateDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FigError::Corrupt { offset: 0, reason: format!("deflate: {e}") })?;
    Ok(out)
}
