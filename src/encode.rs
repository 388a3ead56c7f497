use crate::{error::ExtractError, util::sha256_hex};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::Path;

/// An image file read and made safe to embed in a text payload.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Standard-alphabet base64, no line wrapping.
    pub data: String,
    pub sha256: String,
    pub byte_len: u64,
}

/// Reads the whole file and base64-encodes it. The bytes are not inspected;
/// anything readable is forwarded as-is.
pub fn encode_image(path: &Path) -> Result<EncodedImage, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::io(path, e))?;
    Ok(EncodedImage {
        data: encode_bytes(&bytes),
        sha256: sha256_hex(&bytes),
        byte_len: bytes.len() as u64,
    })
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// `data:` URL used as the inline image reference in the request.
pub fn data_url(mime: &str, data: &str) -> String {
    format!("data:{mime};base64,{data}")
}
