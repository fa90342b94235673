//! Base64 encoder / decoder

use data_encoding::{BASE64, BASE64URL, BASE64URL_NOPAD, BASE64_NOPAD};

use super::{ToolError, ToolResult};

/// Encode UTF-8 text as padded Base64
pub fn encode(text: &str, url_safe: bool) -> String {
    if url_safe {
        BASE64URL.encode(text.as_bytes())
    } else {
        BASE64.encode(text.as_bytes())
    }
}

/// Decode Base64 into UTF-8 text.
///
/// Whitespace anywhere in the input is ignored and padding is optional.
pub fn decode(text: &str, url_safe: bool) -> ToolResult<String> {
    let bytes = decode_bytes(text, url_safe)?;
    String::from_utf8(bytes).map_err(|_| ToolError::InvalidUtf8)
}

/// Decode Base64 into raw bytes
pub fn decode_bytes(text: &str, url_safe: bool) -> ToolResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let unpadded = compact.trim_end_matches('=');

    let engine = if url_safe { &BASE64URL_NOPAD } else { &BASE64_NOPAD };
    engine
        .decode(unpadded.as_bytes())
        .map_err(|e| ToolError::InvalidBase64(e.to_string()))
}
