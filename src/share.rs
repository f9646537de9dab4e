//! Share links: the schema text travels base64 encoded in a `diagram`
//! query parameter, so a link opens the same diagram with no server.

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;

pub const PARAM: &str = "diagram";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("link has no diagram parameter")]
    MissingParameter,

    #[error("malformed percent escape in diagram parameter")]
    BadEscape,

    #[error("diagram parameter is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("shared diagram is not UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// `<origin>?diagram=<base64 of text>`, with the base64 percent-escaped.
pub fn encode_link(origin: &str, text: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(text);
    let mut link = format!("{}?{}=", origin, PARAM);
    for c in encoded.chars() {
        match c {
            '+' => link.push_str("%2B"),
            '/' => link.push_str("%2F"),
            '=' => link.push_str("%3D"),
            c => link.push(c),
        }
    }
    link
}

/// An iframe snippet showing the linked diagram read-only.
pub fn embed_code(link: &str) -> String {
    format!(
        "<iframe\n  src=\"{}&embed=true\"\n  width=\"100%\"\n  height=\"500\"\n  frameborder=\"0\"\n  style=\"border-radius: 8px; border: 1px solid #333;\">\n</iframe>",
        link
    )
}

/// Recover the schema text from a share link. Unpadded url-safe base64 is
/// accepted as well as the standard alphabet.
pub fn decode_link(url: &str) -> Result<String, ShareError> {
    let query = url
        .split('#')
        .next()
        .and_then(|url| url.split_once('?'))
        .map(|(_, query)| query)
        .ok_or(ShareError::MissingParameter)?;

    let value = query
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == PARAM).then_some(value)
        })
        .ok_or(ShareError::MissingParameter)?;

    let raw = percent_decode(value)?;
    let bytes = match general_purpose::STANDARD.decode(&raw) {
        Ok(bytes) => bytes,
        Err(err) => general_purpose::URL_SAFE_NO_PAD
            .decode(&raw)
            .map_err(|_| err)?,
    };
    Ok(String::from_utf8(bytes)?)
}

fn percent_decode(value: &str) -> Result<Vec<u8>, ShareError> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = value.get(i + 1..i + 3).ok_or(ShareError::BadEscape)?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| ShareError::BadEscape)?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}
