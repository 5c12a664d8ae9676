//! Small utility helpers used across modules.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge provider payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

/// Decode base64 image data, with or without a `data:<mime>;base64,` prefix.
pub fn decode_image_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
  let raw = input.trim();
  let payload = match raw.strip_prefix("data:") {
    Some(rest) => rest.split_once(";base64,").map(|(_, b)| b).unwrap_or(rest),
    None => raw,
  };
  STANDARD.decode(payload)
}
