//! Small utility helpers used across modules.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Largest integer a JSON client can hold exactly in a double (2^53).
pub const MAX_SAFE_ID: u64 = 1 << 53;

/// Fresh token id: wall-clock milliseconds times 1000, plus a random value below 1000.
/// Stays under `MAX_SAFE_ID` until the year 2255.
/// Unique enough to tell tokens apart inside one sequence; never used for ordering.
pub fn fresh_token_id() -> u64 {
  let millis = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as u64)
    .unwrap_or(0);
  (millis * 1000 + rand::thread_rng().gen_range(0..1000)) % MAX_SAFE_ID
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge content blobs.
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
