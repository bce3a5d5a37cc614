//! Client address redaction.
//!
//! Addresses are masked before they reach any log line or limiter key.

/// Placeholder substituted for the first two octets.
const MASKED_PREFIX: &str = "xxx.xxx";

/// Returned for anything that is not four dot-separated segments.
pub const MASK_FALLBACK: &str = "xxx.xxx.x.x";

/// Mask an address, keeping only its last two octets.
///
/// Total over all strings: malformed input degrades to [`MASK_FALLBACK`].
pub fn mask_ip(ip: &str) -> String {
    let parts: Vec<&str> = ip.split('.').collect();
    match parts.as_slice() {
        [_, _, third, fourth] => format!("{}.{}.{}", MASKED_PREFIX, third, fourth),
        _ => MASK_FALLBACK.to_string(),
    }
}
