//! Human-readable byte sizes.

const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];
const FACTOR: u64 = 1024;

/// Formats a byte count for display, e.g. `1536` becomes `"1.5 kB"`.
///
/// The unit is the largest power of 1024 not exceeding `bytes`, saturating
/// at `GB`: a 5 TiB count renders as `"5120.0 GB"`.
///
/// # Example
///
/// ```rust
/// use metaprobe_core::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 B");
/// assert_eq!(format_bytes(1_048_576), "1.0 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut index = 0;
    let mut divisor = 1u64;
    while index < UNITS.len() - 1 && bytes / divisor >= FACTOR {
        divisor *= FACTOR;
        index += 1;
    }

    format!("{:.1} {}", bytes as f64 / divisor as f64, UNITS[index])
}
