const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count using the largest 1024-based unit not exceeding it (capped at GB).
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut idx = 0;
    let mut threshold: u64 = 1024;
    while idx + 1 < UNITS.len() && bytes >= threshold {
        idx += 1;
        threshold = threshold.saturating_mul(1024);
    }
    let scaled = bytes as f64 / 1024f64.powi(idx as i32);
    format!("{:.2} {}", scaled, UNITS[idx])
}
