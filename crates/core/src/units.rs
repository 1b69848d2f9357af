/// Format a byte count with SI units (base 1000), e.g. `1.1 TB` or `12 MB`.
///
/// Negative values are sentinels and are printed as-is.
pub fn humanize_bytes(bytes: i64) -> String {
    const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 0 {
        return bytes.to_string();
    }
    if bytes < 10 {
        return format!("{} B", bytes);
    }

    let mut exponent = 0usize;
    let mut scaled = bytes;
    while scaled >= 1000 && exponent < UNITS.len() - 1 {
        scaled /= 1000;
        exponent += 1;
    }

    let value = bytes as f64 / 1000f64.powi(exponent as i32);
    let rounded = (value * 10.0 + 0.5).floor() / 10.0;
    if rounded < 10.0 {
        format!("{:.1} {}", rounded, UNITS[exponent])
    } else {
        format!("{:.0} {}", rounded, UNITS[exponent])
    }
}
