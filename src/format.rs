//! Display formatting shared by every size-displaying surface.

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count with base-1024 units and one decimal place.
///
/// Zero is rendered as `"0 B"`. Sizes past the gigabyte range stay in GB.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut index = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    format!("{:.1} {}", value, UNITS[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_size(0), "0 B");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_size(1), "1.0 B");
        assert_eq!(format_size(1023), "1023.0 B");
    }

    #[test]
    fn test_format_kilobytes() {
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_size(1_048_576), "1.0 MB");
        assert_eq!(format_size(10 * 1024 * 1024 + 512 * 1024), "10.5 MB");
    }

    #[test]
    fn test_format_gigabytes_is_the_last_unit() {
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024), "2048.0 GB");
    }
}
