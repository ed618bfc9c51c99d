/// Accepts exactly `#RRGGBB`, the only color format the projects table stores.
pub fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_seven_char_hex_colors() {
        assert!(is_hex_color("#007BFF"));
        assert!(is_hex_color("#ff5733"));
        assert!(is_hex_color("#000000"));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(!is_hex_color(""));
        assert!(!is_hex_color("007BFF"));
        assert!(!is_hex_color("#07BFF"));
        assert!(!is_hex_color("#007BFF0"));
        assert!(!is_hex_color("#00GBFF"));
        assert!(!is_hex_color("blue"));
    }
}
