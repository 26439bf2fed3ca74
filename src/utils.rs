use itertools::Itertools;

/// Lowercase hex, wrapped at 32 bytes per line.
pub fn hex_encode(data: &[u8]) -> String {
    data.chunks(32)
        .map(|line| line.iter().map(|b| format!("{:02x}", b)).join(""))
        .join("\n")
}

/// Inverse of [`hex_encode`]. Whitespace anywhere is ignored.
pub fn hex_decode(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}
