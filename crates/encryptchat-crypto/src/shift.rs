const ALPHABET_LEN: i64 = 26;

/// Normalize a shift into the forward rotation offset, always in `0..26`.
pub fn forward_offset(shift: i64) -> u8 {
    shift.rem_euclid(ALPHABET_LEN) as u8
}

/// The additive inverse of [`forward_offset`], also in `0..26`.
pub fn inverse_offset(shift: i64) -> u8 {
    ((ALPHABET_LEN - shift.rem_euclid(ALPHABET_LEN)) % ALPHABET_LEN) as u8
}

/// Rotate a single ASCII letter forward by `offset` positions within its own
/// case. Anything that is not an ASCII letter is returned unchanged.
pub fn rotate(c: char, offset: u8) -> char {
    let base = match c {
        'A'..='Z' => b'A',
        'a'..='z' => b'a',
        _ => return c,
    };
    let pos = (c as u8 - base + offset % 26) % 26;
    (base + pos) as char
}

fn rotate_all(text: &str, offset: u8) -> String {
    if offset == 0 {
        return text.to_owned();
    }
    text.chars().map(|c| rotate(c, offset)).collect()
}

/// Encode message text before it is handed to storage.
pub fn encode(text: &str, shift: i64) -> String {
    rotate_all(text, forward_offset(shift))
}

/// Decode stored message text for display. Exactly undoes [`encode`] with the
/// same `shift`.
pub fn decode(text: &str, shift: i64) -> String {
    rotate_all(text, inverse_offset(shift))
}
