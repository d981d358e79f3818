use rand::Rng;

/// Code alphabet with visually ambiguous characters (0, O, 1, I) excluded
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Default session code length
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Draw one fixed-length code from the restricted alphabet
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length).map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char).collect()
}
