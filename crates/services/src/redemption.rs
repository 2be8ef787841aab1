use rand::Rng;

pub const CODE_PREFIX: &str = "DEAL-";
pub const CODE_LENGTH: usize = 9;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `DEAL-` followed by nine upper-case base-36 characters. Uniqueness is
/// checked by the caller against the claim ledger.
pub fn generate_redemption_code() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{suffix}")
}

pub fn is_redemption_code(code: &str) -> bool {
    code.strip_prefix(CODE_PREFIX).is_some_and(|suffix| {
        suffix.len() == CODE_LENGTH
            && suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    })
}
