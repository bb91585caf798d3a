//! Invite code generation.

/// Length of generated invite codes.
pub const INVITE_CODE_LEN: usize = 6;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of the alphabet size that fits in a byte; bytes at or
/// above it are discarded so every symbol is equally likely.
const REJECTION_LIMIT: u8 = 252;

/// Generate a random invite code of uppercase letters and digits.
///
/// Uniqueness is not checked here; callers retry on collision.
pub fn generate() -> String {
    let mut code = String::with_capacity(INVITE_CODE_LEN);
    while code.len() < INVITE_CODE_LEN {
        let random_bytes: [u8; 32] = rand::random();
        for b in random_bytes {
            if b >= REJECTION_LIMIT {
                continue;
            }
            code.push(ALPHABET[(b % 36) as usize] as char);
            if code.len() == INVITE_CODE_LEN {
                break;
            }
        }
    }
    code
}

/// Whether `code` has the shape of a generated invite code.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == INVITE_CODE_LEN
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
