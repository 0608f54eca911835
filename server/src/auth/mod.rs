pub mod expiring;
pub mod password;
pub mod session;

use rand::RngCore;

pub use session::{CurrentMember, OptionalMember, SESSION_COOKIE};

const TOKEN_BYTES: usize = 32;

/// 32 random bytes, hex encoded: URL and cookie safe.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
