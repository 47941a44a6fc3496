//! Lobby code generation
//!
//! Codes are short, human-shareable, and case-insensitive: a fixed `GW`
//! prefix plus four characters from an alphabet with the ambiguous ones
//! (I, O, 0, 1) removed.

use rand::Rng;

use crate::error::StoreError;
use crate::lobby::model::Lobby;
use crate::store::SessionStore;

/// Characters eligible for the random part of a code
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fixed prefix of every generated code
pub const CODE_PREFIX: &str = "GW";

/// Length of the random suffix
pub const CODE_SUFFIX_LEN: usize = 4;

/// Attempts before giving up on finding an unused code
const MAX_CODE_ATTEMPTS: usize = 10;

/// Generate a fresh (not necessarily unused) lobby code
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let mut code = String::with_capacity(CODE_PREFIX.len() + CODE_SUFFIX_LEN);
    code.push_str(CODE_PREFIX);
    for _ in 0..CODE_SUFFIX_LEN {
        let idx = rng.gen_range(0..CODE_ALPHABET.len());
        code.push(CODE_ALPHABET[idx] as char);
    }
    code
}

/// Canonical form used for storage keys and lookups
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Create a lobby under a freshly generated unique code
///
/// `make` builds the lobby for a candidate code; on a collision a new code is
/// generated, up to a bounded number of attempts before `CodeExhaustion`.
pub async fn create_with_unique_code<F>(
    store: &dyn SessionStore,
    mut make: F,
) -> Result<Lobby, StoreError>
where
    F: FnMut(String) -> Lobby,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_code();
        let lobby = make(code);
        match store.create(lobby.clone()).await {
            Ok(()) => return Ok(lobby),
            Err(StoreError::DuplicateCode(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(StoreError::CodeExhaustion)
}
