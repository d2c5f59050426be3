//! Record digest computation.

use recordgate_core::{Digest, UserKey, DIGEST_LEN};
use sha2::{Digest as _, Sha256};

// Particle type codes folded into the hash so that equal bytes under
// different key types never collide.
const PARTICLE_INTEGER: u8 = 1;
const PARTICLE_STRING: u8 = 3;
const PARTICLE_BLOB: u8 = 4;

/// Compute the digest that identifies `user_key` within `set`.
///
/// The null set and a set named `""` are different sets. A
/// `UserKey::Digest` is returned unchanged.
pub fn compute_digest(set: Option<&str>, user_key: &UserKey) -> Digest {
    let (particle, bytes): (u8, Vec<u8>) = match user_key {
        UserKey::Digest(d) => return *d,
        UserKey::String(s) => (PARTICLE_STRING, s.as_bytes().to_vec()),
        UserKey::Integer(i) => (PARTICLE_INTEGER, i.to_be_bytes().to_vec()),
        UserKey::Bytes(b) => (PARTICLE_BLOB, b.clone()),
    };

    let mut hasher = Sha256::new();
    match set {
        None => hasher.update([0u8]),
        Some(name) => {
            hasher.update([1u8]);
            hasher.update((name.len() as u64).to_be_bytes());
            hasher.update(name.as_bytes());
        }
    }
    hasher.update([particle]);
    hasher.update(&bytes);
    let full = hasher.finalize();

    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&full[..DIGEST_LEN]);
    Digest::new(out)
}
