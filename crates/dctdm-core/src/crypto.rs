//! §4.K: the password layer. Derives a key with PBKDF2-HMAC-SHA256 and
//! authenticates-and-encrypts the payload with ChaCha20-Poly1305.
//!
//! The serialized form spec.md §4.K asks for is `salt(16) || ciphertext+tag`
//! with no separate nonce field. ChaCha20-Poly1305 needs a 12-byte nonce, so
//! rather than widen the wire format we derive it from the already-derived
//! key via HMAC-SHA256, keyed on a fixed context string. Because the salt is
//! fresh random on every encrypt call, the key (and therefore the nonce) is
//! fresh too, so this doesn't reintroduce nonce reuse.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{DctdmError, Result};

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const PBKDF2_ROUNDS: u32 = 100_000;

/// Encrypt `plaintext` with `password`, returning the base64 (URL-safe,
/// padded) text that replaces the plaintext in the payload framing (§3,
/// §4.I).
pub fn encrypt_payload(plaintext: &str, password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut key = derive_key(password, &salt)?;
    let nonce_bytes = derive_nonce(&key);
    let cipher = ChaCha20Poly1305::new(&key.into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|_| DctdmError::DecryptionFailed)?;
    key.zeroize();

    let mut bundle = Vec::with_capacity(SALT_LEN + ciphertext.len());
    bundle.extend_from_slice(&salt);
    bundle.extend_from_slice(&ciphertext);
    log::debug!(
        "encrypted payload: {} plaintext bytes -> {} bundled bytes",
        plaintext.len(),
        bundle.len()
    );
    Ok(URL_SAFE.encode(bundle))
}

/// Inverse of [`encrypt_payload`]: recover the plaintext, or
/// [`DctdmError::DecryptionFailed`] for a wrong password or tampered data.
pub fn decrypt_payload(encoded: &str, password: &str) -> Result<String> {
    let bundle = URL_SAFE
        .decode(encoded)
        .map_err(|_| DctdmError::DecryptionFailed)?;
    if bundle.len() < SALT_LEN {
        return Err(DctdmError::DecryptionFailed);
    }
    let (salt, ciphertext) = bundle.split_at(SALT_LEN);

    let mut key = derive_key(password, salt)?;
    let nonce_bytes = derive_nonce(&key);
    let cipher = ChaCha20Poly1305::new(&key.into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext)
        .map_err(|_| DctdmError::DecryptionFailed)?;
    key.zeroize();

    String::from_utf8(plaintext).map_err(|_| DctdmError::DecryptionFailed)
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key)
        .map_err(|_| DctdmError::DecryptionFailed)?;
    Ok(key)
}

fn derive_nonce(key: &[u8; KEY_LEN]) -> [u8; NONCE_LEN] {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC-SHA256 accepts any key length");
    mac.update(b"dctdm-nonce-v1");
    let full = mac.finalize().into_bytes();
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&full[..NONCE_LEN]);
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_correct_password() {
        let encrypted = encrypt_payload("the quick brown fox", "hunter2").unwrap();
        let plaintext = decrypt_payload(&encrypted, "hunter2").unwrap();
        assert_eq!(plaintext, "the quick brown fox");
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let encrypted = encrypt_payload("secret", "correct horse").unwrap();
        let err = decrypt_payload(&encrypted, "wrong password").unwrap_err();
        assert!(matches!(err, DctdmError::DecryptionFailed));
    }

    #[test]
    fn two_encryptions_of_the_same_plaintext_differ() {
        // Fresh random salt each call means distinct ciphertext bundles.
        let a = encrypt_payload("hello", "pw").unwrap();
        let b = encrypt_payload("hello", "pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let encrypted = encrypt_payload("hello", "pw").unwrap();
        let mut bundle = URL_SAFE.decode(&encrypted).unwrap();
        let last = bundle.len() - 1;
        bundle[last] ^= 0xFF;
        let tampered = URL_SAFE.encode(bundle);
        assert!(decrypt_payload(&tampered, "pw").is_err());
    }
}
