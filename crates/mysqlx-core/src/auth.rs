//! mysql_native_password primitives shared by the authentication mechanisms
//! and the credential store.

use crate::error::XError;
use rand::Rng;
use sha1::{Digest, Sha1};

pub const SALT_LEN: usize = 20;
pub const HASH_LEN: usize = 20;

pub type NativeHash = [u8; HASH_LEN];

/// Random challenge salt. Bytes are 7-bit and never NUL or `$`.
pub fn generate_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..SALT_LEN)
        .map(|_| loop {
            let b: u8 = rng.gen_range(1..=127);
            if b != b'$' {
                break b;
            }
        })
        .collect()
}

/// `SHA1(SHA1(password))`, the stored form of a native password.
pub fn native_password_hash(password: &[u8]) -> NativeHash {
    let stage1 = Sha1::digest(password);
    Sha1::digest(stage1).into()
}

/// Client side proof: `SHA1(pw) XOR SHA1(salt + SHA1(SHA1(pw)))`.
pub fn scramble_password(password: &[u8], salt: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let stage1 = Sha1::digest(password);
    let stage2 = Sha1::digest(stage1);
    let mut hasher = Sha1::new();
    hasher.update(salt);
    hasher.update(stage2);
    let mask = hasher.finalize();
    stage1.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect()
}

/// Verifies `proof` against the stored double hash.
pub fn check_scramble(proof: &[u8], salt: &[u8], stored: &NativeHash) -> bool {
    if proof.len() != HASH_LEN {
        return false;
    }
    let mut hasher = Sha1::new();
    hasher.update(salt);
    hasher.update(stored);
    let mask = hasher.finalize();
    let candidate: Vec<u8> = proof.iter().zip(mask.iter()).map(|(a, b)| a ^ b).collect();
    let recomputed: NativeHash = Sha1::digest(&candidate).into();
    recomputed == *stored
}

pub fn format_auth_string(hash: &NativeHash) -> String {
    format!("*{}", hex::encode_upper(hash))
}

/// Parses `*<40 hex digits>`.
pub fn parse_auth_string(value: &str) -> Result<NativeHash, XError> {
    let digits = value
        .strip_prefix('*')
        .ok_or_else(|| XError::BadMessage(format!("malformed authentication string: {value}")))?;
    let bytes = hex::decode(digits)
        .map_err(|e| XError::BadMessage(format!("malformed authentication string: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| XError::BadMessage("authentication string must hold 20 bytes".into()))
}

/// Decodes the `*HEX` scramble sent by MYSQL41 clients. An empty proof
/// stands for an empty password.
pub fn decode_proof(proof: &[u8]) -> Result<Vec<u8>, XError> {
    if proof.is_empty() {
        return Ok(Vec::new());
    }
    let digits = proof.strip_prefix(b"*").ok_or(XError::AccessDenied)?;
    hex::decode(digits).map_err(|_| XError::AccessDenied)
}

pub fn encode_proof(scramble: &[u8]) -> Vec<u8> {
    if scramble.is_empty() {
        return Vec::new();
    }
    format!("*{}", hex::encode_upper(scramble)).into_bytes()
}
