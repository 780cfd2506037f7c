//! Password-based envelope encryption.
//!
//! A token has five base64url (unpadded) segments joined by `.`:
//!
//! ```text
//! header . wrapped_cek . iv . ciphertext . tag
//! ```
//!
//! The header is a JSON object naming the algorithms, the Argon2id salt and
//! cost, the IV and tag of the key wrap, and a creation timestamp. A random
//! 256-bit content key (CEK) encrypts the JSON-serialized secret with
//! AES-256-GCM, authenticating the encoded header as associated data. The
//! CEK itself is encrypted with AES-256-GCM under a key derived from the
//! passphrase.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use lockbox_core::config::KdfConfig;
use lockbox_core::SecretString;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Result, SecretError};

/// Key-wrapping algorithm identifier written into every header.
pub const KEY_ALG: &str = "ARGON2ID+A256GCMKW";

/// Content-encryption algorithm identifier written into every header.
pub const CONTENT_ALG: &str = "A256GCM";

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const SALT_SIZE: usize = 16;

/// Upper bound on the iteration count accepted from a token header.
const MAX_ITERATIONS: u32 = 64;

/// Upper bound on the lane count accepted from a token header.
const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        KdfConfig::default().into()
    }
}

impl From<KdfConfig> for KdfParams {
    fn from(cfg: KdfConfig) -> Self {
        Self {
            memory_kib: cfg.memory_kib,
            iterations: cfg.iterations,
            parallelism: cfg.parallelism,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    enc: String,
    /// KDF salt.
    p2s: String,
    m: u32,
    t: u32,
    p: u32,
    /// Key-wrap IV.
    kiv: String,
    /// Key-wrap tag.
    ktag: String,
    created: String,
}

/// Metadata readable from a token without the passphrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub key_alg: String,
    pub content_alg: String,
    pub kdf: KdfParams,
    /// `None` when the header's timestamp is missing or unparseable.
    pub created: Option<DateTime<Utc>>,
}

/// Seals and opens envelope tokens.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeCodec {
    params: KdfParams,
    max_memory_kib: u32,
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::from_config(&KdfConfig::default())
    }
}

impl EnvelopeCodec {
    /// A codec that seals with `params` and opens tokens costing at most
    /// `max_memory_kib` KiB of memory.
    pub fn new(params: KdfParams, max_memory_kib: u32) -> Self {
        Self {
            params,
            max_memory_kib,
        }
    }

    pub fn from_config(cfg: &KdfConfig) -> Self {
        Self::new((*cfg).into(), cfg.max_memory_kib)
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Encrypt `plaintext` under `passphrase`.
    ///
    /// Every call draws a fresh salt, content key and IVs, so sealing the
    /// same input twice gives different tokens.
    pub fn seal(&self, plaintext: &str, passphrase: &SecretString) -> Result<String> {
        let serialized = Zeroizing::new(
            serde_json::to_vec(plaintext)
                .map_err(|e| SecretError::Crypto(format!("serialize secret: {e}")))?,
        );

        let mut rng = rand::thread_rng();
        let mut salt = [0u8; SALT_SIZE];
        rng.fill_bytes(&mut salt);
        let mut cek = Zeroizing::new([0u8; KEY_SIZE]);
        rng.fill_bytes(&mut cek[..]);
        let mut kiv = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut kiv);
        let mut iv = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut iv);

        let kek = derive_kek(passphrase, &salt, &self.params)?;
        let (wrapped_cek, ktag) = gcm_encrypt(&kek[..], &kiv, &cek[..], b"")?;

        let header = Header {
            alg: KEY_ALG.to_string(),
            enc: CONTENT_ALG.to_string(),
            p2s: URL_SAFE_NO_PAD.encode(salt),
            m: self.params.memory_kib,
            t: self.params.iterations,
            p: self.params.parallelism,
            kiv: URL_SAFE_NO_PAD.encode(kiv),
            ktag: URL_SAFE_NO_PAD.encode(ktag),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let header_json = serde_json::to_vec(&header)
            .map_err(|e| SecretError::Crypto(format!("serialize header: {e}")))?;
        let header_b64 = URL_SAFE_NO_PAD.encode(header_json);

        let (ciphertext, tag) = gcm_encrypt(&cek[..], &iv, &serialized, header_b64.as_bytes())?;

        Ok([
            header_b64,
            URL_SAFE_NO_PAD.encode(wrapped_cek),
            URL_SAFE_NO_PAD.encode(iv),
            URL_SAFE_NO_PAD.encode(ciphertext),
            URL_SAFE_NO_PAD.encode(tag),
        ]
        .join("."))
    }

    /// Decrypt and verify a token produced by [`EnvelopeCodec::seal`].
    ///
    /// A wrong passphrase and a damaged token fail the same way.
    pub fn open(&self, token: &str, passphrase: &SecretString) -> Result<SecretString> {
        let parts = split_token(token)?;
        let header = parse_header(parts[0])?;
        let params = self.checked_params(&header)?;

        let salt = decode(&header.p2s)?;
        let kiv = decode_exact(&header.kiv, NONCE_SIZE)?;
        let ktag = decode_exact(&header.ktag, TAG_SIZE)?;
        let wrapped_cek = decode_exact(parts[1], KEY_SIZE)?;
        let iv = decode_exact(parts[2], NONCE_SIZE)?;
        let ciphertext = decode(parts[3])?;
        let tag = decode_exact(parts[4], TAG_SIZE)?;

        let kek = derive_kek(passphrase, &salt, &params)?;
        let cek = Zeroizing::new(gcm_decrypt(&kek[..], &kiv, &wrapped_cek, &ktag, b"")?);
        let serialized = Zeroizing::new(gcm_decrypt(
            &cek[..],
            &iv,
            &ciphertext,
            &tag,
            parts[0].as_bytes(),
        )?);

        serde_json::from_slice::<String>(&serialized)
            .map(SecretString::new)
            .map_err(|_| decrypt_failure())
    }

    fn checked_params(&self, header: &Header) -> Result<KdfParams> {
        if header.alg != KEY_ALG || header.enc != CONTENT_ALG {
            return Err(SecretError::Crypto(format!(
                "unsupported algorithms: {}/{}",
                header.alg, header.enc
            )));
        }
        if header.m > self.max_memory_kib
            || header.t > MAX_ITERATIONS
            || header.p > MAX_PARALLELISM
        {
            return Err(SecretError::Crypto(format!(
                "key derivation cost exceeds limits (m={}, t={}, p={})",
                header.m, header.t, header.p
            )));
        }
        Ok(KdfParams {
            memory_kib: header.m,
            iterations: header.t,
            parallelism: header.p,
        })
    }
}

/// Read a token's header without decrypting anything.
pub fn inspect(token: &str) -> Result<EnvelopeInfo> {
    let parts = split_token(token)?;
    let header = parse_header(parts[0])?;
    Ok(EnvelopeInfo {
        key_alg: header.alg,
        content_alg: header.enc,
        kdf: KdfParams {
            memory_kib: header.m,
            iterations: header.t,
            parallelism: header.p,
        },
        created: DateTime::parse_from_rfc3339(&header.created)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

fn decrypt_failure() -> SecretError {
    SecretError::Crypto("wrong passphrase or corrupted data".to_string())
}

fn malformed(what: &str) -> SecretError {
    SecretError::Crypto(format!("malformed token: {what}"))
}

fn split_token(token: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 5 {
        return Err(malformed("expected 5 segments"));
    }
    Ok(parts)
}

fn parse_header(segment: &str) -> Result<Header> {
    let bytes = decode(segment)?;
    serde_json::from_slice(&bytes).map_err(|_| malformed("header"))
}

fn decode(segment: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| malformed("invalid base64"))
}

fn decode_exact(segment: &str, len: usize) -> Result<Vec<u8>> {
    let bytes = decode(segment)?;
    if bytes.len() != len {
        return Err(malformed("unexpected segment length"));
    }
    Ok(bytes)
}

fn derive_kek(
    passphrase: &SecretString,
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| SecretError::Crypto(format!("argon2 params: {e}")))?;

    let mut kek = Zeroizing::new([0u8; KEY_SIZE]);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(passphrase.as_bytes(), salt, &mut kek[..])
        .map_err(|e| SecretError::Crypto(format!("key derivation: {e}")))?;
    Ok(kek)
}

/// Returns `(ciphertext, tag)`.
fn gcm_encrypt(
    key: &[u8],
    iv: &[u8],
    msg: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SecretError::Crypto(format!("cipher init: {e}")))?;
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(iv), Payload { msg, aad })
        .map_err(|e| SecretError::Crypto(format!("encrypt: {e}")))?;
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);
    Ok((sealed, tag))
}

fn gcm_decrypt(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| decrypt_failure())?;
    let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);
    cipher
        .decrypt(Nonce::from_slice(iv), Payload { msg: &sealed, aad })
        .map_err(|_| decrypt_failure())
}
