//! Token cipher.
//!
//! AES-128-CBC with PKCS#7 padding. The key is derived once with
//! PBKDF2-HMAC-SHA1 from a passphrase and salt; the IV is fixed. These
//! parameters are dictated by the existing token producers and must not
//! change.
//!
//! # Security
//! - Key material is injected from configuration, never embedded
//! - Keys are never logged or serialized
//! - No state beyond the derived key: safe to share across tasks

use aes::Aes128;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

use crate::config::AuthConfig;

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// Derived key length (AES-128).
pub const KEY_LEN: usize = 16;
/// Initialization vector length (one AES block).
pub const IV_LEN: usize = 16;

/// Errors produced by the token cipher.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Cipher text is empty")]
    Empty,

    #[error("Cipher text is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Cipher text length {0} is not a multiple of the block size")]
    BlockLength(usize),

    #[error("Padding validation failed")]
    Padding,

    #[error("Plain text is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid key material: {0}")]
    KeyMaterial(String),
}

/// Key material for [`TokenCipher`].
#[derive(Clone)]
pub struct TokenSecrets {
    pub passphrase: String,
    pub salt: String,
    pub iterations: u32,
    pub init_vector: String,
}

impl std::fmt::Debug for TokenSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSecrets")
            .field("passphrase", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("iterations", &self.iterations)
            .field("init_vector", &"<redacted>")
            .finish()
    }
}

impl From<&AuthConfig> for TokenSecrets {
    fn from(config: &AuthConfig) -> Self {
        Self {
            passphrase: config.passphrase.clone(),
            salt: config.salt.clone(),
            iterations: config.iterations,
            init_vector: config.init_vector.clone(),
        }
    }
}

/// Symmetric cipher for `lp-auth-token` values.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl TokenCipher {
    /// Derive the key and fix the IV.
    pub fn new(secrets: &TokenSecrets) -> Result<Self, CryptoError> {
        if secrets.iterations == 0 {
            return Err(CryptoError::KeyMaterial("iteration count must be at least 1".into()));
        }
        let iv: [u8; IV_LEN] = secrets.init_vector.as_bytes().try_into().map_err(|_| {
            CryptoError::KeyMaterial(format!(
                "initialization vector must be {} bytes, got {}",
                IV_LEN,
                secrets.init_vector.len()
            ))
        })?;

        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<sha1::Sha1>(
            secrets.passphrase.as_bytes(),
            secrets.salt.as_bytes(),
            secrets.iterations,
            &mut key,
        );

        Ok(Self { key, iv })
    }

    /// Decrypt a base64 token into its UTF-8 plain text.
    pub fn decrypt(&self, cipher_text: &str) -> Result<String, CryptoError> {
        let cipher_text = cipher_text.trim();
        if cipher_text.is_empty() {
            return Err(CryptoError::Empty);
        }

        let bytes = STANDARD.decode(cipher_text)?;
        if bytes.is_empty() || bytes.len() % IV_LEN != 0 {
            return Err(CryptoError::BlockLength(bytes.len()));
        }

        let plain = Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .map_err(|_| CryptoError::Padding)?;

        Ok(String::from_utf8(plain)?)
    }

    /// Encrypt plain text into a base64 token, the inverse of [`decrypt`].
    ///
    /// [`decrypt`]: TokenCipher::decrypt
    pub fn encrypt(&self, plain_text: &str) -> String {
        let bytes = Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plain_text.as_bytes());
        STANDARD.encode(bytes)
    }
}
