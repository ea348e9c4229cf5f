//! Provider credentials and the at-rest encryption vault.
//!
//! Credentials are a closed sum type (one shape per carrier), serialized
//! to JSON and encrypted with AES-256-CBC. The key is derived from the
//! process-level vault secret with PBKDF2-HMAC-SHA256 and a random
//! per-blob salt. Blob layout: `base64(salt || iv || ciphertext)`.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use pbkdf2::pbkdf2_hmac_array;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::ProviderError;
use super::code::ProviderCode;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the key-derivation salt.
const SALT_SIZE: usize = 16;
/// AES block / IV size.
const IV_SIZE: usize = 16;
/// PBKDF2 iterations.
const PBKDF2_ITERATIONS: u32 = 100_000;
/// Derived key size (AES-256).
const KEY_SIZE: usize = 32;

/// Carrier credentials, one shape per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderCreds {
    /// GHTK API token.
    Ghtk {
        /// The partner API token.
        api_token: String,
    },
    /// GHN token plus shop code.
    Ghn {
        /// The partner API token.
        token: String,
        /// GHN-side shop identifier.
        shop_code: String,
    },
    /// Viettel Post account.
    ViettelPost {
        /// Account user name.
        username: String,
        /// Account password.
        password: String,
    },
    /// The in-house fleet needs no credentials.
    InHouse,
}

impl ProviderCreds {
    /// Which carrier these credentials belong to.
    #[must_use]
    pub const fn code(&self) -> ProviderCode {
        match self {
            Self::Ghtk { .. } => ProviderCode::Ghtk,
            Self::Ghn { .. } => ProviderCode::Ghn,
            Self::ViettelPost { .. } => ProviderCode::ViettelPost,
            Self::InHouse => ProviderCode::InHouse,
        }
    }
}

/// Encrypts and decrypts credential blobs with a process-level secret.
#[derive(Clone)]
pub struct CredentialVault {
    secret: String,
}

impl CredentialVault {
    /// Create a vault from the process-level secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Encrypt credentials into a storable blob.
    ///
    /// # Errors
    ///
    /// Returns `InitFailed` if serialization fails.
    pub fn encrypt(&self, creds: &ProviderCreds) -> Result<String, ProviderError> {
        let plaintext = serde_json::to_vec(creds).map_err(|e| ProviderError::InitFailed {
            code: creds.code(),
            message: format!("credential serialization failed: {e}"),
        })?;

        let mut salt = [0u8; SALT_SIZE];
        let mut iv = [0u8; IV_SIZE];
        rand::rng().fill_bytes(&mut salt);
        rand::rng().fill_bytes(&mut iv);

        let key = self.derive_key(&salt);
        let ciphertext =
            Aes256CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(&plaintext);

        let mut blob = Vec::with_capacity(SALT_SIZE + IV_SIZE + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    /// Decrypt a blob back into credentials.
    ///
    /// # Errors
    ///
    /// Returns `InitFailed` on a malformed blob, wrong secret, or a
    /// credential shape that no longer parses.
    pub fn decrypt(&self, code: ProviderCode, blob: &str) -> Result<ProviderCreds, ProviderError> {
        let init_err = |message: String| ProviderError::InitFailed { code, message };

        let raw = BASE64
            .decode(blob)
            .map_err(|e| init_err(format!("credential blob is not base64: {e}")))?;
        if raw.len() < SALT_SIZE + IV_SIZE {
            return Err(init_err("credential blob too short".to_string()));
        }

        let (salt, rest) = raw.split_at(SALT_SIZE);
        let (iv, ciphertext) = rest.split_at(IV_SIZE);

        let mut salt_arr = [0u8; SALT_SIZE];
        salt_arr.copy_from_slice(salt);
        let mut iv_arr = [0u8; IV_SIZE];
        iv_arr.copy_from_slice(iv);

        let key = self.derive_key(&salt_arr);
        let plaintext = Aes256CbcDec::new(&key.into(), &iv_arr.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| init_err("credential decryption failed".to_string()))?;

        let creds: ProviderCreds = serde_json::from_slice(&plaintext)
            .map_err(|e| init_err(format!("credential shape no longer parses: {e}")))?;

        if creds.code() != code {
            return Err(init_err(format!(
                "credential blob belongs to {}, expected {code}",
                creds.code()
            )));
        }
        Ok(creds)
    }

    fn derive_key(&self, salt: &[u8; SALT_SIZE]) -> [u8; KEY_SIZE] {
        pbkdf2_hmac_array::<Sha256, KEY_SIZE>(self.secret.as_bytes(), salt, PBKDF2_ITERATIONS)
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
