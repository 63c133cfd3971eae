//! Key-pair material generation
//!
//! Providers without native key-pair support keep the private key in the
//! metadata store and re-derive the public half whenever it is read.

use crate::error::{CloudError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

pub const DEFAULT_KEY_BITS: usize = 2048;

/// Freshly generated key pair
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    /// PKCS#1 PEM
    pub private_key: String,
    /// OpenSSH `ssh-rsa` line
    pub public_key: String,
}

pub trait KeyMaterialGenerator: Send + Sync {
    fn generate(&self) -> Result<KeyMaterial>;

    /// Rebuild the OpenSSH public key from a stored private key
    fn public_key_from_private(&self, private_key: &str) -> Result<String>;
}

/// RSA generator backed by the OS random source
#[derive(Debug, Clone)]
pub struct RsaKeyGenerator {
    bits: usize,
}

impl RsaKeyGenerator {
    pub fn new() -> Self {
        Self {
            bits: DEFAULT_KEY_BITS,
        }
    }

    pub fn with_bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }
}

impl Default for RsaKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMaterialGenerator for RsaKeyGenerator {
    fn generate(&self) -> Result<KeyMaterial> {
        let mut rng = rand::rngs::OsRng;
        let private = RsaPrivateKey::new(&mut rng, self.bits)
            .map_err(|e| CloudError::UpstreamError(format!("RSA key generation failed: {}", e)))?;
        let pem = private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| CloudError::UpstreamError(format!("PEM encoding failed: {}", e)))?;

        Ok(KeyMaterial {
            private_key: pem.to_string(),
            public_key: openssh_public_key(&RsaPublicKey::from(&private)),
        })
    }

    fn public_key_from_private(&self, private_key: &str) -> Result<String> {
        let private = RsaPrivateKey::from_pkcs1_pem(private_key).map_err(|e| {
            CloudError::InvalidArgument(format!("stored private key is not PKCS#1 PEM: {}", e))
        })?;
        Ok(openssh_public_key(&RsaPublicKey::from(&private)))
    }
}

fn put_string(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
    buf.extend_from_slice(data);
}

// SSH mpint: big-endian, with a leading zero when the high bit is set
fn put_mpint(buf: &mut Vec<u8>, magnitude: &[u8]) {
    if magnitude.first().is_some_and(|b| b & 0x80 != 0) {
        let mut padded = Vec::with_capacity(magnitude.len() + 1);
        padded.push(0);
        padded.extend_from_slice(magnitude);
        put_string(buf, &padded);
    } else {
        put_string(buf, magnitude);
    }
}

fn public_key_blob(key: &RsaPublicKey) -> Vec<u8> {
    let mut blob = Vec::new();
    put_string(&mut blob, b"ssh-rsa");
    put_mpint(&mut blob, &key.e().to_bytes_be());
    put_mpint(&mut blob, &key.n().to_bytes_be());
    blob
}

fn openssh_public_key(key: &RsaPublicKey) -> String {
    format!("ssh-rsa {}", STANDARD.encode(public_key_blob(key)))
}

/// Colon-separated MD5 fingerprint of an OpenSSH public key line
pub fn fingerprint(public_key: &str) -> Result<String> {
    let encoded = public_key
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| CloudError::InvalidArgument("malformed OpenSSH public key".into()))?;
    let blob = STANDARD
        .decode(encoded)
        .map_err(|e| CloudError::InvalidArgument(format!("malformed OpenSSH public key: {}", e)))?;

    Ok(Md5::digest(&blob)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":"))
}
