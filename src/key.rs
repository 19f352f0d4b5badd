use std::fmt;

use const_oid::AssociatedOid;
use der::pem::PemLabel;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, EncryptedPrivateKeyInfo, LineEnding, PrivateKeyInfo};
use rand_core::{OsRng, RngCore};
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::config::Digest;
use crate::error::{CertToolError, Result};

/// Public exponent used for every generated key.
pub const RSA_PUBLIC_EXPONENT: u64 = 65537;

/// Smallest modulus the generator will produce.
pub const MIN_RSA_BITS: usize = 1024;

/// PBKDF2-HMAC-SHA256 iteration count for encrypted private keys.
pub const KEY_ENCRYPTION_ROUNDS: u32 = 600_000;

/// An RSA key pair.
#[derive(Clone)]
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits and a
    /// public exponent of 65537.
    ///
    /// # Errors
    /// A generation error when the size is below [`MIN_RSA_BITS`] or the
    /// backend fails.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let failed =
            |reason: String| CertToolError::generation(format!("Failed to generate RSA key ({bits} bits): {reason}"));
        if bits < MIN_RSA_BITS {
            return Err(failed(format!("key size must be at least {MIN_RSA_BITS} bits")));
        }
        let exponent = BigUint::from(RSA_PUBLIC_EXPONENT);
        let private = RsaPrivateKey::new_with_exp(&mut OsRng, bits, &exponent)
            .map_err(|e| failed(e.to_string()))?;
        Ok(Self::from_private_key(private))
    }

    pub fn from_private_key(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self { private, public }
    }

    /// Loads a PKCS#8 PEM key, decrypting it when a passphrase is given.
    pub fn from_pkcs8_pem(pem: &str, passphrase: Option<&str>) -> Result<Self> {
        let private = match passphrase {
            Some(pw) => RsaPrivateKey::from_pkcs8_encrypted_pem(pem, pw),
            None => RsaPrivateKey::from_pkcs8_pem(pem),
        }
        .map_err(|e| CertToolError::config(format!("Unable to load private key: {e}")))?;
        Ok(Self::from_private_key(private))
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    /// The public key as an X.509 SubjectPublicKeyInfo.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.public.clone())?)
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over the given digest.
    pub fn sign_data(&self, digest: Digest, data: &[u8]) -> Result<Vec<u8>> {
        match digest {
            Digest::Sha256 => sign_with::<Sha256>(&self.private, data),
            Digest::Sha384 => sign_with::<Sha384>(&self.private, data),
            Digest::Sha512 => sign_with::<Sha512>(&self.private, data),
        }
    }

    /// Unencrypted PKCS#8 PEM (`BEGIN PRIVATE KEY`).
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        Ok(self.private.to_pkcs8_pem(LineEnding::LF)?.to_string())
    }

    /// PKCS#8 PEM encrypted under `passphrase` (`BEGIN ENCRYPTED PRIVATE KEY`),
    /// using PBES2 with PBKDF2-HMAC-SHA256 and AES-256-CBC.
    pub fn to_encrypted_pkcs8_pem(&self, passphrase: &str) -> Result<String> {
        let document = self.private.to_pkcs8_der()?;
        let info = PrivateKeyInfo::try_from(document.as_bytes())?;

        let mut salt = [0u8; 16];
        let mut iv = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);
        let params =
            pkcs8::pkcs5::pbes2::Parameters::pbkdf2_sha256_aes256cbc(KEY_ENCRYPTION_ROUNDS, &salt, &iv)
                .map_err(|e| CertToolError::generation(format!("Invalid key encryption parameters: {e}")))?;

        let encrypted = info.encrypt_with_params(params, passphrase.as_bytes())?;
        Ok(encrypted
            .to_pem(EncryptedPrivateKeyInfo::PEM_LABEL, LineEnding::LF)?
            .to_string())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &"RSA")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

fn sign_with<D>(private: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>>
where
    D: sha2::Digest + AssociatedOid,
{
    let signing_key = RsaSigningKey::<D>::new(private.clone());
    let signature = signing_key.try_sign(data)?;
    Ok(signature.to_vec())
}
