use der::Encode;
use rand_core::{OsRng, RngCore};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{ExtensionParam, Validity};
use crate::error::Result;

/// Number of random bytes in a generated serial number.
const SERIAL_NUMBER_LEN: usize = 20;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian serial number bytes.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The issuer name.
/// * `validity` - The validity window.
/// * `subject` - The subject name.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial_number)?,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity: self.validity.to_x509_validity()?,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_tbs_certificate_inner()?.to_der()?)
    }
}

/// A fresh random, positive serial number.
///
/// The top bit is cleared so the DER INTEGER stays within 20 octets, and the
/// next one is set so the value never has a leading zero byte.
pub fn random_serial_number() -> Vec<u8> {
    let mut serial = vec![0u8; SERIAL_NUMBER_LEN];
    OsRng.fill_bytes(&mut serial);
    serial[0] = (serial[0] & 0x7f) | 0x40;
    serial
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_numbers_are_positive_and_distinct() {
        let a = random_serial_number();
        let b = random_serial_number();
        assert_ne!(a, b);
        for serial in [&a, &b] {
            assert_eq!(serial.len(), SERIAL_NUMBER_LEN);
            assert_eq!(serial[0] & 0x80, 0);
            assert_ne!(serial[0], 0);
            assert!(SerialNumber::<x509_cert::certificate::Rfc5280>::new(serial).is_ok());
        }
    }
}
