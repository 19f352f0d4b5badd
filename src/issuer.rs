use der::asn1::BitString;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::cert::params::Validity;
use crate::cert::{Certificate, CertificationRequestInfo, SignatureAlgorithm};
use crate::config::Digest;
use crate::error::Result;
use crate::key::KeyPair;
use crate::tbs_certificate::{TbsCertificate, random_serial_number};

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the name placed in the issuer field of issued certificates.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Returns the serial number for the next issued certificate.
    fn serial_number(&self) -> Vec<u8> {
        random_serial_number()
    }

    /// Issues a certificate based on the provided certification request information.
    ///
    /// # Arguments
    /// * `cert_request` - The subject, public key and extension choices for the certificate.
    /// * `validity` - The validity window.
    /// * `digest` - Hash used with the issuer's RSA key for the signature.
    ///
    /// # Returns
    /// The signed `Certificate`.
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        validity: Validity,
        digest: Digest,
    ) -> Result<Certificate> {
        let signature_algo = SignatureAlgorithm::from(digest);

        let tbs_cert = TbsCertificate {
            serial_number: self.serial_number(),
            signature_algorithm: signature_algo,
            issuer: self.issuer_name().clone(),
            validity,
            subject: cert_request.subject.clone(),
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions: cert_request.extensions()?,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = self
            .signing_key()
            .sign_data(digest, &der::Encode::to_der(&tbs_cert_inner)?)?;

        let cert_inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algo.into(),
            signature: BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner: cert_inner })
    }
}

/// Issues certificates signed by the subject's own key.
pub struct SelfIssuer<'a> {
    pub name: Name,
    pub key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> &Name {
        &self.name
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::DistinguishedName;
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::signature::Verifier;
    use sha2::Sha256;

    #[test]
    fn test_self_issued_signature_verifies() {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let name = DistinguishedName::builder()
            .common_name("issuer.test".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        let info = CertificationRequestInfo::builder()
            .subject(name.clone())
            .subject_public_key(key.as_spki().unwrap())
            .is_ca(true)
            .build();
        let issuer = SelfIssuer { name, key: &key };
        let cert = issuer
            .issue(&info, Validity::for_days(1).unwrap(), Digest::Sha256)
            .unwrap();

        let tbs = der::Encode::to_der(&cert.inner.tbs_certificate).unwrap();
        let signature = Signature::try_from(cert.inner.signature.raw_bytes()).unwrap();
        VerifyingKey::<Sha256>::new(key.public_key().clone())
            .verify(&tbs, &signature)
            .unwrap();
        assert_eq!(cert.inner.tbs_certificate.version, x509_cert::Version::V3);
    }
}
