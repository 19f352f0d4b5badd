pub mod extensions;
pub mod params;

use der::asn1::{AnyRef, BitString};
use der::{Decode, DecodePem, Encode, EncodePem};
use extensions::{BasicConstraints, SubjectAltName, ToAndFromX509Extension};
use params::{DistinguishedName, ExtensionParam, Validity};
use pkcs8::LineEnding;
use tracing::debug;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo};
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::config::{CertConfig, Digest};
use crate::error::{CertToolError, Result};
use crate::issuer::{Issuer, SelfIssuer};
use crate::key::KeyPair;

/// Represents the supported signature algorithms for certificates and CSRs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-384 with RSA encryption.
    Sha384WithRSA,
    /// SHA-512 with RSA encryption.
    Sha512WithRSA,
}

impl From<Digest> for SignatureAlgorithm {
    fn from(digest: Digest) -> Self {
        match digest {
            Digest::Sha256 => SignatureAlgorithm::Sha256WithRSA,
            Digest::Sha384 => SignatureAlgorithm::Sha384WithRSA,
            Digest::Sha512 => SignatureAlgorithm::Sha512WithRSA,
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`
    /// with the NULL parameters PKCS#1 signatures carry.
    fn from(value: SignatureAlgorithm) -> Self {
        let oid = match value {
            SignatureAlgorithm::Sha256WithRSA => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRSA => const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
        };
        AlgorithmIdentifierOwned {
            oid,
            parameters: Some(AnyRef::NULL.into()),
        }
    }
}

/// Parameters for issuing a certificate.
///
/// # Fields
/// * `subject` - The subject name.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `is_ca` - Value of the (critical) Basic Constraints CA flag.
/// * `subject_alt_names` - DNS names for the SAN extension; empty means no
///   extension.
#[derive(Clone, Debug, bon::Builder)]
pub struct CertificationRequestInfo {
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub subject_alt_names: Vec<String>,
}

impl CertificationRequestInfo {
    /// The extensions a certificate issued for this request carries.
    pub fn extensions(&self) -> Result<Vec<ExtensionParam>> {
        let basic_constraints = BasicConstraints {
            is_ca: self.is_ca,
            max_path_length: None,
        };
        let mut extensions = vec![ExtensionParam::from_extension(&basic_constraints, true)?];
        if !self.subject_alt_names.is_empty() {
            let san = SubjectAltName {
                names: self.subject_alt_names.clone(),
            };
            extensions.push(ExtensionParam::from_extension(&san, false)?);
        }
        Ok(extensions)
    }
}

/// Represents an X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Creates a new self-signed certificate: issuer equals subject and the
    /// signature is made with `key` over `digest`.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: Validity,
        digest: Digest,
    ) -> Result<Self> {
        let self_issuer = SelfIssuer {
            name: cert_info.subject.clone(),
            key,
        };
        self_issuer.issue(cert_info, validity, digest)
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(self.inner.to_pem(LineEnding::LF)?)
    }

    /// Parses a PEM certificate.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = CertificateInner::from_pem(pem)
            .map_err(|e| CertToolError::config(format!("Failed to parse certificate: {e}")))?;
        Ok(Self { inner })
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| CertToolError::config(format!("Failed to parse certificate: {e}")))?;
        Ok(Self { inner })
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer_name(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(self.subject_name())
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: params::from_x509_time(&validity.not_before),
            not_after: params::from_x509_time(&validity.not_after),
        }
    }

    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    /// Finds and decodes extension `E`, returning it with its criticality.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<(E, bool)>> {
        let Some(extensions) = &self.inner.tbs_certificate.extensions else {
            return Ok(None);
        };
        extensions
            .iter()
            .find(|ext| ext.extn_id == E::OID)
            .map(|ext| Ok((E::from_x509_extension_value(ext.extn_value.as_bytes())?, ext.critical)))
            .transpose()
    }

    /// DNS names of the SAN extension, or `None` when there is no such
    /// extension.
    pub fn subject_alt_names(&self) -> Result<Option<Vec<String>>> {
        Ok(self
            .extension::<SubjectAltName>()?
            .map(|(san, _)| san.names))
    }
}

/// Represents a PKCS#10 certificate signing request.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub inner: CertReq,
}

impl CertificateRequest {
    /// Builds a CSR for `subject`, signed with `key` over `digest`. No
    /// attributes or extensions are requested.
    pub fn new(subject: &Name, key: &KeyPair, digest: Digest) -> Result<Self> {
        let info = CertReqInfo {
            version: x509_cert::request::Version::V1,
            subject: subject.clone(),
            public_key: key.as_spki()?,
            attributes: Default::default(),
        };
        let signature = key.sign_data(digest, &info.to_der()?)?;
        Ok(Self {
            inner: CertReq {
                info,
                algorithm: SignatureAlgorithm::from(digest).into(),
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    pub fn to_pem(&self) -> Result<String> {
        Ok(self.inner.to_pem(LineEnding::LF)?)
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = CertReq::from_pem(pem)
            .map_err(|e| CertToolError::config(format!("Failed to parse CSR: {e}")))?;
        Ok(Self { inner })
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.info.subject)
    }
}

/// The in-memory artifacts of one generation request.
#[derive(Debug)]
pub struct CertComponents {
    pub key: KeyPair,
    pub csr: CertificateRequest,
    pub cert: Certificate,
}

/// Generates a key pair, a CSR and a self-signed certificate.
///
/// The subject name and validity window are built first, so a DN value that
/// cannot be encoded or an unrepresentable expiry fails before any key
/// material exists. Failures of
/// the cryptographic steps are generation errors naming the step.
pub fn create_cert_components(dn: &DistinguishedName, config: &CertConfig) -> Result<CertComponents> {
    let subject = dn.as_x509_name()?;
    let validity = Validity::for_days(i64::from(config.valid_days))
        .map_err(in_step("Failed to generate self-signed certificate"))?;

    debug!(bits = config.private_key_bits, "generating RSA key");
    let key = KeyPair::generate_rsa(config.private_key_bits)?;

    debug!(digest = %config.digest, "building CSR");
    let csr = CertificateRequest::new(&subject, &key, config.digest)
        .map_err(in_step("Failed to generate CSR"))?;

    debug!(valid_days = config.valid_days, "building self-signed certificate");
    let cert_info = CertificationRequestInfo::builder()
        .subject(subject)
        .subject_public_key(key.as_spki()?)
        .is_ca(true)
        .subject_alt_names(config.subject_alt_names.clone())
        .build();
    let cert = Certificate::new_self_signed(&cert_info, &key, validity, config.digest)
        .map_err(in_step("Failed to generate self-signed certificate"))?;

    Ok(CertComponents { key, csr, cert })
}

/// Prefixes generation errors with the step that failed. Other kinds pass
/// through untouched.
fn in_step(step: &'static str) -> impl Fn(CertToolError) -> CertToolError {
    move |err| match err {
        CertToolError::Generation(msg) => CertToolError::Generation(format!("{step}: {msg}")),
        other => other,
    }
}
