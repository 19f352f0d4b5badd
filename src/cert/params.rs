use bon::Builder;
use const_oid::ObjectIdentifier;
use der::{Tag, Tagged};
use der::asn1::{Any, Ia5StringRef, OctetString, PrintableStringRef, SetOfVec, Utf8StringRef};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::{CertToolError, Result};

/// The recognized Distinguished Name attributes, in the order they are
/// emitted into a subject name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DnAttribute {
    Country,
    StateOrProvince,
    Locality,
    Organization,
    OrganizationalUnit,
    CommonName,
    EmailAddress,
}

impl DnAttribute {
    /// All attributes in subject order: C, ST, L, O, OU, CN, emailAddress.
    pub const ALL: [DnAttribute; 7] = [
        DnAttribute::Country,
        DnAttribute::StateOrProvince,
        DnAttribute::Locality,
        DnAttribute::Organization,
        DnAttribute::OrganizationalUnit,
        DnAttribute::CommonName,
        DnAttribute::EmailAddress,
    ];

    /// The field name used for this attribute in configuration documents.
    pub fn key(self) -> &'static str {
        match self {
            DnAttribute::Country => "countryName",
            DnAttribute::StateOrProvince => "stateOrProvinceName",
            DnAttribute::Locality => "localityName",
            DnAttribute::Organization => "organizationName",
            DnAttribute::OrganizationalUnit => "organizationalUnitName",
            DnAttribute::CommonName => "commonName",
            DnAttribute::EmailAddress => "emailAddress",
        }
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            DnAttribute::Country => ObjectIdentifier::new_unwrap("2.5.4.6"),
            DnAttribute::StateOrProvince => ObjectIdentifier::new_unwrap("2.5.4.8"),
            DnAttribute::Locality => ObjectIdentifier::new_unwrap("2.5.4.7"),
            DnAttribute::Organization => ObjectIdentifier::new_unwrap("2.5.4.10"),
            DnAttribute::OrganizationalUnit => ObjectIdentifier::new_unwrap("2.5.4.11"),
            DnAttribute::CommonName => ObjectIdentifier::new_unwrap("2.5.4.3"),
            DnAttribute::EmailAddress => ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1"),
        }
    }

    /// Encodes `value` with the ASN.1 string type X.509 expects for this
    /// attribute.
    fn encode_value(self, value: &str) -> Result<Any> {
        let invalid = |e: der::Error| {
            CertToolError::config(format!("Invalid {} {value:?}: {e}", self.key()))
        };
        let any = match self {
            DnAttribute::Country => {
                if value.chars().count() != 2 {
                    return Err(CertToolError::config(format!(
                        "Invalid countryName {value:?}: must be a 2 character country code"
                    )));
                }
                PrintableStringRef::new(value).map_err(invalid)?;
                Any::new(Tag::PrintableString, value.as_bytes())
            }
            DnAttribute::EmailAddress => {
                Ia5StringRef::new(value).map_err(invalid)?;
                Any::new(Tag::Ia5String, value.as_bytes())
            }
            _ => {
                Utf8StringRef::new(value).map_err(invalid)?;
                Any::new(Tag::Utf8String, value.as_bytes())
            }
        };
        Ok(any?)
    }
}

/// Distinguished name of a certificate subject.
///
/// Field names in configuration documents follow the usual OpenSSL spelling
/// (`commonName`, `organizationName`, ...). Unknown fields are ignored when
/// deserializing.
///
/// # Fields
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
/// * `common_name` - The common name (CN), required.
/// * `email` - The email address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct DistinguishedName {
    #[serde(rename = "countryName", default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "stateOrProvinceName", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "localityName", default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(rename = "organizationName", default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(rename = "organizationalUnitName", default, skip_serializing_if = "Option::is_none")]
    pub organization_unit: Option<String>,
    #[serde(rename = "commonName", default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(rename = "emailAddress", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl DistinguishedName {
    pub fn get(&self, attr: DnAttribute) -> Option<&str> {
        let value = match attr {
            DnAttribute::Country => &self.country,
            DnAttribute::StateOrProvince => &self.state,
            DnAttribute::Locality => &self.locality,
            DnAttribute::Organization => &self.organization,
            DnAttribute::OrganizationalUnit => &self.organization_unit,
            DnAttribute::CommonName => &self.common_name,
            DnAttribute::EmailAddress => &self.email,
        };
        value.as_deref()
    }

    pub fn set(&mut self, attr: DnAttribute, value: impl Into<String>) {
        let slot = match attr {
            DnAttribute::Country => &mut self.country,
            DnAttribute::StateOrProvince => &mut self.state,
            DnAttribute::Locality => &mut self.locality,
            DnAttribute::Organization => &mut self.organization,
            DnAttribute::OrganizationalUnit => &mut self.organization_unit,
            DnAttribute::CommonName => &mut self.common_name,
            DnAttribute::EmailAddress => &mut self.email,
        };
        *slot = Some(value.into());
    }

    /// True when no attribute was supplied at all.
    pub fn is_empty(&self) -> bool {
        DnAttribute::ALL.iter().all(|attr| self.get(*attr).is_none())
    }

    /// The common name with surrounding whitespace removed, if non-blank.
    pub fn trimmed_common_name(&self) -> Option<&str> {
        self.common_name
            .as_deref()
            .map(str::trim)
            .filter(|cn| !cn.is_empty())
    }

    /// Checks that the DN is non-empty and carries a non-blank `commonName`.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CertToolError::config(
                "DN is empty. You must supply DN attributes (at least 'commonName') \
                 either via CLI or JSON configuration.",
            ));
        }
        if self.trimmed_common_name().is_none() {
            return Err(CertToolError::config(
                "DN is missing 'commonName'. Provide it in the JSON config or via CLI.",
            ));
        }
        Ok(())
    }

    /// Builds the X.509 name for this DN.
    ///
    /// Attributes are emitted one per RDN in the fixed order of
    /// [`DnAttribute::ALL`]; absent or empty values are skipped.
    ///
    /// # Errors
    /// A config error when a value cannot be represented in the ASN.1 string
    /// type required for its attribute.
    pub fn as_x509_name(&self) -> Result<Name> {
        let mut rdns = Vec::new();
        for attr in DnAttribute::ALL {
            let Some(value) = self.get(attr).filter(|v| !v.is_empty()) else {
                continue;
            };
            let atv = AttributeTypeAndValue {
                oid: attr.oid(),
                value: attr.encode_value(value)?,
            };
            rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![atv])?));
        }
        Ok(RdnSequence(rdns))
    }

    /// Reads the recognized attributes back out of an X.509 name.
    pub fn from_x509_name(name: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in name.0.iter() {
            for atv in rdn.0.iter() {
                let Some(attr) = DnAttribute::ALL.into_iter().find(|a| a.oid() == atv.oid) else {
                    continue;
                };
                let value = match atv.value.tag() {
                    Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
                        String::from_utf8_lossy(atv.value.value()).into_owned()
                    }
                    _ => continue,
                };
                dn.set(attr, value);
            }
        }
        dn
    }
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

/// No date up to year 9999 lies further than this from any other.
const MAX_VALIDITY_DAYS: u64 = 10_000 * 366;

impl Validity {
    /// How far `not_before` is backdated, to tolerate clock skew between
    /// generation and first use.
    pub const CLOCK_SKEW: Duration = Duration::minutes(1);

    /// Creates a validity period ending `days` days from now, starting
    /// [`Validity::CLOCK_SKEW`] before now.
    ///
    /// # Errors
    /// A generation error when the end falls after year 9999, the last year
    /// GeneralizedTime can express.
    pub fn for_days(days: i64) -> Result<Self> {
        Self::for_days_from(OffsetDateTime::now_utc(), days)
    }

    pub fn for_days_from(now: OffsetDateTime, days: i64) -> Result<Self> {
        let out_of_range = || {
            CertToolError::generation(format!(
                "Validity of {days} days is out of range: the certificate would expire after year 9999"
            ))
        };
        // Bounding `days` first keeps `Duration::days` from overflowing.
        let not_after = Some(days)
            .filter(|d| d.unsigned_abs() <= MAX_VALIDITY_DAYS)
            .and_then(|d| now.checked_add(Duration::days(d)))
            .filter(|end| end.year() <= 9999)
            .ok_or_else(out_of_range)?;
        let not_before = now.checked_sub(Self::CLOCK_SKEW).ok_or_else(out_of_range)?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Converts to the X.509 representation: UTCTime up to 2049,
    /// GeneralizedTime afterwards.
    pub fn to_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }
}

fn to_x509_time(at: OffsetDateTime) -> Result<x509_cert::time::Time> {
    let system_time: std::time::SystemTime = at.into();
    match der::asn1::UtcTime::from_system_time(system_time) {
        Ok(utc) => Ok(x509_cert::time::Time::UtcTime(utc)),
        Err(_) => Ok(x509_cert::time::Time::GeneralTime(
            der::asn1::GeneralizedTime::from_system_time(system_time)?,
        )),
    }
}

/// Converts an X.509 time back into an `OffsetDateTime`.
pub fn from_x509_time(time: &x509_cert::time::Time) -> OffsetDateTime {
    OffsetDateTime::from(time.to_system_time())
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: &E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn to_x509_extension(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }
}
