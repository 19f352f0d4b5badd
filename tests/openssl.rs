mod util;

use std::fs;
use std::process::Command;

use certtool::config::{CertConfig, Digest};
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::{X509, X509Req};
use regex::Regex;

fn san_config(digest: Digest) -> CertConfig {
    CertConfig::builder()
        .digest(digest)
        .private_key_bits(util::TEST_KEY_BITS)
        .subject_alt_names(vec!["openssl.test".to_string(), "www.openssl.test".to_string()])
        .build()
}

#[test]
fn test_openssl_validate_cert() {
    let bundle = certtool::generate_from_dn_and_config(
        &util::full_dn("openssl.test"),
        &san_config(Digest::Sha512),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("cert.pem");
    fs::write(&cert_path, &bundle.certificate_pem).expect("Failed to write certificate");

    // Use OpenSSL CLI to dump the generated certificate
    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output_text = String::from_utf8_lossy(&output.stdout);

    assert!(
        output_text.contains("Version: 3 (0x2)"),
        "Version field is incorrect"
    );
    assert!(
        output_text.contains("Signature Algorithm: sha512WithRSAEncryption"),
        "Signature Algorithm field is incorrect"
    );
    assert!(
        output_text.contains("Public-Key: (1024 bit)"),
        "Key size is incorrect"
    );

    let subject_regex = Regex::new(r"Subject: C\s?=\s?UK, ST\s?=\s?Somerset, .*CN\s?=\s?openssl\.test").unwrap();
    assert!(subject_regex.is_match(&output_text), "Subject field is incorrect");

    let bc_regex = Regex::new(r"X509v3 Basic Constraints: critical\s+CA:TRUE").unwrap();
    assert!(bc_regex.is_match(&output_text), "Basic Constraints are incorrect");

    let san_regex = Regex::new(r"X509v3 Subject Alternative Name:\s+DNS:openssl\.test, DNS:www\.openssl\.test").unwrap();
    assert!(san_regex.is_match(&output_text), "Subject Alternative Name is incorrect");
    assert!(
        !output_text.contains("X509v3 Subject Alternative Name: critical"),
        "Subject Alternative Name must not be critical"
    );

    let not_before_regex = Regex::new(r"Not Before: .+").unwrap();
    let not_after_regex = Regex::new(r"Not After : .+").unwrap();
    assert!(not_before_regex.is_match(&output_text), "Missing Not Before field");
    assert!(not_after_regex.is_match(&output_text), "Missing Not After field");
}

#[test]
fn test_openssl_crate_validate_cert() {
    let bundle = certtool::generate_from_dn_and_config(
        &util::dn("crate.openssl.test"),
        &san_config(Digest::Sha384),
    )
    .unwrap();

    let x509 = X509::from_pem(bundle.certificate_pem.as_bytes()).expect("Failed to parse PEM");

    let subject = x509
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(subject.to_string(), "crate.openssl.test", "Subject CN mismatch");

    let issuer = x509
        .issuer_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(issuer.to_string(), "crate.openssl.test", "Issuer CN mismatch");

    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");

    let sig_alg = x509.signature_algorithm().object().nid();
    assert_eq!(sig_alg, Nid::SHA384WITHRSAENCRYPTION);

    // Self-signed: verifies under its own public key
    let public_key = x509.public_key().unwrap();
    assert!(x509.verify(&public_key).unwrap(), "Signature does not verify");

    let dns_names: Vec<String> = x509
        .subject_alt_names()
        .expect("SAN extension missing")
        .iter()
        .filter_map(|name| name.dnsname().map(str::to_string))
        .collect();
    assert_eq!(dns_names, vec!["openssl.test", "www.openssl.test"]);
}

#[test]
fn test_openssl_crate_validate_csr() {
    let bundle = util::generate("csr.openssl.test", &util::fast_config());

    let req = X509Req::from_pem(bundle.csr_pem.as_bytes()).expect("Failed to parse CSR");
    let public_key = req.public_key().unwrap();
    assert!(req.verify(&public_key).unwrap(), "CSR signature does not verify");

    let cn = req
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(cn.to_string(), "csr.openssl.test");

    let cert = X509::from_pem(bundle.certificate_pem.as_bytes()).unwrap();
    assert!(public_key.public_eq(&cert.public_key().unwrap()));
}

#[test]
fn test_openssl_reads_keys() {
    let plain = util::generate("plain.openssl.test", &util::fast_config());
    let key = PKey::private_key_from_pem(plain.private_key_pem.as_bytes()).unwrap();
    assert_eq!(key.bits(), util::TEST_KEY_BITS as u32);

    let config = CertConfig::builder()
        .private_key_bits(util::TEST_KEY_BITS)
        .encrypt_key(true)
        .passphrase("P".to_string())
        .build();
    let encrypted = util::generate("enc.openssl.test", &config);
    assert!(PKey::private_key_from_pem_passphrase(encrypted.private_key_pem.as_bytes(), b"wrong").is_err());
    let key = PKey::private_key_from_pem_passphrase(encrypted.private_key_pem.as_bytes(), b"P").unwrap();

    let cert = X509::from_pem(encrypted.certificate_pem.as_bytes()).unwrap();
    assert!(key.public_eq(&cert.public_key().unwrap()));
}
