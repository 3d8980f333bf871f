#![allow(dead_code)]

use std::io::Write;

use once_cell::sync::Lazy;
use openssl::{
    ec::{EcGroup, EcKey},
    nid::Nid,
    pkey::{PKey, Private},
};
use tempfile::NamedTempFile;

fn utf8(pem: Vec<u8>) -> String {
    String::from_utf8(pem).unwrap()
}

/// Writes PEM text to a temporary file that lives as long as the handle
pub fn pem_file(pem: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(pem.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub mod hmac {
    pub const SECRET: &str = "s3cret";
}

pub mod rsa {
    use openssl::{
        asn1::Asn1Time,
        bn::BigNum,
        hash::MessageDigest,
        pkey::{PKey, Private},
        rsa::Rsa,
        x509::{X509Builder, X509NameBuilder},
    };

    use super::*;

    static KEY: Lazy<Rsa<Private>> = Lazy::new(|| Rsa::generate(2048).unwrap());

    pub static PRIVATE_KEY_PKCS1: Lazy<String> =
        Lazy::new(|| utf8(KEY.private_key_to_pem().unwrap()));

    pub static PRIVATE_KEY_PKCS8: Lazy<String> = Lazy::new(|| {
        let pkey = PKey::from_rsa(KEY.clone()).unwrap();
        utf8(pkey.private_key_to_pem_pkcs8().unwrap())
    });

    pub static PUBLIC_KEY: Lazy<String> = Lazy::new(|| utf8(KEY.public_key_to_pem().unwrap()));

    pub static PUBLIC_KEY_PKCS1: Lazy<String> =
        Lazy::new(|| utf8(KEY.public_key_to_pem_pkcs1().unwrap()));

    pub static CERTIFICATE: Lazy<String> = Lazy::new(|| {
        let pkey = PKey::from_rsa(KEY.clone()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "jwtsmith test").unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&pkey).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        builder.sign(&pkey, MessageDigest::sha256()).unwrap();

        utf8(builder.build().to_pem().unwrap())
    });

    /// A 1024-bit key, below the accepted minimum
    pub static SHORT_PRIVATE_KEY: Lazy<String> =
        Lazy::new(|| utf8(Rsa::generate(1024).unwrap().private_key_to_pem().unwrap()));
}

pub mod ec {
    use super::*;

    fn generate(nid: Nid) -> EcKey<Private> {
        let group = EcGroup::from_curve_name(nid).unwrap();
        EcKey::generate(&group).unwrap()
    }

    fn pkcs8(key: &EcKey<Private>) -> String {
        let pkey = PKey::from_ec_key(key.clone()).unwrap();
        utf8(pkey.private_key_to_pem_pkcs8().unwrap())
    }

    static P256: Lazy<EcKey<Private>> = Lazy::new(|| generate(Nid::X9_62_PRIME256V1));
    static P384: Lazy<EcKey<Private>> = Lazy::new(|| generate(Nid::SECP384R1));
    static P521: Lazy<EcKey<Private>> = Lazy::new(|| generate(Nid::SECP521R1));

    pub static P256_PRIVATE_KEY: Lazy<String> = Lazy::new(|| pkcs8(&P256));
    pub static P256_PRIVATE_KEY_SEC1: Lazy<String> =
        Lazy::new(|| utf8(P256.private_key_to_pem().unwrap()));
    pub static P256_PUBLIC_KEY: Lazy<String> =
        Lazy::new(|| utf8(P256.public_key_to_pem().unwrap()));

    pub static P384_PRIVATE_KEY: Lazy<String> = Lazy::new(|| pkcs8(&P384));
    pub static P384_PUBLIC_KEY: Lazy<String> =
        Lazy::new(|| utf8(P384.public_key_to_pem().unwrap()));

    pub static P521_PRIVATE_KEY: Lazy<String> = Lazy::new(|| pkcs8(&P521));
    pub static P521_PUBLIC_KEY: Lazy<String> =
        Lazy::new(|| utf8(P521.public_key_to_pem().unwrap()));

    /// A key on a curve that no supported algorithm uses
    pub static SECP256K1_PRIVATE_KEY: Lazy<String> =
        Lazy::new(|| pkcs8(&generate(Nid::SECP256K1)));
}

/// An Ed25519 key, which no supported algorithm accepts
pub static ED25519_PRIVATE_KEY: Lazy<String> = Lazy::new(|| {
    let pkey = PKey::generate_ed25519().unwrap();
    utf8(pkey.private_key_to_pem_pkcs8().unwrap())
});
