use crate::error::*;
use crate::keys::dsa::DsaKeyPair;
use crate::keys::ecdsa::EcDsaKeyPair;
use crate::keys::rsa::RsaKeyPair;
use crate::keys::{KeyPair, KeyPairType};
use crate::params::{Comment, Passphrase};
use openssl::pkey::{Id, PKey};
use std::convert::TryFrom;

pub(crate) const PKCS8_TAG: &str = "PRIVATE KEY";
pub(crate) const PKCS8_ENCRYPTED_TAG: &str = "ENCRYPTED PRIVATE KEY";
pub(crate) const RSA_TAG: &str = "RSA PRIVATE KEY";
pub(crate) const DSA_TAG: &str = "DSA PRIVATE KEY";
pub(crate) const EC_TAG: &str = "EC PRIVATE KEY";

/// Decode a PKCS#8 or a traditional OpenSSL (PKCS#1, SEC1, DSA) private key
///
/// These containers hold no comment, so the key pair comes back with an empty one. Ed25519
/// keys are only read from the OpenSSH format.
pub(crate) fn decode_pem_privkey(
    pemdata: &::pem::Pem,
    raw: &[u8],
    passphrase: &[u8],
) -> OsshResult<KeyPair> {
    let encrypted = pemdata.tag() == PKCS8_ENCRYPTED_TAG
        || pemdata
            .headers()
            .get("Proc-Type")
            .map_or(false, |v| v.contains("ENCRYPTED"));

    let pkey = if encrypted {
        if passphrase.is_empty() {
            return Err(Error::with_error(
                ErrorKind::IncorrectPass,
                "the private key is encrypted",
            ));
        }
        PKey::private_key_from_pem_passphrase(raw, passphrase)
            .map_err(|e| Error::with_error(ErrorKind::IncorrectPass, e))?
    } else {
        if !passphrase.is_empty() {
            log::debug!("Passphrase given for an unencrypted private key, ignored");
        }
        PKey::private_key_from_pem(raw)?
    };

    let key = match pkey.id() {
        Id::RSA => KeyPairType::RSA(RsaKeyPair::from_ossl_rsa(pkey.rsa()?)?),
        Id::DSA => KeyPairType::DSA(DsaKeyPair::from_ossl_dsa(pkey.dsa()?)?),
        Id::EC => KeyPairType::ECDSA(EcDsaKeyPair::from_ossl_ec(pkey.ec_key()?)?),
        _ => return Err(ErrorKind::UnsupportType.into()),
    };
    let passphrase = if encrypted {
        Passphrase::try_from(passphrase)?
    } else {
        Passphrase::empty()
    };
    log::debug!("Decoded \"{}\" private key", pemdata.tag());
    Ok(KeyPair::assemble(key, Comment::default(), passphrase))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys::{Key, KeyType, PublicParts};
    use openssl::ec::{EcGroup, EcKey};
    use openssl::nid::Nid;
    use openssl::rsa::Rsa;
    use openssl::symm::Cipher as OsslCipher;

    fn decode(raw: &[u8], passphrase: &[u8]) -> OsshResult<KeyPair> {
        decode_pem_privkey(&::pem::parse(raw).unwrap(), raw, passphrase)
    }

    #[test]
    fn traditional_rsa() {
        let rsa = Rsa::generate(2048).unwrap();
        let pem = rsa.private_key_to_pem().unwrap();
        let key = decode(&pem, b"").unwrap();
        assert_eq!(key.keytype(), KeyType::RSA);
        assert_eq!(key.size(), 2048);
        assert_eq!(key.comment(), "");
        assert!(!key.is_encrypted());
    }

    #[test]
    fn pkcs8_ecdsa() {
        let group = EcGroup::from_curve_name(Nid::SECP384R1).unwrap();
        let pkey = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();
        let pem = pkey.private_key_to_pem_pkcs8().unwrap();
        let key = decode(&pem, b"").unwrap();
        assert_eq!(key.keytype(), KeyType::ECDSA);
        assert_eq!(key.keyname(), "ecdsa-sha2-nistp384");
    }

    #[test]
    fn pkcs8_encrypted() {
        let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let pem = pkey
            .private_key_to_pem_pkcs8_passphrase(OsslCipher::aes_128_cbc(), b"12345678")
            .unwrap();
        let key = decode(&pem, b"12345678").unwrap();
        assert!(key.is_encrypted());
        let rsa = pkey.rsa().unwrap();
        assert_eq!(
            key.blob().unwrap(),
            crate::format::ossh_pubkey::encode_rsa_pubkey(&rsa).unwrap()
        );

        for pass in [&b"wrong"[..], &b""[..]].iter() {
            assert_eq!(
                decode(&pem, pass).unwrap_err().kind(),
                ErrorKind::IncorrectPass
            );
        }
    }

    #[test]
    fn pkcs8_ed25519_unsupported() {
        let pkey = PKey::generate_ed25519().unwrap();
        let pem = pkey.private_key_to_pem_pkcs8().unwrap();
        assert_eq!(
            decode(&pem, b"").unwrap_err().kind(),
            ErrorKind::UnsupportType
        );
    }
}
