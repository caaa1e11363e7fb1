use super::{Key, KeyType, PrivateParts, PublicParts};
use crate::error::{Error, ErrorKind, OsshResult};
use crate::format::ossh_pubkey::*;
use openssl::bn::{BigNumContext, BigNumRef};
use openssl::ec::{EcGroup, EcGroupRef, EcKey, EcKeyRef, EcPoint, EcPointRef};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private, Public};
use openssl::sign::{Signer, Verifier};
use std::fmt;
use std::str::FromStr;

/// The name of 256 bits curve key returned by [`Key::keyname()`](../trait.Key.html#method.keyname)
pub const NIST_P256_NAME: &str = "ecdsa-sha2-nistp256";
/// The name of 384 bits curve key returned by [`Key::keyname()`](../trait.Key.html#method.keyname)
pub const NIST_P384_NAME: &str = "ecdsa-sha2-nistp384";
/// The name of 521 bits curve key returned by [`Key::keyname()`](../trait.Key.html#method.keyname)
pub const NIST_P521_NAME: &str = "ecdsa-sha2-nistp521";

/// An enum of the supported elliptic curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    Nistp256,
    Nistp384,
    Nistp521,
}

impl EcCurve {
    /// Pick the curve of a key size
    pub fn from_size(bits: usize) -> OsshResult<Self> {
        match bits {
            256 => Ok(EcCurve::Nistp256),
            384 => Ok(EcCurve::Nistp384),
            521 => Ok(EcCurve::Nistp521),
            _ => Err(ErrorKind::InvalidKeySize.into()),
        }
    }

    /// Parse from the ecdsa key name
    pub fn from_name(s: &str) -> OsshResult<Self> {
        match s {
            NIST_P256_NAME => Ok(EcCurve::Nistp256),
            NIST_P384_NAME => Ok(EcCurve::Nistp384),
            NIST_P521_NAME => Ok(EcCurve::Nistp521),
            _ => Err(ErrorKind::UnsupportCurve.into()),
        }
    }

    /// The key size of this curve
    pub fn size(self) -> usize {
        match self {
            EcCurve::Nistp256 => 256,
            EcCurve::Nistp384 => 384,
            EcCurve::Nistp521 => 521,
        }
    }

    /// The key name of this curve
    pub fn name(self) -> &'static str {
        match self {
            EcCurve::Nistp256 => NIST_P256_NAME,
            EcCurve::Nistp384 => NIST_P384_NAME,
            EcCurve::Nistp521 => NIST_P521_NAME,
        }
    }

    /// The identifier part in the key name
    pub fn ident(self) -> &'static str {
        match self {
            EcCurve::Nistp256 => "nistp256",
            EcCurve::Nistp384 => "nistp384",
            EcCurve::Nistp521 => "nistp521",
        }
    }

    fn from_nid(nid: Nid) -> OsshResult<Self> {
        match nid {
            Nid::X9_62_PRIME256V1 => Ok(EcCurve::Nistp256),
            Nid::SECP384R1 => Ok(EcCurve::Nistp384),
            Nid::SECP521R1 => Ok(EcCurve::Nistp521),
            _ => Err(ErrorKind::UnsupportCurve.into()),
        }
    }

    fn nid(self) -> Nid {
        match self {
            EcCurve::Nistp256 => Nid::X9_62_PRIME256V1,
            EcCurve::Nistp384 => Nid::SECP384R1,
            EcCurve::Nistp521 => Nid::SECP521R1,
        }
    }

    /// The hash OpenSSH pairs with this curve when signing
    fn digest(self) -> MessageDigest {
        match self {
            EcCurve::Nistp256 => MessageDigest::sha256(),
            EcCurve::Nistp384 => MessageDigest::sha384(),
            EcCurve::Nistp521 => MessageDigest::sha512(),
        }
    }

    pub(crate) fn group(self) -> Result<EcGroup, openssl::error::ErrorStack> {
        EcGroup::from_curve_name(self.nid())
    }
}

impl FromStr for EcCurve {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nistp256" => Ok(EcCurve::Nistp256),
            "nistp384" => Ok(EcCurve::Nistp384),
            "nistp521" => Ok(EcCurve::Nistp521),
            _ => Err(ErrorKind::UnsupportCurve.into()),
        }
    }
}

/// Represent the EcDSA public key
#[derive(Clone, Debug)]
pub struct EcDsaPublicKey {
    key: EcKey<Public>,
    curve: EcCurve,
}

impl EcDsaPublicKey {
    /// Create the EcDSA public key from the elliptic curve and the public point
    pub(crate) fn new(curve: EcCurve, public_key: &EcPointRef) -> OsshResult<Self> {
        let group = curve.group()?;
        let key = EcKey::from_public_key(&group, public_key)?;
        key.check_key()?;
        Ok(Self { key, curve })
    }

    pub(crate) fn from_bytes(curve: EcCurve, public_key: &[u8]) -> OsshResult<Self> {
        Self::new(curve, into_ec_point(curve, public_key)?.as_ref())
    }

    /// Get the key's elliptic curve type
    pub fn curve(&self) -> EcCurve {
        self.curve
    }
}

impl Key for EcDsaPublicKey {
    fn size(&self) -> usize {
        self.curve.size()
    }

    fn keyname(&self) -> &'static str {
        self.curve.name()
    }
}

impl PublicParts for EcDsaPublicKey {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_ecdsa_pubkey(self.curve, &self.key)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        let pkey = PKey::from_ec_key(self.key.clone())?;
        let mut veri = Verifier::new(self.curve.digest(), &pkey)?;
        veri.update(data)?;
        Ok(veri.verify(sig)?)
    }
}

impl PartialEq for EcDsaPublicKey {
    fn eq(&self, other: &Self) -> bool {
        // rust-openssl doesn't wrap EC_GROUP_cmp(), the curve stands in for the group
        self.curve == other.curve
            && points_eq(
                self.key.group(),
                self.key.public_key(),
                other.key.public_key(),
            )
    }
}

impl fmt::Display for EcDsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&stringify_ossh_pubkey(self, None).map_err(|_| fmt::Error)?)
    }
}

/// Represent the EcDSA key pair
pub struct EcDsaKeyPair {
    key: EcKey<Private>,
    curve: EcCurve,
}

impl EcDsaKeyPair {
    /// Generate EcDSA key pair
    ///
    /// The bits parameter should be 256, 384, 521 bits or `0` to use default length (256 bits).
    /// Different key length is corresponding to different curve.
    pub fn generate(bits: usize) -> OsshResult<Self> {
        let bits = KeyType::ECDSA.resolve_size(Some(bits).filter(|b| *b != 0))?;
        let curve = EcCurve::from_size(bits)?;
        let group = curve.group()?;

        Ok(EcDsaKeyPair {
            key: EcKey::generate(&group)?,
            curve,
        })
    }

    /// Build the key pair from the curve, the encoded public point and the private scalar
    pub(crate) fn from_bytes(
        curve: EcCurve,
        public_key: &[u8],
        private_number: &BigNumRef,
    ) -> OsshResult<Self> {
        let group = curve.group()?;
        let point = into_ec_point(curve, public_key)?;
        let key = EcKey::from_private_components(&group, private_number, &point)?;
        // Also verifies that the point is the generator multiplied by the scalar
        key.check_key()
            .map_err(|e| Error::with_error(ErrorKind::InvalidKey, e))?;
        Ok(Self { key, curve })
    }

    /// Wrap an EC key read by OpenSSL from a PEM container, named curves only
    pub(crate) fn from_ossl_ec(key: EcKey<Private>) -> OsshResult<Self> {
        let nid = key
            .group()
            .curve_name()
            .ok_or_else(|| Error::from(ErrorKind::UnsupportCurve))?;
        let curve = EcCurve::from_nid(nid)?;
        key.check_key()
            .map_err(|e| Error::with_error(ErrorKind::InvalidKey, e))?;
        Ok(Self { key, curve })
    }

    pub(crate) fn ossl_ec(&self) -> &EcKeyRef<Private> {
        &self.key
    }

    /// Get the key's elliptic curve type
    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    /// Clone the public parts to generate public key
    pub fn clone_public_key(&self) -> Result<EcDsaPublicKey, Error> {
        EcDsaPublicKey::new(self.curve, self.key.public_key())
    }
}

impl Key for EcDsaKeyPair {
    fn size(&self) -> usize {
        self.curve.size()
    }

    fn keyname(&self) -> &'static str {
        self.curve.name()
    }
}

impl PublicParts for EcDsaKeyPair {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_ecdsa_pubkey(self.curve, &self.key)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        self.clone_public_key()?.verify(data, sig)
    }
}

impl PrivateParts for EcDsaKeyPair {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let pkey = PKey::from_ec_key(self.key.clone())?;
        let mut sign = Signer::new(self.curve.digest(), &pkey)?;
        sign.update(data)?;
        Ok(sign.sign_to_vec()?)
    }
}

impl PartialEq for EcDsaKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.curve == other.curve
            && self.key.private_key() == other.key.private_key()
            && points_eq(
                self.key.group(),
                self.key.public_key(),
                other.key.public_key(),
            )
    }
}

fn points_eq(group: &EcGroupRef, a: &EcPointRef, b: &EcPointRef) -> bool {
    match BigNumContext::new() {
        Ok(mut ctx) => a.eq(group, b, &mut ctx).unwrap_or(false),
        Err(_) => false,
    }
}

fn into_ec_point(curve: EcCurve, public_key: &[u8]) -> OsshResult<EcPoint> {
    let mut bn_ctx = BigNumContext::new()?;
    let group = curve.group()?;
    Ok(EcPoint::from_bytes(&group, public_key, &mut bn_ctx)?)
}
