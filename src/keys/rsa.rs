use super::{Key, KeyType, PrivateParts, PublicParts};
use crate::error::{Error, ErrorKind, OsshResult};
use crate::format::ossh_pubkey::*;
use openssl::bn::{BigNum, BigNumContext, BigNumRef};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::{Rsa, RsaPrivateKeyBuilder, RsaRef};
use openssl::sign::{Signer, Verifier};
use std::fmt;

/// The key name returned by [`Key::keyname()`](../trait.Key.html#method.keyname)
pub const RSA_NAME: &str = "ssh-rsa";

/// Represent the RSA public key
#[derive(Debug, Clone)]
pub struct RsaPublicKey {
    rsa: Rsa<Public>,
}

impl RsaPublicKey {
    /// Create the RSA public key from the public components
    pub fn new(n: BigNum, e: BigNum) -> OsshResult<Self> {
        Ok(RsaPublicKey {
            rsa: Rsa::from_public_components(n, e)?,
        })
    }

    pub(crate) fn ossl_rsa(&self) -> &RsaRef<Public> {
        &self.rsa
    }
}

impl Key for RsaPublicKey {
    fn size(&self) -> usize {
        self.rsa.n().num_bits() as usize
    }

    fn keyname(&self) -> &'static str {
        RSA_NAME
    }
}

impl PublicParts for RsaPublicKey {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_rsa_pubkey(&self.rsa)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        let pkey = PKey::from_rsa(self.rsa.clone())?;
        let mut veri = Verifier::new(MessageDigest::sha256(), &pkey)?;
        veri.update(data)?;
        Ok(veri.verify(sig)?)
    }
}

impl PartialEq for RsaPublicKey {
    fn eq(&self, other: &RsaPublicKey) -> bool {
        self.rsa.e() == other.rsa.e() && self.rsa.n() == other.rsa.n()
    }
}

impl fmt::Display for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&stringify_ossh_pubkey(self, None).map_err(|_| fmt::Error)?)
    }
}

/// Represent the RSA key pair
pub struct RsaKeyPair {
    rsa: Rsa<Private>,
}

impl RsaKeyPair {
    /// Generate RSA key pair with the public exponent 65537
    ///
    /// The bits parameter should be within `1024..=16384` or `0` to use default length (2048 bits).
    pub fn generate(bits: usize) -> OsshResult<Self> {
        let bits = KeyType::RSA.resolve_size(Some(bits).filter(|b| *b != 0))?;
        Ok(RsaKeyPair {
            rsa: Rsa::generate(bits as u32)?,
        })
    }

    /// Build the key pair from the fields stored in an OpenSSH private key
    ///
    /// OpenSSH doesn't keep `d mod (p-1)` and `d mod (q-1)`, so they are recomputed here.
    pub(crate) fn from_components(
        n: BigNum,
        e: BigNum,
        d: BigNum,
        iqmp: BigNum,
        p: BigNum,
        q: BigNum,
    ) -> OsshResult<Self> {
        let mut ctx = BigNumContext::new()?;
        let one = BigNum::from_u32(1)?;
        let mut p1 = BigNum::new()?;
        p1.checked_sub(&p, &one)?;
        let mut q1 = BigNum::new()?;
        q1.checked_sub(&q, &one)?;
        let mut dmp1 = BigNum::new()?;
        dmp1.nnmod(&d, &p1, &mut ctx)?;
        let mut dmq1 = BigNum::new()?;
        dmq1.nnmod(&d, &q1, &mut ctx)?;

        let rsa = RsaPrivateKeyBuilder::new(n, e, d)?
            .set_factors(p, q)?
            .set_crt_params(dmp1, dmq1, iqmp)?
            .build();
        if !rsa.check_key()? {
            return Err(ErrorKind::InvalidKey.into());
        }
        Ok(RsaKeyPair { rsa })
    }

    /// Wrap an RSA key read by OpenSSL from a PEM container
    pub(crate) fn from_ossl_rsa(rsa: Rsa<Private>) -> OsshResult<Self> {
        if rsa.p().is_none() || rsa.q().is_none() || rsa.iqmp().is_none() {
            return Err(Error::with_error(
                ErrorKind::InvalidKey,
                "RSA key without CRT parameters",
            ));
        }
        if !rsa.check_key()? {
            return Err(ErrorKind::InvalidKey.into());
        }
        Ok(RsaKeyPair { rsa })
    }

    pub(crate) fn ossl_rsa(&self) -> &RsaRef<Private> {
        &self.rsa
    }

    /// Clone the public parts to generate public key
    pub fn clone_public_key(&self) -> Result<RsaPublicKey, Error> {
        let n = self.rsa.n().to_owned()?;
        let e = self.rsa.e().to_owned()?;
        RsaPublicKey::new(n, e)
    }
}

impl Key for RsaKeyPair {
    fn size(&self) -> usize {
        self.rsa.n().num_bits() as usize
    }

    fn keyname(&self) -> &'static str {
        RSA_NAME
    }
}

impl PublicParts for RsaKeyPair {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_rsa_pubkey(&self.rsa)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        self.clone_public_key()?.verify(data, sig)
    }
}

impl PrivateParts for RsaKeyPair {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let pkey = PKey::from_rsa(self.rsa.clone())?;
        let mut sign = Signer::new(MessageDigest::sha256(), &pkey)?;
        sign.update(data)?;
        Ok(sign.sign_to_vec()?)
    }
}

impl PartialEq for RsaKeyPair {
    fn eq(&self, other: &Self) -> bool {
        fn opt_eq(a: Option<&BigNumRef>, b: Option<&BigNumRef>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                (None, None) => true,
                _ => false,
            }
        }
        self.rsa.n() == other.rsa.n()
            && self.rsa.e() == other.rsa.e()
            && self.rsa.d() == other.rsa.d()
            && opt_eq(self.rsa.p(), other.rsa.p())
            && opt_eq(self.rsa.q(), other.rsa.q())
    }
}
