use super::{Key, KeyType, PrivateParts, PublicParts};
use crate::error::{Error, ErrorKind, OsshResult};
use crate::format::ossh_pubkey::*;
use openssl::bn::{BigNum, BigNumContext};
use openssl::dsa::{Dsa, DsaRef};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private, Public};
use openssl::sign::{Signer, Verifier};
use std::fmt;

/// The key name returned by [`Key::keyname()`](../trait.Key.html#method.keyname)
pub const DSA_NAME: &str = "ssh-dss";

/// Represent the DSA public key
#[derive(Debug, Clone)]
pub struct DsaPublicKey {
    dsa: Dsa<Public>,
}

impl DsaPublicKey {
    /// Create the DSA public key from the public components
    pub fn new(p: BigNum, q: BigNum, g: BigNum, pub_key: BigNum) -> OsshResult<Self> {
        Ok(Self {
            dsa: Dsa::from_public_components(p, q, g, pub_key)?,
        })
    }

    pub(crate) fn ossl_dsa(&self) -> &DsaRef<Public> {
        &self.dsa
    }
}

impl Key for DsaPublicKey {
    fn size(&self) -> usize {
        self.dsa.p().num_bits() as usize
    }

    fn keyname(&self) -> &'static str {
        DSA_NAME
    }
}

impl PublicParts for DsaPublicKey {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_dsa_pubkey(&self.dsa)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        let pkey = PKey::from_dsa(self.dsa.clone())?;
        let mut veri = Verifier::new(MessageDigest::sha256(), &pkey)?;
        veri.update(data)?;
        Ok(veri.verify(sig)?)
    }
}

impl PartialEq for DsaPublicKey {
    fn eq(&self, other: &Self) -> bool {
        (self.dsa.p() == other.dsa.p())
            && (self.dsa.q() == other.dsa.q())
            && (self.dsa.g() == other.dsa.g())
            && (self.dsa.pub_key() == other.dsa.pub_key())
    }
}

impl fmt::Display for DsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&stringify_ossh_pubkey(self, None).map_err(|_| fmt::Error)?)
    }
}

/// Represent the DSA key pair
pub struct DsaKeyPair {
    dsa: Dsa<Private>,
}

impl DsaKeyPair {
    /// Generate DSA key pair
    ///
    /// OpenSSH only accepts 1024 bits DSA keys, so the bits parameter should be `1024` or `0`.
    pub fn generate(bits: usize) -> OsshResult<Self> {
        let bits = KeyType::DSA.resolve_size(Some(bits).filter(|b| *b != 0))?;
        Ok(DsaKeyPair {
            dsa: Dsa::generate(bits as u32)?,
        })
    }

    /// Build the key pair from the fields stored in an OpenSSH private key
    ///
    /// The public value `y` has to equal `g^x mod p`.
    pub(crate) fn from_components(
        p: BigNum,
        q: BigNum,
        g: BigNum,
        y: BigNum,
        x: BigNum,
    ) -> OsshResult<Self> {
        let mut ctx = BigNumContext::new()?;
        let mut expected = BigNum::new()?;
        expected.mod_exp(&g, &x, &p, &mut ctx)?;
        if expected != y {
            return Err(Error::with_error(
                ErrorKind::InvalidKey,
                "DSA public value doesn't match the private value",
            ));
        }
        Ok(DsaKeyPair {
            dsa: Dsa::from_private_components(p, q, g, x, y)?,
        })
    }

    /// Wrap a DSA key read by OpenSSL from a PEM container
    pub(crate) fn from_ossl_dsa(dsa: Dsa<Private>) -> OsshResult<Self> {
        Self::from_components(
            dsa.p().to_owned()?,
            dsa.q().to_owned()?,
            dsa.g().to_owned()?,
            dsa.pub_key().to_owned()?,
            dsa.priv_key().to_owned()?,
        )
    }

    pub(crate) fn ossl_dsa(&self) -> &DsaRef<Private> {
        &self.dsa
    }

    /// Clone the public parts to generate public key
    pub fn clone_public_key(&self) -> Result<DsaPublicKey, Error> {
        let p = self.dsa.p().to_owned()?;
        let q = self.dsa.q().to_owned()?;
        let g = self.dsa.g().to_owned()?;
        let pub_key = self.dsa.pub_key().to_owned()?;
        DsaPublicKey::new(p, q, g, pub_key)
    }
}

impl Key for DsaKeyPair {
    fn size(&self) -> usize {
        self.dsa.p().num_bits() as usize
    }

    fn keyname(&self) -> &'static str {
        DSA_NAME
    }
}

impl PublicParts for DsaKeyPair {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_dsa_pubkey(&self.dsa)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        self.clone_public_key()?.verify(data, sig)
    }
}

impl PrivateParts for DsaKeyPair {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let pkey = PKey::from_dsa(self.dsa.clone())?;
        let mut sign = Signer::new(MessageDigest::sha256(), &pkey)?;
        sign.update(data)?;
        Ok(sign.sign_to_vec()?)
    }
}

impl PartialEq for DsaKeyPair {
    fn eq(&self, other: &Self) -> bool {
        (self.dsa.p() == other.dsa.p())
            && (self.dsa.q() == other.dsa.q())
            && (self.dsa.g() == other.dsa.g())
            && (self.dsa.pub_key() == other.dsa.pub_key())
            && (self.dsa.priv_key() == other.dsa.priv_key())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::format::ossh_pubkey::parse_ossh_pubkey;
    use crate::keys::PublicKeyType;

    const DSA_PUBKEY: &str = "ssh-dss AAAAB3NzaC1kc3MAAACBAORLYnYacOdGmSJ99aZ+j2UqtQldYNHvAVVAI42wt/T/GTkg8cXdwwQ8HSJyD6T1e9ebnCXZd/YItX8DCPIP5GLUHVZy5zzKSzwga7zEjKP2j3JZGLAzFIUpStwQ8gur3zmh5DYi7JOdc/kWNpjT86n4fnrP+s8ZxuVDO5bbSasHAAAAFQD62yfFzJxz313aoIVgoMFoz8cF/wAAAIEAj7rvQz2hmuRyFUZIGWpwVHoR3y3SoQjEryX4ZtzwL04ROIXHSKJeOY9cdu2l5fMVYiMBtfWTQTlltFl1H//0hG/g5KBLhhwQ3Y7ul4Q8wsCWZJZeP3jtcO7+p3BLyMa6vvv5ptnMH+jRMgX5wwdszqogk4jCT+7fM2p6brMGccoAAACAD9qfPNxRo+npg+troNZ/FoYJezECqxg0jUyHWClACt7gS0W+r3dJIn9te6Xi7UFGPrLWJtlC++8i27m2FTS0sQUljM2NmRaf6jrCAhwPaJ0ievPJm5kBQmprTqBbdzCNRpI1+hceAnoHbajRwLueFwpoVOy2QjTkvBzd84Oobtw=";

    #[test]
    fn dsa_publickey_size() {
        let key = parse_ossh_pubkey(DSA_PUBKEY).unwrap();
        match key.key {
            PublicKeyType::DSA(ref dsa) => {
                assert_eq!(dsa.size(), 1024);
                assert_eq!(dsa.to_string(), DSA_PUBKEY);
            }
            _ => panic!("Not a DSA key"),
        }
    }

    #[test]
    fn dsa_generate_only_1024() {
        assert_eq!(
            DsaKeyPair::generate(2048).err().unwrap().kind(),
            ErrorKind::InvalidKeySize
        );
        let key = DsaKeyPair::generate(0).unwrap();
        assert_eq!(key.size(), 1024);
    }

    #[test]
    fn dsa_rebuild_checks_public_value() {
        let key = DsaKeyPair::generate(1024).unwrap();
        let dsa = key.ossl_dsa();
        let rebuild = |y: BigNum| {
            DsaKeyPair::from_components(
                dsa.p().to_owned().unwrap(),
                dsa.q().to_owned().unwrap(),
                dsa.g().to_owned().unwrap(),
                y,
                dsa.priv_key().to_owned().unwrap(),
            )
        };
        let rebuilt = rebuild(dsa.pub_key().to_owned().unwrap()).unwrap();
        assert!(rebuilt == key);

        let mut wrong_y = dsa.pub_key().to_owned().unwrap();
        wrong_y.add_word(1).unwrap();
        assert_eq!(rebuild(wrong_y).err().unwrap().kind(), ErrorKind::InvalidKey);
    }
}
