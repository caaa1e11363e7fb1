use super::{Key, KeyType, PrivateParts, PublicParts};
use crate::error::{Error, ErrorKind, OsshResult};
use crate::format::ossh_pubkey::*;
#[rustfmt::skip]
use ed25519_dalek::{
    Keypair as DalekKeypair,
    PublicKey as DalekPublicKey,
    SecretKey as DalekSecretKey,
    Signature,
    Signer,
    Verifier,
    PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH,
    KEYPAIR_LENGTH,
};
use rand::{CryptoRng, RngCore};
use std::convert::TryFrom;
use std::fmt;
use zeroize::Zeroizing;

/// The key name returned by [`Key::keyname()`](../trait.Key.html#method.keyname)
pub const ED25519_NAME: &str = "ssh-ed25519";

const ED25519_SIZE: usize = 256;

/// Represent the Ed25519 public key
#[derive(Debug, Clone)]
pub struct Ed25519PublicKey {
    key: DalekPublicKey,
}

impl Ed25519PublicKey {
    /// Create the Ed25519 public key from public components
    pub fn new(key: &[u8; PUBLIC_KEY_LENGTH]) -> Result<Self, ed25519_dalek::SignatureError> {
        Ok(Self {
            key: DalekPublicKey::from_bytes(key)?,
        })
    }

    pub(crate) fn from_slice(key: &[u8]) -> OsshResult<Self> {
        if key.len() != PUBLIC_KEY_LENGTH {
            return Err(ErrorKind::InvalidKeySize.into());
        }
        Ok(Self {
            key: DalekPublicKey::from_bytes(key)?,
        })
    }
}

impl Key for Ed25519PublicKey {
    fn size(&self) -> usize {
        ED25519_SIZE
    }

    fn keyname(&self) -> &'static str {
        ED25519_NAME
    }
}

impl PublicParts for Ed25519PublicKey {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_ed25519_pubkey(&self.key)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        let ed25519_sig = Signature::try_from(sig)?;
        Ok(self.key.verify(data, &ed25519_sig).is_ok())
    }
}

impl PartialEq for Ed25519PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&stringify_ossh_pubkey(self, None).map_err(|_| fmt::Error)?)
    }
}

/// Represent the Ed25519 key pair
pub struct Ed25519KeyPair {
    key: DalekKeypair,
}

impl Key for Ed25519KeyPair {
    fn size(&self) -> usize {
        ED25519_SIZE
    }

    fn keyname(&self) -> &'static str {
        ED25519_NAME
    }
}

impl Ed25519KeyPair {
    /// Generate Ed25519 key pair from the given random source
    ///
    /// The bits parameter should be 256 bits or `0` to use default length (256 bits).
    pub fn generate<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> OsshResult<Self> {
        KeyType::ED25519.resolve_size(Some(bits).filter(|b| *b != 0))?;
        Ok(Ed25519KeyPair {
            key: DalekKeypair::generate(rng),
        })
    }

    /// Build the key pair from the public key and the 64 bytes `seed || public key`
    /// secret OpenSSH stores
    pub(crate) fn from_bytes(pk: &[u8], sk: &[u8]) -> OsshResult<Self> {
        if pk.len() != PUBLIC_KEY_LENGTH {
            return Err(ErrorKind::InvalidKeySize.into());
        }
        if sk.len() != KEYPAIR_LENGTH {
            return Err(ErrorKind::InvalidKeySize.into());
        }
        if pk != &sk[SECRET_KEY_LENGTH..] {
            return Err(Error::with_error(
                ErrorKind::InvalidKey,
                "Ed25519 public key doesn't match the secret key",
            ));
        }
        let secret = DalekSecretKey::from_bytes(&sk[..SECRET_KEY_LENGTH])?;
        let public = DalekPublicKey::from(&secret);
        if public.as_bytes() != pk {
            return Err(Error::with_error(
                ErrorKind::InvalidKey,
                "Ed25519 public key isn't derived from the seed",
            ));
        }
        Ok(Ed25519KeyPair {
            key: DalekKeypair { public, secret },
        })
    }

    pub(crate) fn public_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.key.public.as_bytes()
    }

    /// The `seed || public key` form of the secret
    pub(crate) fn keypair_bytes(&self) -> Zeroizing<[u8; KEYPAIR_LENGTH]> {
        Zeroizing::new(self.key.to_bytes())
    }

    /// Clone the public parts to generate public key
    pub fn clone_public_key(&self) -> Result<Ed25519PublicKey, Error> {
        Ok(Ed25519PublicKey {
            key: self.key.public,
        })
    }
}

impl PublicParts for Ed25519KeyPair {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        encode_ed25519_pubkey(&self.key.public)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        let ed25519_sig = Signature::try_from(sig)?;
        Ok(self.key.verify(data, &ed25519_sig).is_ok())
    }
}

impl PrivateParts for Ed25519KeyPair {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(self.key.sign(data).to_bytes().to_vec())
    }
}

impl PartialEq for Ed25519KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.key.public == other.key.public
            && self.key.secret.as_bytes() == other.key.secret.as_bytes()
    }
}

#[allow(non_upper_case_globals)]
#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::OsRng;

    const pub_str: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIMoWBluPErgKhNja3lHEf7ie6AVzR24mPRd742xEYodC";
    const pub_key: [u8; 0x20] = [
        0xca, 0x16, 0x06, 0x5b, 0x8f, 0x12, 0xb8, 0x0a, 0x84, 0xd8, 0xda, 0xde, 0x51, 0xc4, 0x7f,
        0xb8, 0x9e, 0xe8, 0x05, 0x73, 0x47, 0x6e, 0x26, 0x3d, 0x17, 0x7b, 0xe3, 0x6c, 0x44, 0x62,
        0x87, 0x42,
    ];

    fn get_test_pubkey() -> Result<Ed25519PublicKey, Error> {
        Ok(Ed25519PublicKey::new(&pub_key)?)
    }

    #[test]
    fn ed25519_publickey_serialize() {
        let key = get_test_pubkey().unwrap();
        assert_eq!(key.to_string(), String::from(pub_str));
    }

    #[test]
    fn ed25519_publickey_size() {
        let key = get_test_pubkey().unwrap();
        assert_eq!(key.size(), 256);
    }

    #[test]
    fn ed25519_generate_size() {
        assert!(Ed25519KeyPair::generate(0, &mut OsRng).is_ok());
        assert!(Ed25519KeyPair::generate(256, &mut OsRng).is_ok());
        assert_eq!(
            Ed25519KeyPair::generate(512, &mut OsRng).err().unwrap().kind(),
            ErrorKind::InvalidKeySize
        );
    }

    #[test]
    fn ed25519_rebuild_from_bytes() {
        let key = Ed25519KeyPair::generate(0, &mut OsRng).unwrap();
        let sk = key.keypair_bytes();
        let rebuilt = Ed25519KeyPair::from_bytes(key.public_bytes(), &sk[..]).unwrap();
        assert!(rebuilt == key);

        let other = Ed25519KeyPair::generate(0, &mut OsRng).unwrap();
        let mut mixed = *sk;
        mixed[SECRET_KEY_LENGTH..].copy_from_slice(other.public_bytes());
        assert_eq!(
            Ed25519KeyPair::from_bytes(other.public_bytes(), &mixed)
                .err()
                .unwrap()
                .kind(),
            ErrorKind::InvalidKey
        );
    }
}
