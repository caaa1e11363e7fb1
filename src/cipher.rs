use crate::error::{Error, ErrorKind, OsshResult};
use openssl::symm::{Cipher as OsslCipher, Crypter, Mode};
use std::str::FromStr;

/// The symmetric ciphers an OpenSSH private key can be protected with
///
/// Data passed in must already be aligned to [`block_size()`](#method.block_size);
/// no padding is added or removed here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(non_camel_case_types)]
#[non_exhaustive]
pub enum Cipher {
    Aes128_Cbc,
    Aes192_Cbc,
    Aes256_Cbc,
    Aes128_Ctr,
    Aes192_Ctr,
    Aes256_Ctr,
    TDes_Cbc,
    Null,
}

impl Cipher {
    /// Encrypt `src`; `key` and `iv` must match [`key_len()`](#method.key_len) and [`iv_len()`](#method.iv_len)
    pub fn encrypt(self, src: &[u8], key: &[u8], iv: &[u8]) -> OsshResult<Vec<u8>> {
        self.crypt(Mode::Encrypt, src, key, iv)
    }

    /// Decrypt `src`; `key` and `iv` must match [`key_len()`](#method.key_len) and [`iv_len()`](#method.iv_len)
    pub fn decrypt(self, src: &[u8], key: &[u8], iv: &[u8]) -> OsshResult<Vec<u8>> {
        self.crypt(Mode::Decrypt, src, key, iv)
    }

    fn crypt(self, mode: Mode, src: &[u8], key: &[u8], iv: &[u8]) -> OsshResult<Vec<u8>> {
        let cipher = match self.ossl_cipher() {
            Some(cipher) => cipher,
            None => return Ok(src.to_vec()),
        };
        if src.len() % self.block_size() != 0 {
            return Err(ErrorKind::InvalidKeyFormat.into());
        }
        if key.len() != self.key_len() || iv.len() != self.iv_len() {
            return Err(ErrorKind::UnsupportCipher.into());
        }

        let mut crypter = Crypter::new(cipher, mode, key, Some(iv))?;
        crypter.pad(false);
        let mut out = vec![0; src.len() + cipher.block_size()];
        let mut n = crypter.update(src, &mut out)?;
        n += crypter.finalize(&mut out[n..])?;
        out.truncate(n);
        Ok(out)
    }

    fn ossl_cipher(self) -> Option<OsslCipher> {
        use Cipher::*;
        match self {
            Aes128_Cbc => Some(OsslCipher::aes_128_cbc()),
            Aes192_Cbc => Some(OsslCipher::aes_192_cbc()),
            Aes256_Cbc => Some(OsslCipher::aes_256_cbc()),
            Aes128_Ctr => Some(OsslCipher::aes_128_ctr()),
            Aes192_Ctr => Some(OsslCipher::aes_192_ctr()),
            Aes256_Ctr => Some(OsslCipher::aes_256_ctr()),
            TDes_Cbc => Some(OsslCipher::des_ede3_cbc()),
            Null => None,
        }
    }

    /// The key length in bytes
    pub fn key_len(self) -> usize {
        use Cipher::*;
        match self {
            Aes128_Cbc | Aes128_Ctr => 16,
            Aes192_Cbc | Aes192_Ctr => 24,
            Aes256_Cbc | Aes256_Ctr => 32,
            TDes_Cbc => 24,
            Null => 0,
        }
    }

    /// The IV length in bytes
    pub fn iv_len(self) -> usize {
        use Cipher::*;
        match self {
            TDes_Cbc => 8,
            Null => 0,
            _ => 16,
        }
    }

    /// The block size the private section is padded to
    ///
    /// OpenSSH pads unencrypted keys to 8 bytes.
    pub fn block_size(self) -> usize {
        use Cipher::*;
        match self {
            TDes_Cbc | Null => 8,
            _ => 16,
        }
    }

    /// The cipher name used in the OpenSSH private key format
    pub fn name(self) -> &'static str {
        use Cipher::*;
        match self {
            Aes128_Cbc => "aes128-cbc",
            Aes192_Cbc => "aes192-cbc",
            Aes256_Cbc => "aes256-cbc",
            Aes128_Ctr => "aes128-ctr",
            Aes192_Ctr => "aes192-ctr",
            Aes256_Ctr => "aes256-ctr",
            TDes_Cbc => "3des-cbc",
            Null => "none",
        }
    }

    /// Whether the cipher actually encrypts data
    pub fn is_null(self) -> bool {
        self == Cipher::Null
    }
}

impl Default for Cipher {
    /// `aes256-ctr`, the cipher `ssh-keygen` uses for new keys
    fn default() -> Self {
        Cipher::Aes256_Ctr
    }
}

impl FromStr for Cipher {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Cipher::*;
        match s {
            "3des-cbc" => Ok(TDes_Cbc),
            "aes128-cbc" => Ok(Aes128_Cbc),
            "aes192-cbc" => Ok(Aes192_Cbc),
            "aes256-cbc" | "rijndael-cbc@lysator.liu.se" => Ok(Aes256_Cbc),
            "aes128-ctr" => Ok(Aes128_Ctr),
            "aes192-ctr" => Ok(Aes192_Ctr),
            "aes256-ctr" => Ok(Aes256_Ctr),
            "none" => Ok(Null),
            _ => Err(ErrorKind::UnsupportCipher.into()),
        }
    }
}
