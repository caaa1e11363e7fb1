use crate::cipher::Cipher;
use crate::error::*;
use crate::format::ossh_pubkey::encode_ec_point;
use crate::keys::dsa::{DsaKeyPair, DSA_NAME};
use crate::keys::ecdsa::{EcCurve, EcDsaKeyPair};
use crate::keys::ed25519::{Ed25519KeyPair, ED25519_NAME};
use crate::keys::rsa::{RsaKeyPair, RSA_NAME};
use crate::keys::{Key, KeyPair, KeyPairType, PublicParts};
use crate::params::{Comment, Passphrase};
use crate::sshbuf::{SshReadExt, SshWriteExt, ZeroizeReadExt};
use rand::{CryptoRng, RngCore};
use std::convert::TryFrom;
use std::io::{Cursor, Write};
use std::str::FromStr;
use zeroize::Zeroizing;

pub(crate) const OPENSSH_PRIVKEY_TAG: &str = "OPENSSH PRIVATE KEY";
const OPENSSH_MAGIC: &[u8] = b"openssh-key-v1\0";
const KDF_BCRYPT: &str = "bcrypt";
const KDF_NONE: &str = "none";
const KDF_SALT_LEN: usize = 16;
const KDF_ROUNDS: u32 = 16;
// Each round costs a full bcrypt, refuse files that would take minutes to open
const KDF_MAX_ROUNDS: u32 = 1024;
const PEM_LINE_WIDTH: usize = 70;

/// Decode the binary record inside an OpenSSH private key envelope
///
/// The passphrase is kept in the returned key pair only if the record is encrypted.
pub(crate) fn decode_ossh_priv(keydata: &[u8], passphrase: &[u8]) -> OsshResult<KeyPair> {
    if !keydata.starts_with(OPENSSH_MAGIC) {
        return Err(Error::with_error(
            ErrorKind::InvalidKeyFormat,
            "missing openssh-key-v1 magic",
        ));
    }
    let mut reader = Cursor::new(keydata);
    reader.set_position(OPENSSH_MAGIC.len() as u64);

    let cipher = Cipher::from_str(&reader.read_utf8()?)?;
    let kdfname = reader.read_utf8()?;
    let kdfoptions = reader.read_string()?;
    let nkeys = reader.read_uint32()?;
    if nkeys != 1 {
        return Err(Error::with_error(
            ErrorKind::InvalidKeyFormat,
            format!("expected exactly one key, found {}", nkeys),
        ));
    }
    let pubkey_blob = reader.read_string()?;
    let privkey_data = reader.read_string()?;
    if reader.position() as usize != keydata.len() {
        return Err(Error::with_error(
            ErrorKind::InvalidKeyFormat,
            "trailing data after the private key",
        ));
    }

    let decrypted = decrypt_ossh_priv(&privkey_data, passphrase, cipher, &kdfname, &kdfoptions)?;
    let mut secret_reader = Cursor::new(decrypted.as_slice());
    let checkint0 = secret_reader.read_uint32_zeroize()?;
    let checkint1 = secret_reader.read_uint32_zeroize()?;
    if *checkint0 != *checkint1 {
        return Err(Error::with_error(
            ErrorKind::IncorrectPass,
            "check integers don't match",
        ));
    }
    let key = decode_private_fields(&mut secret_reader)?;
    let comment = Comment::try_from(secret_reader.read_string_zeroize()?.to_vec())?;

    let padding = &decrypted[secret_reader.position() as usize..];
    if padding.len() >= cipher.block_size()
        || padding
            .iter()
            .enumerate()
            .any(|(i, b)| *b as usize != i + 1)
    {
        return Err(Error::with_error(
            ErrorKind::InvalidKeyFormat,
            "invalid padding of the private section",
        ));
    }

    let passphrase = if cipher.is_null() {
        if !passphrase.is_empty() {
            log::debug!("Passphrase given for an unencrypted private key, ignored");
        }
        Passphrase::empty()
    } else {
        Passphrase::try_from(passphrase)?
    };
    let keypair = KeyPair::assemble(key, comment, passphrase);
    if keypair.blob()? != pubkey_blob {
        return Err(Error::with_error(
            ErrorKind::InvalidKey,
            "public key in the header doesn't match the private key",
        ));
    }
    log::trace!(
        "Decoded {} bits {} private key",
        keypair.size(),
        keypair.keyname()
    );
    Ok(keypair)
}

fn decrypt_ossh_priv(
    privkey_data: &[u8],
    passphrase: &[u8],
    cipher: Cipher,
    kdfname: &str,
    kdfoptions: &[u8],
) -> OsshResult<Zeroizing<Vec<u8>>> {
    if privkey_data.len() % cipher.block_size() != 0 {
        return Err(Error::with_error(
            ErrorKind::InvalidKeyFormat,
            "private section isn't aligned to the cipher block size",
        ));
    }

    if cipher.is_null() {
        if kdfname != KDF_NONE || !kdfoptions.is_empty() {
            return Err(Error::with_error(
                ErrorKind::InvalidKeyFormat,
                "unencrypted key with KDF parameters",
            ));
        }
        return Ok(Zeroizing::new(privkey_data.to_vec()));
    }

    if kdfname != KDF_BCRYPT {
        return Err(Error::with_error(
            ErrorKind::UnsupportCipher,
            format!("unsupported KDF \"{}\"", kdfname),
        ));
    }
    if passphrase.is_empty() {
        return Err(Error::with_error(
            ErrorKind::IncorrectPass,
            "the private key is encrypted",
        ));
    }
    let mut kdfreader = Cursor::new(kdfoptions);
    let salt = kdfreader.read_string()?;
    let rounds = kdfreader.read_uint32()?;
    if rounds == 0 || rounds > KDF_MAX_ROUNDS {
        return Err(Error::with_error(
            ErrorKind::InvalidKeyFormat,
            format!("bcrypt rounds {} out of range", rounds),
        ));
    }

    let keyiv = derive_key(passphrase, &salt, rounds, cipher)?;
    let (key, iv) = keyiv.split_at(cipher.key_len());
    Ok(Zeroizing::new(cipher.decrypt(privkey_data, key, iv)?))
}

fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    rounds: u32,
    cipher: Cipher,
) -> OsshResult<Zeroizing<Vec<u8>>> {
    let mut keyiv = Zeroizing::new(vec![0u8; cipher.key_len() + cipher.iv_len()]);
    bcrypt_pbkdf::bcrypt_pbkdf(passphrase, salt, rounds, &mut keyiv)?;
    Ok(keyiv)
}

fn decode_private_fields(reader: &mut Cursor<&[u8]>) -> OsshResult<KeyPairType> {
    let keyname = reader.read_utf8()?;
    Ok(match keyname.as_str() {
        RSA_NAME => {
            let n = reader.read_mpint()?;
            let e = reader.read_mpint()?;
            let d = reader.read_mpint_zeroize()?;
            let iqmp = reader.read_mpint_zeroize()?;
            let p = reader.read_mpint_zeroize()?;
            let q = reader.read_mpint_zeroize()?;
            KeyPairType::RSA(RsaKeyPair::from_components(n, e, d, iqmp, p, q)?)
        }
        DSA_NAME => {
            let p = reader.read_mpint()?;
            let q = reader.read_mpint()?;
            let g = reader.read_mpint()?;
            let y = reader.read_mpint()?;
            let x = reader.read_mpint_zeroize()?;
            KeyPairType::DSA(DsaKeyPair::from_components(p, q, g, y, x)?)
        }
        ED25519_NAME => {
            let pk = reader.read_string()?;
            let sk = reader.read_string_zeroize()?;
            KeyPairType::ED25519(Ed25519KeyPair::from_bytes(&pk, &sk)?)
        }
        name if name.starts_with("ecdsa-sha2-") => {
            let curve = EcCurve::from_name(name)?;
            if EcCurve::from_str(&reader.read_utf8()?)? != curve {
                return Err(ErrorKind::TypeNotMatch.into());
            }
            let point = reader.read_string()?;
            let d = reader.read_mpint_zeroize()?;
            KeyPairType::ECDSA(EcDsaKeyPair::from_bytes(curve, &point, &d)?)
        }
        name => {
            return Err(Error::with_error(
                ErrorKind::UnsupportType,
                format!("unsupported key type \"{}\"", name),
            ))
        }
    })
}

fn encode_private_fields(buf: &mut Vec<u8>, key: &KeyPairType) -> OsshResult<()> {
    match key {
        KeyPairType::RSA(key) => {
            let rsa = key.ossl_rsa();
            let missing = || Error::with_error(ErrorKind::InvalidKey, "RSA key without CRT parameters");
            buf.write_utf8(RSA_NAME)?;
            buf.write_mpint(rsa.n())?;
            buf.write_mpint(rsa.e())?;
            buf.write_mpint(rsa.d())?;
            buf.write_mpint(rsa.iqmp().ok_or_else(missing)?)?;
            buf.write_mpint(rsa.p().ok_or_else(missing)?)?;
            buf.write_mpint(rsa.q().ok_or_else(missing)?)?;
        }
        KeyPairType::DSA(key) => {
            let dsa = key.ossl_dsa();
            buf.write_utf8(DSA_NAME)?;
            buf.write_mpint(dsa.p())?;
            buf.write_mpint(dsa.q())?;
            buf.write_mpint(dsa.g())?;
            buf.write_mpint(dsa.pub_key())?;
            buf.write_mpint(dsa.priv_key())?;
        }
        KeyPairType::ECDSA(key) => {
            let ec = key.ossl_ec();
            buf.write_utf8(key.curve().name())?;
            buf.write_utf8(key.curve().ident())?;
            buf.write_string(&encode_ec_point(ec)?)?;
            buf.write_mpint(ec.private_key())?;
        }
        KeyPairType::ED25519(key) => {
            buf.write_utf8(ED25519_NAME)?;
            buf.write_string(key.public_bytes())?;
            buf.write_string(&key.keypair_bytes()[..])?;
        }
    }
    Ok(())
}

/// Encode the binary record of an OpenSSH private key
///
/// The key is encrypted when the passphrase is not empty and the cipher is not null.
pub(crate) fn encode_ossh_priv<R: RngCore + CryptoRng>(
    keypair: &KeyPair,
    passphrase: &[u8],
    cipher: Cipher,
    rng: &mut R,
) -> OsshResult<Vec<u8>> {
    let cipher = if passphrase.is_empty() {
        Cipher::Null
    } else {
        cipher
    };

    let mut secret = Zeroizing::new(Vec::new());
    {
        let buf: &mut Vec<u8> = &mut secret;
        let checkint = Zeroizing::new(rng.next_u32());
        buf.write_uint32(*checkint)?;
        buf.write_uint32(*checkint)?;
        encode_private_fields(buf, &keypair.key)?;
        buf.write_utf8(keypair.comment())?;
        let mut pad = 0u8;
        while buf.len() % cipher.block_size() != 0 {
            pad = pad.wrapping_add(1);
            buf.push(pad);
        }
    }

    let mut output = Cursor::new(Vec::new());
    output.write_all(OPENSSH_MAGIC)?;
    output.write_utf8(cipher.name())?;
    if cipher.is_null() {
        output.write_utf8(KDF_NONE)?;
        output.write_string(&[])?;
        output.write_uint32(1)?;
        output.write_string(&keypair.blob()?)?;
        output.write_string(&secret)?;
    } else {
        let mut salt = [0u8; KDF_SALT_LEN];
        rng.fill_bytes(&mut salt);
        let mut kdfoptions = Vec::new();
        kdfoptions.write_string(&salt)?;
        kdfoptions.write_uint32(KDF_ROUNDS)?;

        let keyiv = derive_key(passphrase, &salt, KDF_ROUNDS, cipher)?;
        let (key, iv) = keyiv.split_at(cipher.key_len());
        let encrypted = cipher.encrypt(&secret, key, iv)?;

        output.write_utf8(KDF_BCRYPT)?;
        output.write_string(&kdfoptions)?;
        output.write_uint32(1)?;
        output.write_string(&keypair.blob()?)?;
        output.write_string(&encrypted)?;
    }
    Ok(output.into_inner())
}

/// Render the OpenSSH private key envelope the way `ssh-keygen` writes it
pub(crate) fn serialize_ossh_privkey<R: RngCore + CryptoRng>(
    keypair: &KeyPair,
    passphrase: &[u8],
    cipher: Cipher,
    rng: &mut R,
) -> OsshResult<String> {
    let binary = encode_ossh_priv(keypair, passphrase, cipher, rng)?;
    let envelope = pem::Pem::new(OPENSSH_PRIVKEY_TAG, binary);
    Ok(pem::encode_config(
        &envelope,
        pem::EncodeConfig::new()
            .set_line_ending(pem::LineEnding::LF)
            .set_line_wrap(PEM_LINE_WIDTH),
    ))
}
