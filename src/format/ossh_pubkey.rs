use crate::error::*;
use crate::keys::dsa::{DsaPublicKey, DSA_NAME};
use crate::keys::ecdsa::{EcCurve, EcDsaPublicKey};
use crate::keys::ed25519::{Ed25519PublicKey, ED25519_NAME};
use crate::keys::rsa::{RsaPublicKey, RSA_NAME};
use crate::keys::{Key, PublicKey, PublicKeyType, PublicParts};
use crate::sshbuf::{SshReadExt, SshWriteExt};
use ed25519_dalek::PublicKey as Ed25519PubKey;
use openssl::bn::BigNumContext;
use openssl::dsa::DsaRef;
use openssl::ec::{EcKeyRef, PointConversionForm};
use openssl::pkey::{HasParams, HasPublic};
use openssl::rsa::RsaRef;
use std::fmt::Write as _;
use std::io;
use std::str::FromStr;

/// Parse a line of an OpenSSH `.pub` file: `<key name> <base64 blob> [comment]`
///
/// Everything after the blob, spaces included, is the comment.
pub fn parse_ossh_pubkey(keystr: &str) -> OsshResult<PublicKey> {
    let (keyname, rest) = split_token(keystr.trim_end());
    let (body, comment) = split_token(rest);
    if keyname.is_empty() || body.is_empty() {
        return Err(Error::with_error(
            ErrorKind::InvalidKeyFormat,
            "public key line needs a key name and a key body",
        ));
    }
    let blob = base64::decode(body)?;
    let key = decode_pubkey_blob(&blob)?;
    let pubkey = PublicKey::with_comment(key, comment.to_owned());
    if pubkey.keyname() != keyname {
        return Err(Error::with_error(
            ErrorKind::TypeNotMatch,
            format!(
                "key name \"{}\" doesn't match the {} key body",
                keyname,
                pubkey.keyname()
            ),
        ));
    }
    Ok(pubkey)
}

fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Decode a public key blob, the type being taken from the name it starts with
pub(crate) fn decode_pubkey_blob(keyblob: &[u8]) -> OsshResult<PublicKeyType> {
    let keyname = io::Cursor::new(keyblob).read_utf8()?;
    Ok(match keyname.as_str() {
        RSA_NAME => PublicKeyType::RSA(decode_rsa_pubkey(keyblob)?),
        DSA_NAME => PublicKeyType::DSA(decode_dsa_pubkey(keyblob)?),
        ED25519_NAME => PublicKeyType::ED25519(decode_ed25519_pubkey(keyblob)?),
        name if name.starts_with("ecdsa-sha2-") => {
            PublicKeyType::ECDSA(decode_ecdsa_pubkey(keyblob, Some(EcCurve::from_name(name)?))?)
        }
        name => {
            return Err(Error::with_error(
                ErrorKind::UnsupportType,
                format!("unsupported key type \"{}\"", name),
            ))
        }
    })
}

pub(crate) fn decode_rsa_pubkey(keyblob: &[u8]) -> OsshResult<RsaPublicKey> {
    let mut reader = io::Cursor::new(keyblob);
    if reader.read_utf8()? != RSA_NAME {
        return Err(ErrorKind::TypeNotMatch.into());
    }
    let e = reader.read_mpint()?;
    let n = reader.read_mpint()?;

    RsaPublicKey::new(n, e)
}

pub(crate) fn decode_dsa_pubkey(keyblob: &[u8]) -> OsshResult<DsaPublicKey> {
    let mut reader = io::Cursor::new(keyblob);
    if reader.read_utf8()? != DSA_NAME {
        return Err(ErrorKind::TypeNotMatch.into());
    }

    let p = reader.read_mpint()?;
    let q = reader.read_mpint()?;
    let g = reader.read_mpint()?;
    let y = reader.read_mpint()?;

    DsaPublicKey::new(p, q, g, y)
}

pub(crate) fn decode_ecdsa_pubkey(
    keyblob: &[u8],
    curve_hint: Option<EcCurve>,
) -> OsshResult<EcDsaPublicKey> {
    let mut reader = io::Cursor::new(keyblob);
    let name_curve = EcCurve::from_name(&reader.read_utf8()?)?;
    let curve = EcCurve::from_str(&reader.read_utf8()?)?;
    if curve != name_curve {
        return Err(ErrorKind::TypeNotMatch.into());
    }
    if let Some(curve_hint) = curve_hint {
        if curve != curve_hint {
            return Err(ErrorKind::TypeNotMatch.into());
        }
    }
    let pub_key = reader.read_string()?;

    EcDsaPublicKey::from_bytes(curve, &pub_key)
}

pub(crate) fn decode_ed25519_pubkey(keyblob: &[u8]) -> OsshResult<Ed25519PublicKey> {
    let mut reader = io::Cursor::new(keyblob);
    if reader.read_utf8()? != ED25519_NAME {
        return Err(ErrorKind::TypeNotMatch.into());
    }

    let pub_key = reader.read_string()?;
    Ed25519PublicKey::from_slice(&pub_key)
}

/// Render a public key line; an empty or missing comment leaves the comment field out
pub(crate) fn stringify_ossh_pubkey(
    key: &dyn PublicParts,
    comment: Option<&str>,
) -> OsshResult<String> {
    let mut keystr = String::new();
    write!(
        &mut keystr,
        "{} {}",
        key.keyname(),
        base64::encode(&key.blob()?)
    )?;
    if let Some(comment) = comment.filter(|c| !c.is_empty()) {
        write!(&mut keystr, " {}", comment)?;
    }
    Ok(keystr)
}

pub(crate) fn encode_rsa_pubkey<T: HasPublic + HasParams>(key: &RsaRef<T>) -> OsshResult<Vec<u8>> {
    let mut buf = io::Cursor::new(Vec::new());

    buf.write_utf8(RSA_NAME)?;
    buf.write_mpint(key.e())?;
    buf.write_mpint(key.n())?;

    Ok(buf.into_inner())
}

pub(crate) fn encode_dsa_pubkey<T: HasPublic + HasParams>(key: &DsaRef<T>) -> OsshResult<Vec<u8>> {
    let mut buf = io::Cursor::new(Vec::new());

    buf.write_utf8(DSA_NAME)?;
    buf.write_mpint(key.p())?;
    buf.write_mpint(key.q())?;
    buf.write_mpint(key.g())?;
    buf.write_mpint(key.pub_key())?;

    Ok(buf.into_inner())
}

pub(crate) fn encode_ecdsa_pubkey<T: HasPublic + HasParams>(
    curve: EcCurve,
    key: &EcKeyRef<T>,
) -> OsshResult<Vec<u8>> {
    let mut buf = io::Cursor::new(Vec::new());

    buf.write_utf8(curve.name())?;
    buf.write_utf8(curve.ident())?;
    buf.write_string(&encode_ec_point(key)?)?;

    Ok(buf.into_inner())
}

/// The uncompressed SEC1 encoding of the public point, as stored in OpenSSH keys
pub(crate) fn encode_ec_point<T: HasPublic + HasParams>(key: &EcKeyRef<T>) -> OsshResult<Vec<u8>> {
    let mut bn_ctx = BigNumContext::new()?;
    Ok(key.public_key().to_bytes(
        key.group(),
        PointConversionForm::UNCOMPRESSED,
        &mut bn_ctx,
    )?)
}

pub(crate) fn encode_ed25519_pubkey(pub_key: &Ed25519PubKey) -> OsshResult<Vec<u8>> {
    let mut buf = io::Cursor::new(Vec::new());

    buf.write_utf8(ED25519_NAME)?;
    buf.write_string(pub_key.as_bytes())?;

    Ok(buf.into_inner())
}
