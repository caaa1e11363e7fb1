use crate::error::*;
use crate::keys::*;

pub(crate) mod ossh_privkey;
pub(crate) mod ossh_pubkey;
pub(crate) mod pkcs8;

/// Parse a private key file
///
/// Besides the OpenSSH envelope, the PKCS#8 and traditional OpenSSL PEM containers are
/// accepted. Keys whose size OpenSSH wouldn't generate are rejected with `InvalidKeySize`.
pub(crate) fn parse_keystr(pem: &[u8], passphrase: &[u8]) -> OsshResult<KeyPair> {
    let pemdata = ::pem::parse(pem)?;

    let keypair = match pemdata.tag() {
        ossh_privkey::OPENSSH_PRIVKEY_TAG => {
            ossh_privkey::decode_ossh_priv(pemdata.contents(), passphrase)?
        }
        pkcs8::PKCS8_TAG
        | pkcs8::PKCS8_ENCRYPTED_TAG
        | pkcs8::RSA_TAG
        | pkcs8::DSA_TAG
        | pkcs8::EC_TAG => pkcs8::decode_pem_privkey(&pemdata, pem, passphrase)?,
        tag => {
            return Err(Error::with_error(
                ErrorKind::UnsupportType,
                format!("unsupported private key block \"{}\"", tag),
            ))
        }
    };

    if !keypair.keytype().is_valid_size(keypair.size()) {
        return Err(Error::with_error(
            ErrorKind::InvalidKeySize,
            format!(
                "{} bits is not a valid size for {} keys",
                keypair.size(),
                keypair.keytype()
            ),
        ));
    }
    Ok(keypair)
}
