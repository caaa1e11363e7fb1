//! Reading and writing OpenSSH key files
//!
//! A key is stored as two files: the private key envelope at the given path, and the public
//! key line next to it with a `.pub` suffix. Each file is opened, fully read or written, and
//! closed within a single call. Setting file permissions is left to the caller.
use crate::error::{Error, ErrorKind, OsshResult};
use crate::format::ossh_pubkey::parse_ossh_pubkey;
use crate::format::parse_keystr;
use crate::keys::{KeyPair, PublicParts};
use crate::params::Passphrase;
use std::convert::TryInto;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// The path of the public key file belonging to a private key file
pub fn public_key_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut pubpath = OsString::from(path.as_ref().as_os_str());
    pubpath.push(".pub");
    PathBuf::from(pubpath)
}

impl KeyPair {
    /// Load a key pair from an OpenSSH private key file
    ///
    /// An empty passphrase is enough for unencrypted keys. If a `.pub` file exists next to the
    /// private key, it has to hold the same public key, but its comment is ignored: the
    /// comment comes from the private key.
    ///
    /// # Errors
    /// - `IOError` if the private key file can't be read.
    /// - `InvalidPassphrase` if `passphrase` is not a byte sequence.
    /// - `InvalidPrivateKeyFile` if the file is not a valid OpenSSH private key or the
    ///   passphrase is wrong. The underlying error is kept as the source.
    /// - `InvalidPublicKeyFile` if the `.pub` file is malformed or holds another key.
    pub fn load<P, S>(path: P, passphrase: S) -> OsshResult<Self>
    where
        P: AsRef<Path>,
        S: TryInto<Passphrase>,
        Error: From<S::Error>,
    {
        let passphrase = passphrase.try_into()?;
        let path = path.as_ref();
        log::debug!("Loading private key from {}", path.display());

        let privdata = fs::read(path)?;
        let keypair = parse_keystr(&privdata, passphrase.as_bytes())
            .map_err(|e| e.reclassify(ErrorKind::InvalidPrivateKeyFile))?;

        let pubpath = public_key_path(path);
        match fs::read_to_string(&pubpath) {
            Ok(pubdata) => {
                let pubkey = parse_ossh_pubkey(&pubdata)
                    .map_err(|e| e.reclassify(ErrorKind::InvalidPublicKeyFile))?;
                let expected = keypair
                    .blob()
                    .map_err(|e| e.reclassify(ErrorKind::InvalidPrivateKeyFile))?;
                let found = pubkey
                    .blob()
                    .map_err(|e| e.reclassify(ErrorKind::InvalidPublicKeyFile))?;
                if expected != found {
                    return Err(Error::with_error(
                        ErrorKind::InvalidPublicKeyFile,
                        format!(
                            "{} doesn't hold the public key of {}",
                            pubpath.display(),
                            path.display()
                        ),
                    ));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No public key file at {}", pubpath.display());
            }
            Err(e) => return Err(Error::with_error(ErrorKind::InvalidPublicKeyFile, e)),
        }
        Ok(keypair)
    }

    /// Write the private key envelope to `path` and the public key line to `path.pub`
    ///
    /// The private key is encrypted if a passphrase is set. Existing files are overwritten.
    pub fn write_keyfiles<P: AsRef<Path>>(&self, path: P) -> OsshResult<()> {
        let path = path.as_ref();
        let privkey = Zeroizing::new(self.private_key()?);
        let pubkey = self.public_key()?;

        fs::write(path, privkey.as_bytes())?;
        fs::write(public_key_path(path), format!("{}\n", pubkey))?;
        log::debug!(
            "Wrote {} key pair to {}",
            self.keytype(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pubkey_path_suffix() {
        assert_eq!(
            public_key_path("/tmp/keys/id_ed25519"),
            PathBuf::from("/tmp/keys/id_ed25519.pub")
        );
        assert_eq!(public_key_path("id.key"), PathBuf::from("id.key.pub"));
    }
}
