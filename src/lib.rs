//! Generate, load, store and compare OpenSSH key pairs
//!
//! A [`KeyPair`](keys/struct.KeyPair.html) holds RSA, DSA, EcDSA or Ed25519 key material
//! together with a comment and the passphrase its private key is stored with. It reads and
//! writes the files `ssh-keygen` does: the `OPENSSH PRIVATE KEY` envelope and the one line
//! `.pub` file.
//!
//! ```no_run
//! use openssh_keypair::{KeyPair, KeyRequest, KeyType, Passphrase};
//! use std::convert::TryFrom;
//!
//! # fn main() -> openssh_keypair::error::OsshResult<()> {
//! let request = KeyRequest::new(KeyType::ED25519)
//!     .passphrase(Passphrase::try_from("correct horse")?);
//! let mut key = KeyPair::generate(&request)?;
//! key.update_comment("deploy@ci")?;
//! key.write_keyfiles("id_ed25519")?;
//!
//! let loaded = KeyPair::load("id_ed25519", "correct horse")?;
//! assert!(loaded == key);
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod error;
pub(crate) mod format;
pub mod identity;
pub mod keyfile;
pub mod keys;
pub mod params;
pub mod sshbuf;

pub use cipher::Cipher;
pub use error::{Error, ErrorKind, OsshResult};
pub use identity::{FixedIdentity, HostIdentity, SystemIdentity};
pub use keys::{FingerprintHash, Key, KeyPair, KeyType, PrivateParts, PublicKey, PublicParts};
pub use params::{Comment, KeyRequest, Passphrase};
