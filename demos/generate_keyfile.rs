#[macro_use]
extern crate cfg_if;

use openssh_keypair::error::OsshResult;
use openssh_keypair::keyfile::public_key_path;
use openssh_keypair::{FingerprintHash, KeyPair, KeyRequest, KeyType, Passphrase};
use std::convert::TryFrom;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::*;

fn main() -> OsshResult<()> {
    let filename = "id_ed25519";

    // Generate a keypair protected by a passphrase
    let request = KeyRequest::new(KeyType::ED25519).passphrase(Passphrase::try_from("passw0rd")?);
    let keypair = KeyPair::generate(&request)?;
    keypair.write_keyfiles(filename)?;

    // Only the owner may read the private key
    cfg_if! {
        if #[cfg(unix)] {
            fs::set_permissions(filename, fs::Permissions::from_mode(0o600))?;
        }
    }

    // Load it back and print the public key
    let loaded = KeyPair::load(filename, "passw0rd")?;
    assert!(loaded == keypair);
    println!("{}", loaded.public_key()?);
    println!("{}", loaded.fingerprint_string(FingerprintHash::SHA256)?);
    println!("written to {}", public_key_path(filename).display());
    Ok(())
}
