#![allow(dead_code)]

extern crate hex;
extern crate openssh_keypair;

use openssh_keypair::keys::*;
use openssh_keypair::{Comment, KeyRequest, Passphrase};
use rand::prelude::*;
use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};

const PASSPHRASE_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*+-_=/\\|()[]{}`~,.<>;:'\"";

pub const KEY_TYPES: [(KeyType, usize); 6] = [
    (KeyType::RSA, 2048),
    (KeyType::DSA, 1024),
    (KeyType::ECDSA, 256),
    (KeyType::ECDSA, 384),
    (KeyType::ECDSA, 521),
    (KeyType::ED25519, 256),
];

#[inline]
pub fn fingerprint_assert(key1: &dyn PublicParts, key2: &dyn PublicParts) {
    assert_eq!(
        key1.fingerprint(FingerprintHash::MD5).unwrap(),
        key2.fingerprint(FingerprintHash::MD5).unwrap()
    );
    assert_eq!(
        key1.fingerprint(FingerprintHash::SHA256).unwrap(),
        key2.fingerprint(FingerprintHash::SHA256).unwrap()
    );
}

// This function is for test only,
// not providing any security protection.
pub fn gen_random_pass(len: usize) -> String {
    let charset_len = PASSPHRASE_CHARSET.len();
    let mut rng = ThreadRng::default();
    (0..len)
        .map(|_| -> char {
            let i = rng.gen_range(0, charset_len);
            PASSPHRASE_CHARSET.as_bytes()[i].into()
        })
        .collect()
}

pub fn fill_random(data: &mut [u8]) {
    let mut rng = ThreadRng::default();
    rng.fill_bytes(data);
}

pub fn create_tmp_folder() -> PathBuf {
    let mut rand: [u8; 8] = [0; 8];
    fill_random(&mut rand);
    let mut path = std::env::temp_dir();
    path.push(format!("openssh-keypair-test-{}", hex::encode(rand)));
    fs::create_dir_all(&path).unwrap();
    path
}

pub fn remove_tmp_folder<P: AsRef<Path>>(path: P) {
    let tmp = std::env::temp_dir().canonicalize().unwrap();
    if path.as_ref().canonicalize().unwrap().starts_with(tmp) {
        fs::remove_dir_all(path).unwrap();
    }
}

/// A key with a fixed comment, so tests don't depend on the host name
pub fn generate_key(keytype: KeyType, bits: usize, passphrase: &str) -> KeyPair {
    let request = KeyRequest::new(keytype)
        .bits(bits)
        .comment(Comment::try_from("openssh-keypair@test").unwrap())
        .passphrase(Passphrase::try_from(passphrase).unwrap());
    KeyPair::generate(&request).unwrap()
}
