extern crate openssh_keypair;

use openssh_keypair::identity::{FixedIdentity, HostIdentity, SystemIdentity};
use openssh_keypair::keys::*;
use openssh_keypair::{ErrorKind, KeyRequest};
use rand::rngs::OsRng;
use serde_json::json;

mod utils;

fn generate(keytype: KeyType, bits: usize) -> openssh_keypair::OsshResult<KeyPair> {
    KeyPair::generate(&KeyRequest::new(keytype).bits(bits))
}

#[test]
fn rsa_generate() {
    let key = generate(KeyType::RSA, 0).unwrap();
    println!("{}", key.clone_public_key().unwrap());
    assert_eq!(key.keytype(), KeyType::RSA);
    assert_eq!(key.size(), 2048);
    assert_eq!(key.keyname(), "ssh-rsa");
}

#[test]
fn rsa_generate_minsize() {
    assert_eq!(
        generate(KeyType::RSA, 512).unwrap_err().kind(),
        ErrorKind::InvalidKeySize
    );
    assert_eq!(generate(KeyType::RSA, 1024).unwrap().size(), 1024);
}

#[test]
fn rsa_generate_maxsize() {
    assert_eq!(
        generate(KeyType::RSA, 16385).unwrap_err().kind(),
        ErrorKind::InvalidKeySize
    );
    assert_eq!(
        generate(KeyType::RSA, 32768).unwrap_err().kind(),
        ErrorKind::InvalidKeySize
    );
}

#[test]
fn rsa_generate_strange() {
    let key = generate(KeyType::RSA, 2500).unwrap();
    println!("{}", key.clone_public_key().unwrap());
    assert_eq!(key.keytype(), KeyType::RSA);
    assert_eq!(key.size(), 2500);
    assert_eq!(key.keyname(), "ssh-rsa");
}

#[test]
fn dsa_generate() {
    let key = generate(KeyType::DSA, 0).unwrap();
    println!("{}", key.clone_public_key().unwrap());
    assert_eq!(key.keytype(), KeyType::DSA);
    assert_eq!(key.size(), 1024);
    assert_eq!(key.keyname(), "ssh-dss");
}

#[test]
fn dsa_generate_invalid_size() {
    assert_eq!(
        generate(KeyType::DSA, 2048).unwrap_err().kind(),
        ErrorKind::InvalidKeySize
    );
}

#[test]
fn ecdsa_generate() {
    for (bits, name) in [
        (256, "ecdsa-sha2-nistp256"),
        (384, "ecdsa-sha2-nistp384"),
        (521, "ecdsa-sha2-nistp521"),
    ]
    .iter()
    {
        let key = generate(KeyType::ECDSA, *bits).unwrap();
        println!("{}", key.clone_public_key().unwrap());
        assert_eq!(key.keytype(), KeyType::ECDSA);
        assert_eq!(key.size(), *bits);
        assert_eq!(key.keyname(), *name);
    }
}

#[test]
fn ecdsa_generate_default() {
    assert_eq!(generate(KeyType::ECDSA, 0).unwrap().size(), 256);
}

#[test]
fn ecdsa_generate_invalid() {
    assert_eq!(
        generate(KeyType::ECDSA, 512).unwrap_err().kind(),
        ErrorKind::InvalidKeySize
    );
}

#[test]
fn ed25519_generate() {
    let key = generate(KeyType::ED25519, 0).unwrap();
    println!("{}", key.clone_public_key().unwrap());
    assert_eq!(key.keytype(), KeyType::ED25519);
    assert_eq!(key.size(), 256);
    assert_eq!(key.keyname(), "ssh-ed25519");
}

#[test]
fn ed25519_generate_invalid() {
    assert_eq!(
        generate(KeyType::ED25519, 512).unwrap_err().kind(),
        ErrorKind::InvalidKeySize
    );
}

#[test]
fn generate_default_comment() {
    let key = generate(KeyType::ED25519, 0).unwrap();
    assert_eq!(key.comment(), SystemIdentity.default_comment());
    assert!(!key.is_encrypted());
}

#[test]
fn generate_with_fixed_identity() {
    let id = FixedIdentity::new("builder", "ci.example.org");
    let key = KeyPair::generate_with(&KeyRequest::new(KeyType::ECDSA), &mut OsRng, &id).unwrap();
    assert_eq!(key.comment(), "builder@ci.example.org");
    assert!(key
        .public_key()
        .unwrap()
        .ends_with(" builder@ci.example.org"));
}

#[test]
fn generate_from_module_args() {
    let request = KeyRequest::from_json(&json!({
        "type": "ecdsa",
        "size": 384,
        "passphrase": "change_me",
        "comment": "comment",
    }))
    .unwrap();
    let key = KeyPair::generate(&request).unwrap();
    assert_eq!(key.keytype(), KeyType::ECDSA);
    assert_eq!(key.size(), 384);
    assert_eq!(key.comment(), "comment");
    assert!(key.is_encrypted());
}

#[test]
fn generate_rejects_bad_args() {
    let cases = [
        (json!({"type": "unknown"}), ErrorKind::InvalidKeyType),
        (json!({"type": "rsa", "size": 512}), ErrorKind::InvalidKeySize),
        (json!({"type": "dsa", "size": 2048}), ErrorKind::InvalidKeySize),
        (json!({"type": "rsa", "passphrase": [1, 2, 3]}), ErrorKind::InvalidPassphrase),
        (json!({"type": "rsa", "comment": {"a": "b"}}), ErrorKind::InvalidComment),
    ];
    for (args, kind) in cases.iter() {
        let err = KeyRequest::from_json(args)
            .and_then(|request| KeyPair::generate(&request))
            .unwrap_err();
        assert_eq!(err.kind(), *kind);
    }
}
