use crate::cipher::Cipher;
use crate::error::*;
use crate::format::ossh_privkey::*;
use crate::format::ossh_pubkey::*;
use crate::identity::{HostIdentity, SystemIdentity};
use crate::params::{Comment, KeyRequest, Passphrase};
use digest::Digest;
use md5::Md5;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Sha256, Sha512};
use std::convert::{TryFrom, TryInto};
use std::fmt;
use std::str::FromStr;

/// DSA key type
pub mod dsa;
/// EcDSA key type
pub mod ecdsa;
/// Ed25519 key type
pub mod ed25519;
/// RSA key type
pub mod rsa;

/// An enum representing the hash function used to generate fingerprint
///
/// Used with [`PublicParts::fingerprint()`](trait.PublicParts.html#method.fingerprint) to generate different types fingerprint.
///
/// # Hash Algorithm
/// MD5: This is the default fingerprint type in older versions of openssh.
///
/// SHA2-256: Since OpenSSH 6.8, this became the default option of fingerprint.
///
/// SHA2-512: Although not being documented, it can also be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintHash {
    MD5,
    SHA256,
    SHA512,
}

impl FingerprintHash {
    fn hash(self, data: &[u8]) -> Vec<u8> {
        fn digest_hash<D: Digest>(hasher: &mut D, data: &[u8]) -> Vec<u8> {
            hasher.update(data);
            hasher.finalize_reset().to_vec()
        }
        match self {
            FingerprintHash::MD5 => digest_hash(&mut Md5::default(), data),
            FingerprintHash::SHA256 => digest_hash(&mut Sha256::default(), data),
            FingerprintHash::SHA512 => digest_hash(&mut Sha512::default(), data),
        }
    }

    /// The prefix `ssh-keygen -l` prints before the digest
    pub fn name(self) -> &'static str {
        match self {
            FingerprintHash::MD5 => "MD5",
            FingerprintHash::SHA256 => "SHA256",
            FingerprintHash::SHA512 => "SHA512",
        }
    }

    /// Render a digest the way `ssh-keygen -l` does
    ///
    /// MD5 digests are printed as colon separated hex, the SHA-2 ones as unpadded base64.
    pub fn render(self, digest: &[u8]) -> String {
        let body = match self {
            FingerprintHash::MD5 => digest
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(":"),
            _ => base64::encode_config(digest, base64::STANDARD_NO_PAD),
        };
        format!("{}:{}", self.name(), body)
    }
}

impl Default for FingerprintHash {
    fn default() -> Self {
        FingerprintHash::SHA256
    }
}

/// An enum representing the type of key being stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyType {
    RSA,
    DSA,
    ECDSA,
    ED25519,
}

impl KeyType {
    /// The lowercase name used to request this type, as `ssh-keygen -t` accepts it
    pub fn name(self) -> &'static str {
        match self {
            KeyType::RSA => "rsa",
            KeyType::DSA => "dsa",
            KeyType::ECDSA => "ecdsa",
            KeyType::ED25519 => "ed25519",
        }
    }

    /// The size used when none is requested
    pub fn default_size(self) -> usize {
        match self {
            KeyType::RSA => 2048,
            KeyType::DSA => 1024,
            KeyType::ECDSA => 256,
            KeyType::ED25519 => 256,
        }
    }

    /// Whether OpenSSH accepts a key of this type with `bits` bits
    ///
    /// - RSA: `1024..=16384`
    /// - DSA: `1024`
    /// - EcDSA: `256`, `384` or `521`
    /// - Ed25519: `256`
    pub fn is_valid_size(self, bits: usize) -> bool {
        match self {
            KeyType::RSA => (1024..=16384).contains(&bits),
            KeyType::DSA => bits == 1024,
            KeyType::ECDSA => bits == 256 || bits == 384 || bits == 521,
            KeyType::ED25519 => bits == 256,
        }
    }

    /// Resolve a requested size to the one a key will be generated with
    pub fn resolve_size(self, bits: Option<usize>) -> OsshResult<usize> {
        let bits = bits.unwrap_or_else(|| self.default_size());
        if self.is_valid_size(bits) {
            Ok(bits)
        } else {
            Err(Error::with_error(
                ErrorKind::InvalidKeySize,
                format!("{} bits is not a valid size for {} keys", bits, self.name()),
            ))
        }
    }
}

impl FromStr for KeyType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsa" => Ok(KeyType::RSA),
            "dsa" => Ok(KeyType::DSA),
            "ecdsa" => Ok(KeyType::ECDSA),
            "ed25519" => Ok(KeyType::ED25519),
            _ => Err(Error::with_error(
                ErrorKind::InvalidKeyType,
                format!("unknown key type \"{}\"", s),
            )),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum PublicKeyType {
    RSA(rsa::RsaPublicKey),
    DSA(dsa::DsaPublicKey),
    ECDSA(ecdsa::EcDsaPublicKey),
    ED25519(ed25519::Ed25519PublicKey),
}

pub(crate) enum KeyPairType {
    RSA(rsa::RsaKeyPair),
    DSA(dsa::DsaKeyPair),
    ECDSA(ecdsa::EcDsaKeyPair),
    ED25519(ed25519::Ed25519KeyPair),
}

impl PartialEq for KeyPairType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyPairType::RSA(a), KeyPairType::RSA(b)) => a == b,
            (KeyPairType::DSA(a), KeyPairType::DSA(b)) => a == b,
            (KeyPairType::ECDSA(a), KeyPairType::ECDSA(b)) => a == b,
            (KeyPairType::ED25519(a), KeyPairType::ED25519(b)) => a == b,
            _ => false,
        }
    }
}

/// General public key type
///
/// This is a type to make it easy to store different types of public key in the container.
/// Each can contain one of the types supported in this crate.
///
/// Public key is usually stored in the `.pub` file when generating the key.
#[derive(Debug, PartialEq)]
pub struct PublicKey {
    pub(crate) key: PublicKeyType,
    comment: String,
}

impl PublicKey {
    /// Parse a line of the OpenSSH public key file
    pub fn from_keystr(keystr: &str) -> OsshResult<Self> {
        parse_ossh_pubkey(keystr)
    }

    pub(crate) fn with_comment(key: PublicKeyType, comment: String) -> Self {
        PublicKey { key, comment }
    }

    /// Indicate the key type being stored
    pub fn keytype(&self) -> KeyType {
        match &self.key {
            PublicKeyType::RSA(_) => KeyType::RSA,
            PublicKeyType::DSA(_) => KeyType::DSA,
            PublicKeyType::ECDSA(_) => KeyType::ECDSA,
            PublicKeyType::ED25519(_) => KeyType::ED25519,
        }
    }

    /// Get the comment of the key
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Serialize as OpenSSH format of the public key
    pub fn serialize(&self) -> OsshResult<String> {
        stringify_ossh_pubkey(self, Some(&self.comment))
    }

    fn inner_key(&self) -> &dyn PublicParts {
        match &self.key {
            PublicKeyType::RSA(key) => key,
            PublicKeyType::DSA(key) => key,
            PublicKeyType::ECDSA(key) => key,
            PublicKeyType::ED25519(key) => key,
        }
    }
}

impl Key for PublicKey {
    fn size(&self) -> usize {
        self.inner_key().size()
    }

    fn keyname(&self) -> &'static str {
        self.inner_key().keyname()
    }
}

impl PublicParts for PublicKey {
    fn blob(&self) -> Result<Vec<u8>, Error> {
        self.inner_key().blob()
    }

    fn fingerprint(&self, hash: FingerprintHash) -> Result<Vec<u8>, Error> {
        self.inner_key().fingerprint(hash)
    }

    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        self.inner_key().verify(data, sig)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.serialize().map_err(|_| fmt::Error)?)
    }
}

impl From<rsa::RsaPublicKey> for PublicKey {
    fn from(inner: rsa::RsaPublicKey) -> PublicKey {
        PublicKey::with_comment(PublicKeyType::RSA(inner), String::new())
    }
}

impl From<dsa::DsaPublicKey> for PublicKey {
    fn from(inner: dsa::DsaPublicKey) -> PublicKey {
        PublicKey::with_comment(PublicKeyType::DSA(inner), String::new())
    }
}

impl From<ecdsa::EcDsaPublicKey> for PublicKey {
    fn from(inner: ecdsa::EcDsaPublicKey) -> PublicKey {
        PublicKey::with_comment(PublicKeyType::ECDSA(inner), String::new())
    }
}

impl From<ed25519::Ed25519PublicKey> for PublicKey {
    fn from(inner: ed25519::Ed25519PublicKey) -> PublicKey {
        PublicKey::with_comment(PublicKeyType::ED25519(inner), String::new())
    }
}

/// General key pair type
///
/// Key pair is the so-called "private key" which contains both public and private parts of an
/// asymmetry key, together with the comment and the passphrase it is stored with.
///
/// The key material never changes after creation. The comment and the passphrase only affect
/// how the key pair is serialized, and the private key envelope is rendered again, with fresh
/// salt and check integers, every time it is requested.
pub struct KeyPair {
    pub(crate) key: KeyPairType,
    comment: Comment,
    passphrase: Passphrase,
}

impl KeyPair {
    pub(crate) fn assemble(key: KeyPairType, comment: Comment, passphrase: Passphrase) -> Self {
        KeyPair {
            key,
            comment,
            passphrase,
        }
    }

    /// Generate a key as requested, using the system random source and identity
    ///
    /// # Key Size
    /// There are some limitations to the key size:
    /// - RSA: the size should `>= 1024` and `<= 16384` bits.
    /// - DSA: the size should be `1024` bits.
    /// - EcDSA: the size should be `256`, `384`, or `521` bits.
    /// - Ed25519: the size should be `256` bits.
    ///
    /// If no size is requested, then it will use the default size to generate the key
    /// - RSA: `2048` bits
    /// - DSA: `1024` bits
    /// - EcDSA: `256` bits
    /// - Ed25519: `256` bits
    ///
    /// Without a requested comment, or with an empty one, the key is labelled `<user>@<host>`.
    pub fn generate(request: &KeyRequest) -> OsshResult<Self> {
        Self::generate_with(request, &mut OsRng, &SystemIdentity)
    }

    /// Generate a key as requested, with an explicit random source and identity
    ///
    /// `rng` provides the Ed25519 key material. RSA, DSA and EcDSA keys are generated by
    /// OpenSSL from its own random source.
    pub fn generate_with<R, I>(request: &KeyRequest, rng: &mut R, identity: &I) -> OsshResult<Self>
    where
        R: RngCore + CryptoRng,
        I: HostIdentity + ?Sized,
    {
        let keytype = request.keytype();
        let bits = keytype.resolve_size(request.requested_bits())?;
        let comment = match request.requested_comment() {
            Some(comment) if !comment.as_str().is_empty() => comment.clone(),
            _ => Comment::try_from(identity.default_comment())?,
        };
        log::debug!("Generating {} key of {} bits", keytype, bits);

        let key = match keytype {
            KeyType::RSA => KeyPairType::RSA(rsa::RsaKeyPair::generate(bits)?),
            KeyType::DSA => KeyPairType::DSA(dsa::DsaKeyPair::generate(bits)?),
            KeyType::ECDSA => KeyPairType::ECDSA(ecdsa::EcDsaKeyPair::generate(bits)?),
            KeyType::ED25519 => KeyPairType::ED25519(ed25519::Ed25519KeyPair::generate(bits, rng)?),
        };
        Ok(Self::assemble(
            key,
            comment,
            request.requested_passphrase().clone(),
        ))
    }

    /// Indicate the key type being stored
    pub fn keytype(&self) -> KeyType {
        match &self.key {
            KeyPairType::RSA(_) => KeyType::RSA,
            KeyPairType::DSA(_) => KeyType::DSA,
            KeyPairType::ECDSA(_) => KeyType::ECDSA,
            KeyPairType::ED25519(_) => KeyType::ED25519,
        }
    }

    /// Get the comment of the key
    pub fn comment(&self) -> &str {
        self.comment.as_str()
    }

    /// Replace the comment
    ///
    /// The new value is validated first; on error the key pair is left untouched.
    pub fn update_comment<C>(&mut self, comment: C) -> OsshResult<()>
    where
        C: TryInto<Comment>,
        Error: From<C::Error>,
    {
        self.comment = comment.try_into()?;
        log::debug!("Comment of the {} key updated", self.keytype());
        Ok(())
    }

    /// Replace the passphrase the private key is serialized with
    ///
    /// An empty passphrase stores the private key unencrypted. The new value is validated
    /// first; on error the key pair is left untouched.
    pub fn update_passphrase<P>(&mut self, passphrase: P) -> OsshResult<()>
    where
        P: TryInto<Passphrase>,
        Error: From<P::Error>,
    {
        self.passphrase = passphrase.try_into()?;
        log::debug!(
            "Passphrase of the {} key {}",
            self.keytype(),
            if self.passphrase.is_empty() { "cleared" } else { "updated" }
        );
        Ok(())
    }

    /// Store the private key unencrypted from now on
    pub fn clear_passphrase(&mut self) {
        self.passphrase = Passphrase::empty();
    }

    /// Whether the private key is encrypted when serialized
    pub fn is_encrypted(&self) -> bool {
        !self.passphrase.is_empty()
    }

    /// The OpenSSH public key line: `<key name> <base64 blob> <comment>`
    ///
    /// An empty comment leaves out the third field, as `ssh-keygen` does.
    ///
    /// The line isn't newline-terminated; [`write_keyfiles()`](#method.write_keyfiles) adds
    /// the terminator when writing the `.pub` file.
    pub fn public_key(&self) -> OsshResult<String> {
        stringify_ossh_pubkey(self, Some(self.comment.as_str()))
    }

    /// The OpenSSH private key envelope, encrypted with `aes256-ctr` if a passphrase is set
    pub fn private_key(&self) -> OsshResult<String> {
        self.private_key_with(&mut OsRng)
    }

    /// Same as [`private_key()`](#method.private_key) with an explicit random source for the
    /// salt and the check integers
    pub fn private_key_with<R: RngCore + CryptoRng>(&self, rng: &mut R) -> OsshResult<String> {
        let cipher = if self.is_encrypted() {
            Cipher::default()
        } else {
            Cipher::Null
        };
        serialize_ossh_privkey(self, self.passphrase.as_bytes(), cipher, rng)
    }

    /// Serialize the keypair to the OpenSSH private key format with the given passphrase and
    /// cipher instead of the stored ones
    ///
    /// If the passphrase is given (set to `Some(...)`) and cipher is not null,
    /// then the generated private key will be encrypted.
    pub fn serialize_openssh(
        &self,
        passphrase: Option<&[u8]>,
        cipher: Cipher,
    ) -> OsshResult<String> {
        match passphrase {
            Some(passphrase) if !passphrase.is_empty() => {
                serialize_ossh_privkey(self, passphrase, cipher, &mut OsRng)
            }
            _ => serialize_ossh_privkey(self, b"", Cipher::Null, &mut OsRng),
        }
    }

    /// Clone the public parts of the key pair
    pub fn clone_public_key(&self) -> Result<PublicKey, Error> {
        let key = match &self.key {
            KeyPairType::RSA(key) => PublicKeyType::RSA(key.clone_public_key()?),
            KeyPairType::DSA(key) => PublicKeyType::DSA(key.clone_public_key()?),
            KeyPairType::ECDSA(key) => PublicKeyType::ECDSA(key.clone_public_key()?),
            KeyPairType::ED25519(key) => PublicKeyType::ED25519(key.clone_public_key()?),
        };
        Ok(PublicKey::with_comment(key, self.comment.as_str().to_owned()))
    }

    /// The fingerprint as `ssh-keygen -l` prints it, e.g. `SHA256:...`
    pub fn fingerprint_string(&self, hash: FingerprintHash) -> OsshResult<String> {
        Ok(hash.render(&self.fingerprint(hash)?))
    }

    fn inner_key(&self) -> &dyn PrivateParts {
        match &self.key {
            KeyPairType::RSA(key) => key,
            KeyPairType::DSA(key) => key,
            KeyPairType::ECDSA(key) => key,
            KeyPairType::ED25519(key) => key,
        }
    }

    fn inner_key_pub(&self) -> &dyn PublicParts {
        match &self.key {
            KeyPairType::RSA(key) => key,
            KeyPairType::DSA(key) => key,
            KeyPairType::ECDSA(key) => key,
            KeyPairType::ED25519(key) => key,
        }
    }
}

impl Key for KeyPair {
    fn size(&self) -> usize {
        self.inner_key().size()
    }
    fn keyname(&self) -> &'static str {
        self.inner_key().keyname()
    }
}

impl PublicParts for KeyPair {
    fn verify(&self, data: &[u8], sig: &[u8]) -> Result<bool, Error> {
        self.inner_key_pub().verify(data, sig)
    }
    fn blob(&self) -> Result<Vec<u8>, Error> {
        self.inner_key_pub().blob()
    }
}

impl PrivateParts for KeyPair {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.inner_key().sign(data)
    }
}

/// Two key pairs are equal when they have the same type, size, comment and key material
///
/// The passphrase only decides how the key is stored and doesn't take part.
impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.keytype() == other.keytype()
            && self.size() == other.size()
            && self.comment == other.comment
            && self.key == other.key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("keytype", &self.keytype())
            .field("size", &self.size())
            .field("comment", &self.comment())
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

impl From<rsa::RsaKeyPair> for KeyPair {
    fn from(inner: rsa::RsaKeyPair) -> KeyPair {
        KeyPair::assemble(KeyPairType::RSA(inner), Comment::default(), Passphrase::empty())
    }
}

impl From<dsa::DsaKeyPair> for KeyPair {
    fn from(inner: dsa::DsaKeyPair) -> KeyPair {
        KeyPair::assemble(KeyPairType::DSA(inner), Comment::default(), Passphrase::empty())
    }
}

impl From<ecdsa::EcDsaKeyPair> for KeyPair {
    fn from(inner: ecdsa::EcDsaKeyPair) -> KeyPair {
        KeyPair::assemble(KeyPairType::ECDSA(inner), Comment::default(), Passphrase::empty())
    }
}

impl From<ed25519::Ed25519KeyPair> for KeyPair {
    fn from(inner: ed25519::Ed25519KeyPair) -> KeyPair {
        KeyPair::assemble(
            KeyPairType::ED25519(inner),
            Comment::default(),
            Passphrase::empty(),
        )
    }
}

/// The basic trait of a key
pub trait Key {
    /// The size in bits of the key
    fn size(&self) -> usize;
    /// The key name of the key
    fn keyname(&self) -> &'static str;
}

/// A trait for operations of a public key
pub trait PublicParts: Key {
    /// Verify the data with a detached signature, returning true if the signature is not malformed
    fn verify(&self, data: &[u8], sig: &[u8]) -> OsshResult<bool>;
    /// Return the binary representation of the public key
    fn blob(&self) -> OsshResult<Vec<u8>>;
    /// Hash the blob of the public key to generate the fingerprint
    fn fingerprint(&self, hash: FingerprintHash) -> OsshResult<Vec<u8>> {
        let b = self.blob()?;
        Ok(hash.hash(&b))
    }
}

/// A trait for operations of a private key
pub trait PrivateParts: Key {
    /// Sign the data with the key, returning the "detached" signature
    fn sign(&self, data: &[u8]) -> OsshResult<Vec<u8>>;
}
