//! Typed parameters of a key, and their conversion from loosely typed module arguments
//!
//! Callers driven by configuration (for example JSON module arguments) pass values whose
//! types are only known at runtime. The conversions here are where such a value is
//! rejected when it is not a byte sequence (passphrase) or not text (comment).
use crate::error::{Error, ErrorKind, OsshResult};
use crate::keys::KeyType;
use serde_json::Value;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// The secret protecting a serialized private key
///
/// An empty passphrase means the private key is stored unencrypted.
#[derive(Clone)]
pub struct Passphrase(Zeroizing<Vec<u8>>);

impl Passphrase {
    /// The empty passphrase
    pub fn empty() -> Self {
        Passphrase(Zeroizing::new(Vec::new()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Passphrase {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Passphrase(<empty>)")
        } else {
            f.write_str("Passphrase(<redacted>)")
        }
    }
}

impl TryFrom<&[u8]> for Passphrase {
    type Error = Error;
    fn try_from(value: &[u8]) -> OsshResult<Self> {
        Ok(Passphrase(Zeroizing::new(value.to_vec())))
    }
}

impl TryFrom<Vec<u8>> for Passphrase {
    type Error = Error;
    fn try_from(value: Vec<u8>) -> OsshResult<Self> {
        Ok(Passphrase(Zeroizing::new(value)))
    }
}

impl TryFrom<&str> for Passphrase {
    type Error = Error;
    fn try_from(value: &str) -> OsshResult<Self> {
        Self::try_from(value.as_bytes())
    }
}

impl TryFrom<String> for Passphrase {
    type Error = Error;
    fn try_from(value: String) -> OsshResult<Self> {
        Self::try_from(value.into_bytes())
    }
}

impl TryFrom<&Value> for Passphrase {
    type Error = Error;
    /// `null` is the empty passphrase, a string is taken as its UTF-8 bytes,
    /// anything else is rejected with `InvalidPassphrase`
    fn try_from(value: &Value) -> OsshResult<Self> {
        match value {
            Value::Null => Ok(Self::empty()),
            Value::String(s) => Self::try_from(s.as_str()),
            other => Err(Error::with_error(
                ErrorKind::InvalidPassphrase,
                format!("{} is not a byte sequence", json_type(other)),
            )),
        }
    }
}

/// The free text label of a key
///
/// It is always valid UTF-8 and a single line, since it becomes the trailing field of the
/// public key line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Comment(String);

impl Comment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Comment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Comment {
    type Error = Error;
    fn try_from(value: String) -> OsshResult<Self> {
        if value.contains(|c: char| c == '\n' || c == '\r') {
            return Err(Error::with_error(
                ErrorKind::InvalidComment,
                "comment must be a single line",
            ));
        }
        Ok(Comment(value))
    }
}

impl TryFrom<&str> for Comment {
    type Error = Error;
    fn try_from(value: &str) -> OsshResult<Self> {
        Self::try_from(value.to_owned())
    }
}

impl TryFrom<&String> for Comment {
    type Error = Error;
    fn try_from(value: &String) -> OsshResult<Self> {
        Self::try_from(value.clone())
    }
}

impl TryFrom<Vec<u8>> for Comment {
    type Error = Error;
    fn try_from(value: Vec<u8>) -> OsshResult<Self> {
        let s = String::from_utf8(value)
            .map_err(|e| Error::with_error(ErrorKind::InvalidComment, e))?;
        Self::try_from(s)
    }
}

impl TryFrom<&[u8]> for Comment {
    type Error = Error;
    fn try_from(value: &[u8]) -> OsshResult<Self> {
        Self::try_from(value.to_vec())
    }
}

impl TryFrom<&Value> for Comment {
    type Error = Error;
    /// Only JSON strings are text; everything else is rejected with `InvalidComment`
    fn try_from(value: &Value) -> OsshResult<Self> {
        match value {
            Value::String(s) => Self::try_from(s.as_str()),
            other => Err(Error::with_error(
                ErrorKind::InvalidComment,
                format!("{} cannot be used as text", json_type(other)),
            )),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Everything needed to generate a new key pair
///
/// Unset fields fall back to the defaults of `ssh-keygen`: an RSA key of the default size,
/// no passphrase and a `user@host` comment.
#[derive(Clone, Debug)]
pub struct KeyRequest {
    keytype: KeyType,
    bits: Option<usize>,
    passphrase: Passphrase,
    comment: Option<Comment>,
}

impl KeyRequest {
    pub fn new(keytype: KeyType) -> Self {
        KeyRequest {
            keytype,
            bits: None,
            passphrase: Passphrase::empty(),
            comment: None,
        }
    }

    /// Request a key size in bits, `0` means the default size of the key type
    pub fn bits(mut self, bits: usize) -> Self {
        self.bits = if bits == 0 { None } else { Some(bits) };
        self
    }

    pub fn passphrase(mut self, passphrase: Passphrase) -> Self {
        self.passphrase = passphrase;
        self
    }

    pub fn comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn keytype(&self) -> KeyType {
        self.keytype
    }

    pub fn requested_bits(&self) -> Option<usize> {
        self.bits
    }

    pub fn requested_passphrase(&self) -> &Passphrase {
        &self.passphrase
    }

    pub fn requested_comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    /// Build a request from module arguments
    ///
    /// Recognized keys are `type`, `size`, `passphrase` and `comment`. Missing or `null`
    /// values take the defaults. Errors carry the kind of the offending argument.
    pub fn from_json(args: &Value) -> OsshResult<Self> {
        let empty = serde_json::Map::new();
        let args = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(Error::with_error(
                    ErrorKind::InvalidKeyType,
                    format!("module arguments must be an object, got {}", json_type(other)),
                ))
            }
        };

        let keytype = match args.get("type") {
            None | Some(Value::Null) => KeyType::RSA,
            Some(Value::String(s)) => KeyType::from_str(s)?,
            Some(other) => {
                return Err(Error::with_error(
                    ErrorKind::InvalidKeyType,
                    format!("key type must be a string, got {}", json_type(other)),
                ))
            }
        };

        let mut request = KeyRequest::new(keytype);
        match args.get("size") {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) if n.as_u64().is_some() => {
                let bits = n.as_u64().unwrap_or_default();
                let bits = usize::try_from(bits)
                    .map_err(|e| Error::with_error(ErrorKind::InvalidKeySize, e))?;
                request = request.bits(bits);
            }
            Some(other) => {
                return Err(Error::with_error(
                    ErrorKind::InvalidKeySize,
                    format!("{} is not a valid key size", other),
                ))
            }
        }
        if let Some(passphrase) = args.get("passphrase") {
            request = request.passphrase(Passphrase::try_from(passphrase)?);
        }
        match args.get("comment") {
            None | Some(Value::Null) => {}
            Some(comment) => request = request.comment(Comment::try_from(comment)?),
        }
        Ok(request)
    }
}

impl Default for KeyRequest {
    fn default() -> Self {
        Self::new(KeyType::RSA)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn passphrase_from_json() {
        let p = Passphrase::try_from(&json!("change_me")).unwrap();
        assert_eq!(p.as_bytes(), b"change_me");
        assert!(Passphrase::try_from(&Value::Null).unwrap().is_empty());
        for bad in [json!([1, 2, 3]), json!({"a": 1}), json!(42), json!(true)].iter() {
            assert_eq!(
                Passphrase::try_from(bad).unwrap_err().kind(),
                ErrorKind::InvalidPassphrase
            );
        }
    }

    #[test]
    fn passphrase_debug_is_redacted() {
        let p = Passphrase::try_from("hunter2").unwrap();
        assert!(!format!("{:?}", p).contains("hunter2"));
    }

    #[test]
    fn comment_validation() {
        assert_eq!(Comment::try_from("a comment").unwrap().as_str(), "a comment");
        assert_eq!(
            Comment::try_from(&[0xffu8, 0xfe][..]).unwrap_err().kind(),
            ErrorKind::InvalidComment
        );
        assert_eq!(
            Comment::try_from("two\nlines").unwrap_err().kind(),
            ErrorKind::InvalidComment
        );
        assert_eq!(
            Comment::try_from(&json!([1, 2, 3])).unwrap_err().kind(),
            ErrorKind::InvalidComment
        );
        assert_eq!(
            Comment::try_from(&Value::Null).unwrap_err().kind(),
            ErrorKind::InvalidComment
        );
    }

    #[test]
    fn request_from_json() {
        let req = KeyRequest::from_json(&json!({
            "type": "ecdsa",
            "size": 521,
            "passphrase": "change_me",
            "comment": "comment",
        }))
        .unwrap();
        assert_eq!(req.keytype(), KeyType::ECDSA);
        assert_eq!(req.requested_bits(), Some(521));
        assert_eq!(req.requested_passphrase().as_bytes(), b"change_me");
        assert_eq!(req.requested_comment().unwrap().as_str(), "comment");

        let req = KeyRequest::from_json(&json!({})).unwrap();
        assert_eq!(req.keytype(), KeyType::RSA);
        assert_eq!(req.requested_bits(), None);
        assert!(req.requested_passphrase().is_empty());
        assert!(req.requested_comment().is_none());
    }

    #[test]
    fn request_from_json_rejects() {
        let cases = [
            (json!({"type": "dne"}), ErrorKind::InvalidKeyType),
            (json!({"type": 5}), ErrorKind::InvalidKeyType),
            (json!({"size": "big"}), ErrorKind::InvalidKeySize),
            (json!({"size": -1}), ErrorKind::InvalidKeySize),
            (json!({"type": "rsa", "passphrase": [1, 2, 3], "comment": "comment"}), ErrorKind::InvalidPassphrase),
            (json!({"type": "ecdsa", "comment": [1, 2, 3]}), ErrorKind::InvalidComment),
        ];
        for (args, kind) in cases.iter() {
            assert_eq!(KeyRequest::from_json(args).unwrap_err().kind(), *kind);
        }
    }
}
