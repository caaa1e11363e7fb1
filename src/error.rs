use backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// The result type of this crate
pub type OsshResult<T> = Result<T, Error>;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The error type of this crate
///
/// Every error carries an [`ErrorKind`](enum.ErrorKind.html) which callers should match on.
/// The lower level error which caused it, if any, is reachable through `source()`.
pub struct Error {
    kind: ErrorKind,
    inner: Option<BoxError>,
    backtrace: Backtrace,
}

impl Error {
    pub(crate) fn from_kind(kind: ErrorKind) -> Self {
        Error {
            kind,
            inner: None,
            backtrace: Backtrace::new_unresolved(),
        }
    }

    pub(crate) fn with_error<E: Into<BoxError>>(kind: ErrorKind, err: E) -> Self {
        Error {
            kind,
            inner: Some(err.into()),
            backtrace: Backtrace::new_unresolved(),
        }
    }

    /// Put this error under another kind, keeping the original one as the source
    pub(crate) fn reclassify(self, kind: ErrorKind) -> Self {
        if self.kind == kind {
            self
        } else {
            Self::with_error(kind, self)
        }
    }

    /// Get the kind of the error
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the backtrace captured when the error was created
    pub fn backtrace(&self) -> Backtrace {
        let mut bt = self.backtrace.clone();
        bt.resolve();
        bt
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("inner", &self.inner)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.kind)?;
        if let Some(cause) = &self.inner {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::with_error(ErrorKind::IOError, err)
    }
}
impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::with_error(ErrorKind::FmtError, err)
    }
}
impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::with_error(ErrorKind::InvalidKeyFormat, err)
    }
}
impl From<openssl::error::ErrorStack> for Error {
    fn from(err: openssl::error::ErrorStack) -> Self {
        Self::with_error(ErrorKind::OpenSslError, err)
    }
}
impl From<ed25519_dalek::SignatureError> for Error {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        Self::with_error(ErrorKind::Ed25519Error, err)
    }
}
impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::with_error(ErrorKind::Base64Error, err)
    }
}
impl From<pem::PemError> for Error {
    fn from(err: pem::PemError) -> Self {
        Self::with_error(ErrorKind::InvalidPemFormat, err)
    }
}
impl From<bcrypt_pbkdf::Error> for Error {
    fn from(err: bcrypt_pbkdf::Error) -> Self {
        Self::with_error(ErrorKind::KdfError, err.to_string())
    }
}

/// Indicate the reason of the error
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The requested key type is unknown or unsupported
    InvalidKeyType,
    /// The key size is not allowed for the key type
    InvalidKeySize,
    /// The passphrase value is not a byte sequence
    InvalidPassphrase,
    /// The comment value is not UTF-8 text
    InvalidComment,
    /// The private key file is malformed, or fails to decrypt consistently
    InvalidPrivateKeyFile,
    /// The public key file doesn't match the private key
    InvalidPublicKeyFile,
    OpenSslError,
    Ed25519Error,
    IOError,
    FmtError,
    Base64Error,
    InvalidPemFormat,
    InvalidKeyFormat,
    InvalidKey,
    IncorrectPass,
    TypeNotMatch,
    UnsupportType,
    UnsupportCurve,
    UnsupportCipher,
    KdfError,
}

impl ErrorKind {
    /// A human readable name of the kind
    pub fn name(self) -> &'static str {
        use ErrorKind::*;

        match self {
            InvalidKeyType => "Invalid Key Type",
            InvalidKeySize => "Invalid Key Size",
            InvalidPassphrase => "Invalid Passphrase",
            InvalidComment => "Invalid Comment",
            InvalidPrivateKeyFile => "Invalid Private Key File",
            InvalidPublicKeyFile => "Invalid Public Key File",
            OpenSslError => "OpenSSL Error",
            Ed25519Error => "Ed25519 Error",
            IOError => "I/O Error",
            FmtError => "Formatter Error",
            Base64Error => "Base64 Error",
            InvalidPemFormat => "Invalid PEM Format",
            InvalidKeyFormat => "Invalid Key Format",
            InvalidKey => "Invalid Key",
            IncorrectPass => "Incorrect Passphrase",
            TypeNotMatch => "Key Type Not Match",
            UnsupportType => "Unsupported Key Type",
            UnsupportCurve => "Unsupported Elliptic Curve",
            UnsupportCipher => "Unsupported Cipher",
            KdfError => "Key Derivation Error",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reclassify_keeps_source() {
        let err = Error::from_kind(ErrorKind::IncorrectPass).reclassify(ErrorKind::InvalidPrivateKeyFile);
        assert_eq!(err.kind(), ErrorKind::InvalidPrivateKeyFile);
        let source = err.source().unwrap().downcast_ref::<Error>().unwrap();
        assert_eq!(source.kind(), ErrorKind::IncorrectPass);
        assert_eq!(
            err.to_string(),
            "Invalid Private Key File: Incorrect Passphrase"
        );
    }

    #[test]
    fn reclassify_same_kind_is_noop() {
        let err = Error::from_kind(ErrorKind::InvalidComment).reclassify(ErrorKind::InvalidComment);
        assert!(err.source().is_none());
    }
}
