//! Where the default `user@host` comment of a new key comes from

/// Supplies the user and host names a freshly generated key is labelled with
pub trait HostIdentity {
    fn username(&self) -> String;
    fn hostname(&self) -> String;

    /// The comment `ssh-keygen` would write: `<user>@<host>`
    fn default_comment(&self) -> String {
        format!("{}@{}", self.username(), self.hostname())
    }
}

/// The identity of the running process, as reported by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl HostIdentity for SystemIdentity {
    fn username(&self) -> String {
        whoami::username()
    }

    fn hostname(&self) -> String {
        whoami::fallible::hostname().unwrap_or_else(|e| {
            log::warn!("Unable to query the hostname: {}", e);
            String::from("localhost")
        })
    }
}

/// A fixed identity, for callers that already know who the key belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity {
    user: String,
    host: String,
}

impl FixedIdentity {
    pub fn new<U: Into<String>, H: Into<String>>(user: U, host: H) -> Self {
        FixedIdentity {
            user: user.into(),
            host: host.into(),
        }
    }
}

impl HostIdentity for FixedIdentity {
    fn username(&self) -> String {
        self.user.clone()
    }

    fn hostname(&self) -> String {
        self.host.clone()
    }
}
