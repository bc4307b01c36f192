//! Session identity.
//!
//! The instance id is what lets the server recognize a returning client
//! across reconnects, so it is generated once and then carried through every
//! reconnect attempt unchanged.

use std::fmt;

/// Stable client instance id: 32 lowercase hex characters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    /// Generate a fresh id from 128 random bits.
    pub fn generate() -> Self {
        Self(format!("{:032x}", rand::random::<u128>()))
    }

    /// Wrap an id supplied by the caller (e.g. persisted in a save file).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as sent in the join request.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who we connect as, and where.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Server address (`host:port` or a `ws://` / `wss://` URL).
    pub server: String,
    /// Slot name.
    pub user: String,
    /// Room password, empty if none.
    pub password: String,
    /// Stable instance id.
    pub instance_id: InstanceId,
}

impl SessionIdentity {
    /// True if `server`, `user` and `password` all match.
    ///
    /// The instance id is deliberately not compared: it identifies the client,
    /// not the credentials.
    pub fn same_credentials(&self, server: &str, user: &str, password: &str) -> bool {
        self.server == server && self.user == user && self.password == password
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_32_hex_chars() {
        let id = InstanceId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(InstanceId::generate(), InstanceId::generate());
    }

    #[test]
    fn credentials_ignore_instance_id() {
        let identity = SessionIdentity {
            server: "localhost:38281".into(),
            user: "alice".into(),
            password: "pw".into(),
            instance_id: InstanceId::new("a"),
        };
        assert!(identity.same_credentials("localhost:38281", "alice", "pw"));
        assert!(!identity.same_credentials("localhost:38281", "alice", "other"));
    }

    #[test]
    fn debug_redacts_password() {
        let identity = SessionIdentity {
            server: "s".into(),
            user: "u".into(),
            password: "hunter2".into(),
            instance_id: InstanceId::new("a"),
        };
        assert!(!format!("{identity:?}").contains("hunter2"));
    }
}
