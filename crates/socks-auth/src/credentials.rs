use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use crate::AuthMethod;

/// A username / password pair. Either field may be empty.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether `presented` is accepted by this stored credential.
    ///
    /// An empty stored password accepts any password for the username, and an empty stored
    /// username accepts any username presenting the password.
    pub fn accepts(&self, presented: &Credential) -> bool {
        let username_matches = self.username == presented.username;
        let password_matches = self.password == presented.password;

        (username_matches && password_matches)
            || (username_matches && self.password.is_empty())
            || (self.username.is_empty() && password_matches)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Parses `username:password`.
///
/// The string is split at the first `:`, so passwords may contain colons. Without any `:`,
/// the whole string is the username and the password is empty.
impl FromStr for Credential {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (username, password) = s.split_once(':').unwrap_or((s, ""));
        Ok(Self::new(username, password))
    }
}

impl<U, P> From<(U, P)> for Credential
where
    U: Into<String>,
    P: Into<String>,
{
    fn from((username, password): (U, P)) -> Self {
        Self::new(username, password)
    }
}

/// Ordered, read-only collection of configured credentials.
///
/// Cloning is cheap and shares the same storage: build the store once at startup and hand
/// clones to every connection handler.
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    credentials: Arc<[Credential]>,
}

impl CredentialStore {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials: Arc::from(credentials),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }

    /// Identity presented by the client role: the first configured credential.
    pub fn preferred_identity(&self) -> Option<&Credential> {
        self.credentials.first()
    }

    /// Returns true if `presented` is accepted by any stored credential.
    ///
    /// An empty store matches nothing. Callers wanting "no credentials configured" to mean
    /// "no authentication enforced" must check [`CredentialStore::is_empty`] first.
    pub fn validate(&self, presented: &Credential) -> bool {
        self.credentials.iter().any(|stored| stored.accepts(presented))
    }

    /// Method selection for the server role.
    ///
    /// Authentication is mandatory as soon as one credential is configured, whatever the peer
    /// offered. A peer unable to perform username/password will fail later, during the
    /// subnegotiation.
    pub fn select(&self, _offered: &[u8]) -> AuthMethod {
        if self.is_empty() {
            AuthMethod::NoAuth
        } else {
            AuthMethod::UserPass
        }
    }
}

impl From<Vec<Credential>> for CredentialStore {
    fn from(credentials: Vec<Credential>) -> Self {
        Self::new(credentials)
    }
}

impl FromIterator<Credential> for CredentialStore {
    fn from_iter<I: IntoIterator<Item = Credential>>(iter: I) -> Self {
        Self {
            credentials: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(entries: &[(&str, &str)]) -> CredentialStore {
        entries.iter().map(|&(u, p)| Credential::new(u, p)).collect()
    }

    #[test]
    fn exact_match() {
        let store = store(&[("alice", "secret")]);
        assert!(store.validate(&Credential::new("alice", "secret")));
        assert!(!store.validate(&Credential::new("alice", "wrong")));
        assert!(!store.validate(&Credential::new("bob", "secret")));
        assert!(!store.validate(&Credential::new("", "")));
    }

    #[test]
    fn empty_stored_password_accepts_any_password() {
        let store = store(&[("alice", "")]);
        assert!(store.validate(&Credential::new("alice", "whatever")));
        assert!(store.validate(&Credential::new("alice", "")));
        assert!(!store.validate(&Credential::new("bob", "whatever")));
    }

    #[test]
    fn empty_stored_username_accepts_any_username() {
        let store = store(&[("", "secret")]);
        assert!(store.validate(&Credential::new("bob", "secret")));
        assert!(store.validate(&Credential::new("", "secret")));
        assert!(!store.validate(&Credential::new("bob", "wrong")));
    }

    #[test]
    fn fully_empty_stored_credential() {
        // Both rules apply: only the empty username or the empty password get through.
        let store = store(&[("", "")]);
        assert!(store.validate(&Credential::new("", "anything")));
        assert!(store.validate(&Credential::new("anyone", "")));
        assert!(!store.validate(&Credential::new("anyone", "anything")));
    }

    #[test]
    fn any_entry_may_match() {
        let store = store(&[("alice", "secret"), ("bob", "hunter2")]);
        assert!(store.validate(&Credential::new("bob", "hunter2")));
        assert!(!store.validate(&Credential::new("bob", "secret")));

        let usernames: Vec<&str> = store.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(usernames, ["alice", "bob"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn empty_store_matches_nothing() {
        let store = CredentialStore::default();
        assert!(store.is_empty());
        assert!(!store.validate(&Credential::new("", "")));
    }

    #[test]
    fn preferred_identity_is_first_entry() {
        let store = store(&[("alice", "secret"), ("bob", "hunter2")]);
        assert_eq!(store.preferred_identity(), Some(&Credential::new("alice", "secret")));
        assert_eq!(CredentialStore::default().preferred_identity(), None);
    }

    #[test]
    fn select_ignores_offered_methods() {
        let with_users = store(&[("alice", "secret")]);
        assert_eq!(with_users.select(&[AuthMethod::NO_AUTH]), AuthMethod::UserPass);
        assert_eq!(with_users.select(&[]), AuthMethod::UserPass);

        let without_users = CredentialStore::default();
        assert_eq!(
            without_users.select(&[AuthMethod::USER_PASS]),
            AuthMethod::NoAuth
        );
    }

    #[test]
    fn parse_credential() {
        let parsed: Credential = "alice:secret".parse().unwrap();
        assert_eq!(parsed, Credential::new("alice", "secret"));

        let parsed: Credential = "alice:se:cr:et".parse().unwrap();
        assert_eq!(parsed, Credential::new("alice", "se:cr:et"));

        let parsed: Credential = "alice".parse().unwrap();
        assert_eq!(parsed, Credential::new("alice", ""));

        let parsed: Credential = ":secret".parse().unwrap();
        assert_eq!(parsed, Credential::new("", "secret"));
    }

    #[test]
    fn debug_redacts_password() {
        let debug = format!("{:?}", Credential::new("alice", "secret"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn clones_share_storage() {
        let store = store(&[("alice", "secret")]);
        let clone = store.clone();
        assert!(Arc::ptr_eq(&store.credentials, &clone.credentials));
    }
}
