use mysqlx_core::auth::{check_scramble, native_password_hash, NativeHash};
use mysqlx_core::backend::UserIdentity;

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    /// Host pattern: `%`, an exact host, or a `prefix%` wildcard.
    pub host: String,
    /// `None` means the account has an empty password.
    pub auth_string: Option<NativeHash>,
}

impl UserAccount {
    pub fn with_password(username: &str, host: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            host: host.to_string(),
            auth_string: (!password.is_empty()).then(|| native_password_hash(password.as_bytes())),
        }
    }

    pub fn with_auth_string(username: &str, host: &str, hash: NativeHash) -> Self {
        Self {
            username: username.to_string(),
            host: host.to_string(),
            auth_string: Some(hash),
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        host_matches(&self.host, host)
    }
}

pub fn host_matches(pattern: &str, host: &str) -> bool {
    if pattern == "%" || pattern.eq_ignore_ascii_case(host) {
        return true;
    }
    if pattern.eq_ignore_ascii_case("localhost") {
        return matches!(host, "127.0.0.1" | "::1");
    }
    match pattern.strip_suffix('%') {
        Some(prefix) => host
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
        None => false,
    }
}

/// Accounts allowed to authenticate against the memory engine.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    accounts: Vec<UserAccount>,
}

impl CredentialStore {
    pub fn new(accounts: Vec<UserAccount>) -> Self {
        Self { accounts }
    }

    pub fn add(&mut self, account: UserAccount) {
        self.accounts.push(account);
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Checks a native-password scramble for the first account matching
    /// both user name and client host.
    pub fn verify(&self, identity: &UserIdentity, proof: &[u8], salt: &[u8]) -> bool {
        let Some(account) = self
            .accounts
            .iter()
            .find(|a| a.username == identity.username && a.matches_host(&identity.hostname))
        else {
            return false;
        };
        match &account.auth_string {
            None => proof.is_empty(),
            Some(stored) => check_scramble(proof, salt, stored),
        }
    }
}
