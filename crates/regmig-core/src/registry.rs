//! Legacy registry credentials and the docker config bundle they are merged into.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the legacy `registry` table joined with its owning repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyCredential {
    pub repo_full_name: String,
    pub addr: String,
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl From<&LegacyCredential> for AuthConfig {
    fn from(credential: &LegacyCredential) -> Self {
        Self {
            username: credential.username.clone(),
            password: credential.password.clone(),
            email: credential.email.clone(),
        }
    }
}

/// Multi-registry credential document in the `~/.docker/config.json` layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DockerConfig {
    pub auths: BTreeMap<String, AuthConfig>,
}

impl DockerConfig {
    /// Sets the credentials for `addr`, replacing any earlier entry.
    pub fn insert(&mut self, addr: impl Into<String>, auth: AuthConfig) -> Option<AuthConfig> {
        self.auths.insert(addr.into(), auth)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Groups credentials by repository slug. Rows are applied in input order, so
/// a later row for the same repository and address wins.
pub fn group_by_repo(credentials: &[LegacyCredential]) -> BTreeMap<String, DockerConfig> {
    let mut bundles: BTreeMap<String, DockerConfig> = BTreeMap::new();
    for credential in credentials {
        bundles
            .entry(credential.repo_full_name.clone())
            .or_default()
            .insert(credential.addr.clone(), AuthConfig::from(credential));
    }
    bundles
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn credential(repo: &str, addr: &str, username: &str) -> LegacyCredential {
        LegacyCredential {
            repo_full_name: repo.to_string(),
            addr: addr.to_string(),
            username: username.to_string(),
            password: format!("{username}-secret"),
            email: String::new(),
        }
    }

    #[test]
    fn grouping_collects_addresses_per_repository() {
        let bundles = group_by_repo(&[
            credential("org/a", "registry1.io", "alice"),
            credential("org/b", "registry1.io", "bob"),
            credential("org/a", "registry2.io", "alice2"),
        ]);

        assert_eq!(bundles.len(), 2);
        let a = bundles.get("org/a").expect("org/a bundle");
        assert_eq!(a.auths.len(), 2);
        assert_eq!(a.auths["registry2.io"].username, "alice2");
        let b = bundles.get("org/b").expect("org/b bundle");
        assert_eq!(b.auths.len(), 1);
        assert_eq!(b.auths["registry1.io"].password, "bob-secret");
    }

    #[test]
    fn duplicate_address_keeps_last_row() {
        let bundles = group_by_repo(&[
            credential("org/a", "registry1.io", "first"),
            credential("org/a", "registry1.io", "second"),
        ]);

        let a = bundles.get("org/a").expect("org/a bundle");
        assert_eq!(a.auths.len(), 1);
        assert_eq!(a.auths["registry1.io"].username, "second");
    }

    #[test]
    fn empty_input_yields_no_bundles() {
        assert!(group_by_repo(&[]).is_empty());
    }

    #[test]
    fn json_uses_auths_wrapper() {
        let mut config = DockerConfig::default();
        config.insert(
            "index.docker.io",
            AuthConfig {
                username: "octocat".to_string(),
                password: "hunter2".to_string(),
                email: "octocat@example.com".to_string(),
            },
        );

        let encoded: Value =
            serde_json::from_str(&config.to_json().expect("encode")).expect("decode");
        assert_eq!(
            encoded,
            json!({
                "auths": {
                    "index.docker.io": {
                        "username": "octocat",
                        "password": "hunter2",
                        "email": "octocat@example.com"
                    }
                }
            })
        );
    }
}
