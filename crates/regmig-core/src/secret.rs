/// Name under which merged registry credentials are stored.
pub const DOCKER_CONFIG_SECRET_NAME: &str = ".dockerconfigjson";

/// A row of the successor `secrets` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub id: i64,
    pub repo_id: i64,
    pub name: String,
    pub data: String,
    pub pull_request: bool,
}

impl Secret {
    /// Builds the registry credential secret for a repository. Migrated
    /// credentials stay visible to pull request builds, as they were before.
    pub fn docker_config(id: i64, repo_id: i64, data: String) -> Self {
        Self {
            id,
            repo_id,
            name: DOCKER_CONFIG_SECRET_NAME.to_string(),
            data,
            pull_request: true,
        }
    }
}
