//! Uploader configuration as stored by the host, and the normalisation step that turns a
//! partially filled record into a complete [`UploaderConfig`].
//!
//! Keys follow the host's camelCase naming (`gitUrl`, `projectId`, ...), so the same YAML or
//! JSON document can be shared between the host and the CLI.

use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{UploaderError, UploaderResult};

pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_PATH_TEMPLATE: &str =
    "/pictures/{year}/{month}/{day}_{hour}_{minute}_{second}_{fileName}";
pub const DEFAULT_COMMIT_MESSAGE: &str =
    "Upload {fileName} By PicGo gitlab files uploader at {year}-{month}-{day}";
pub const DEFAULT_DELETE_MESSAGE: &str =
    "Delete {fileName} By PicGo gitlab files uploader at {year}-{month}-{day}";

/// Configuration as found in storage. Every field may be absent.
///
/// The host collects every field through text prompts, so `projectId` and the flags may be
/// stored as strings (`"42"`, `"false"`) as well as numbers and booleans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    pub git_url: Option<String>,
    #[serde(default, deserialize_with = "number_or_text")]
    pub project_id: Option<u64>,
    pub branch: Option<String>,
    pub git_token: Option<String>,
    #[serde(rename = "fileName")]
    pub path_template: Option<String>,
    pub commit_message: Option<String>,
    pub delete_message: Option<String>,
    pub author_mail: Option<String>,
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "number_or_text")]
    pub delete_remote: Option<bool>,
    #[serde(default, deserialize_with = "number_or_text")]
    pub delete_inform: Option<bool>,
    #[serde(
        rename = "gitVersionUnderThirteen",
        default,
        deserialize_with = "number_or_text"
    )]
    pub legacy_server: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored<T> {
    Typed(T),
    Text(String),
}

/// Accepts the typed value or its text form. Blank text counts as absent.
fn number_or_text<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<Stored<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Stored::Typed(value)) => Ok(Some(value)),
        Some(Stored::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Stored::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| de::Error::custom(format!("invalid value {text:?}: {err}"))),
    }
}

/// Complete, immutable uploader configuration.
#[derive(Clone)]
pub struct UploaderConfig {
    pub git_url: String,
    pub project_id: u64,
    pub branch: String,
    pub git_token: String,
    pub path_template: String,
    pub commit_message: String,
    pub delete_message: String,
    pub author_mail: String,
    pub author_name: String,
    pub delete_remote: bool,
    pub delete_inform: bool,
    /// Server is older than GitLab 13 and serves raw files under `/raw/` instead of `/-/raw/`.
    pub legacy_server: bool,
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("git_url", &self.git_url)
            .field("project_id", &self.project_id)
            .field("branch", &self.branch)
            .field("git_token", &"<redacted>")
            .field("path_template", &self.path_template)
            .field("commit_message", &self.commit_message)
            .field("delete_message", &self.delete_message)
            .field("author_mail", &self.author_mail)
            .field("author_name", &self.author_name)
            .field("delete_remote", &self.delete_remote)
            .field("delete_inform", &self.delete_inform)
            .field("legacy_server", &self.legacy_server)
            .finish()
    }
}

impl RawConfig {
    /// Fills defaults for the optional fields. `gitUrl`, `projectId` and `gitToken` have no
    /// sensible default and are required.
    pub fn normalize(self) -> UploaderResult<UploaderConfig> {
        let git_url = self
            .git_url
            .filter(|s| !s.trim().is_empty())
            .ok_or(UploaderError::InvalidConfig { field: "gitUrl" })?;
        let project_id = self
            .project_id
            .ok_or(UploaderError::InvalidConfig { field: "projectId" })?;
        let git_token = self
            .git_token
            .filter(|s| !s.is_empty())
            .ok_or(UploaderError::InvalidConfig { field: "gitToken" })?;

        let config = UploaderConfig {
            git_url,
            project_id,
            branch: self.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            git_token,
            path_template: self
                .path_template
                .unwrap_or_else(|| DEFAULT_PATH_TEMPLATE.to_string()),
            commit_message: self
                .commit_message
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            delete_message: self
                .delete_message
                .unwrap_or_else(|| DEFAULT_DELETE_MESSAGE.to_string()),
            author_mail: self.author_mail.unwrap_or_default(),
            author_name: self.author_name.unwrap_or_default(),
            delete_remote: self.delete_remote.unwrap_or(false),
            delete_inform: self.delete_inform.unwrap_or(false),
            legacy_server: self.legacy_server.unwrap_or(false),
        };
        config.trace_loaded();
        Ok(config)
    }
}

impl UploaderConfig {
    /// Normalises whatever the configuration collaborator returned. `None` means nothing
    /// was stored for this uploader.
    pub fn from_stored(stored: Option<RawConfig>) -> UploaderResult<Self> {
        match stored {
            Some(raw) => raw.normalize(),
            None => Err(UploaderError::ConfigMissing),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            git_url = %self.git_url,
            project_id = self.project_id,
            branch = %self.branch,
            legacy_server = self.legacy_server,
            "Loaded uploader config"
        );
        debug!(?self, "Uploader config loaded (full debug)");
    }
}
