//! GitLab REST API v4 request construction.
//!
//! Every function here is pure: it returns a [`RequestDescriptor`] for a transport to
//! execute. Single-file endpoints expect the file path escaped (`%2F` for `/`), the commits
//! endpoint expects hierarchical paths.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::UploaderConfig;
use crate::error::{UploaderError, UploaderResult};
use crate::image::{PreparedImage, RemovedImage};
use crate::template::{format_message, join_file_names};

pub const USER_AGENT: &str = "gitlab-files-uploader";

/// Characters that would end or split a path segment. `%` is kept so `%2F` survives.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// `{gitUrl}/api/v4/projects/{projectId}`, without a doubled slash when `gitUrl` ends in `/`.
pub fn project_url(config: &UploaderConfig) -> String {
    format!(
        "{}/api/v4/projects/{}",
        config.git_url.strip_suffix('/').unwrap_or(&config.git_url),
        config.project_id
    )
}

pub fn file_url(config: &UploaderConfig, escaped_path: &str) -> String {
    format!(
        "{}/repository/files/{}",
        project_url(config),
        utf8_percent_encode(escaped_path, SEGMENT)
    )
}

pub fn commits_url(config: &UploaderConfig) -> String {
    format!("{}/repository/commits", project_url(config))
}

/// Public URL of a committed file.
pub fn raw_url(config: &UploaderConfig, web_url: &str, path: &str) -> String {
    let raw = if config.legacy_server { "raw" } else { "-/raw" };
    format!(
        "{}/{}/{}/{}",
        web_url.strip_suffix('/').unwrap_or(web_url),
        raw,
        config.branch,
        path
    )
}

fn http_date(now: &DateTime<FixedOffset>) -> String {
    now.with_timezone(&Utc)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn base_headers(config: &UploaderConfig, now: &DateTime<FixedOffset>) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("PRIVATE-TOKEN".to_string(), config.git_token.clone()),
        ("Date".to_string(), http_date(now)),
    ])
}

fn mutating_headers(
    config: &UploaderConfig,
    now: &DateTime<FixedOffset>,
) -> BTreeMap<String, String> {
    let mut headers = base_headers(config, now);
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("User-Agent".to_string(), USER_AGENT.to_string());
    headers
}

pub fn project_info(config: &UploaderConfig, now: &DateTime<FixedOffset>) -> RequestDescriptor {
    RequestDescriptor {
        method: Method::Get,
        url: project_url(config),
        headers: base_headers(config, now),
        body: None,
    }
}

pub fn upload_single_file(
    config: &UploaderConfig,
    escaped_path: &str,
    commit_message: &str,
    base64: &str,
    now: &DateTime<FixedOffset>,
) -> RequestDescriptor {
    RequestDescriptor {
        method: Method::Post,
        url: file_url(config, escaped_path),
        headers: mutating_headers(config, now),
        body: Some(json!({
            "branch": config.branch,
            "author_email": config.author_mail,
            "author_name": config.author_name,
            "encoding": "base64",
            "commit_message": commit_message,
            "content": base64,
        })),
    }
}

pub fn remove_single_file(
    config: &UploaderConfig,
    escaped_path: &str,
    delete_message: &str,
    now: &DateTime<FixedOffset>,
) -> RequestDescriptor {
    RequestDescriptor {
        method: Method::Delete,
        url: file_url(config, escaped_path),
        headers: mutating_headers(config, now),
        body: Some(json!({
            "branch": config.branch,
            "author_email": config.author_mail,
            "author_name": config.author_name,
            "commit_message": delete_message,
        })),
    }
}

/// One commit creating every image, at its hierarchical destination path.
pub fn upload_multi_files(
    config: &UploaderConfig,
    images: &[PreparedImage],
    now: &DateTime<FixedOffset>,
) -> RequestDescriptor {
    let actions = images
        .iter()
        .map(|image| {
            json!({
                "action": "create",
                "file_path": image.destination_path,
                "encoding": "base64",
                "content": image.base64,
            })
        })
        .collect();
    let names = join_file_names(images.iter().map(|image| image.file_name.as_str()));
    let message = format_message(&config.commit_message, &names, now);
    post_multi_files(config, actions, &message, now)
}

/// One commit deleting every file. Fails if a file has no recorded destination path.
pub fn remove_multi_files(
    config: &UploaderConfig,
    files: &[RemovedImage],
    now: &DateTime<FixedOffset>,
) -> UploaderResult<RequestDescriptor> {
    let actions = files
        .iter()
        .map(|file| -> UploaderResult<Value> {
            Ok(json!({
                "action": "delete",
                "file_path": recorded_path(file)?,
            }))
        })
        .collect::<UploaderResult<Vec<_>>>()?;
    let names = join_file_names(files.iter().map(|file| file.file_name.as_str()));
    let message = format_message(&config.delete_message, &names, now);
    Ok(post_multi_files(config, actions, &message, now))
}

/// Destination path a removed file was uploaded to.
pub fn recorded_path(file: &RemovedImage) -> UploaderResult<&str> {
    file.destination_path
        .as_deref()
        .filter(|path| !path.is_empty())
        .ok_or_else(|| {
            UploaderError::InvalidImage(format!(
                "{} has no recorded destination path",
                file.file_name
            ))
        })
}

fn post_multi_files(
    config: &UploaderConfig,
    actions: Vec<Value>,
    commit_message: &str,
    now: &DateTime<FixedOffset>,
) -> RequestDescriptor {
    RequestDescriptor {
        method: Method::Post,
        url: commits_url(config),
        headers: mutating_headers(config, now),
        body: Some(json!({
            "id": config.project_id,
            "branch": config.branch,
            "commit_message": commit_message,
            "author_email": config.author_mail,
            "author_name": config.author_name,
            "actions": actions,
        })),
    }
}
