//! Upload and remove flows: resolve project → build request → execute → post-process.
//!
//! # Responsibilities
//! - Expands destination paths and encodes payloads before any request is sent
//! - Looks the project up first; its `web_url` seeds the public raw-file URLs
//! - Chooses the single-file endpoint for exactly one file, the commits endpoint otherwise
//! - Recovers upload/delete transport failures: they are logged and reported through the
//!   returned outcome (`failed` plus notifications), never raised
//!
//! # Error Handling
//! Project lookup failures and invalid descriptors are fatal and returned as
//! [`UploaderError`] before anything is committed.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::UploaderConfig;
use crate::contract::{Notification, Transport};
use crate::error::{UploaderError, UploaderResult};
use crate::image::{ImageInput, PreparedImage, RemovedImage, UploadedImage};
use crate::request::{self, RequestDescriptor};
use crate::template::{escape_path, format_message, format_path};

pub const UPLOAD_FAILED_TITLE: &str = "GitLab upload failed";
pub const UPLOAD_FAILED_BODY: &str = "Check the uploader configuration and server connectivity";
pub const REMOVE_TITLE: &str = "Remote delete";
pub const REMOVE_SUCCEEDED_BODY: &str = "Remote images deleted";
pub const REMOVE_FAILED_BODY: &str = "Failed to delete remote images";

#[derive(Debug, Default)]
pub struct UploadOutcome {
    /// Uploaded images with their public URLs. Empty when the commit failed.
    pub images: Vec<UploadedImage>,
    pub failed: bool,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Default)]
pub struct RemoveOutcome {
    /// Repository paths deleted by the commit.
    pub removed: Vec<String>,
    /// Nothing to do: no file belonged to this uploader, or remote deletion is disabled.
    pub skipped: bool,
    pub failed: bool,
    pub notifications: Vec<Notification>,
}

/// Resolves the project's `web_url`.
pub async fn project_web_url<T>(
    config: &UploaderConfig,
    transport: &T,
    now: &DateTime<FixedOffset>,
) -> UploaderResult<String>
where
    T: Transport + ?Sized,
{
    let req = request::project_info(config, now);
    info!(url = %req.url, "Looking up project");
    let body = transport.execute(req).await.map_err(|e| {
        error!(error = ?e, project_id = config.project_id, "Project lookup request failed");
        UploaderError::ProjectLookup(e.to_string())
    })?;
    let web_url = extract_web_url(&body).ok_or_else(|| {
        error!(?body, "Project lookup response has no web_url");
        UploaderError::ProjectLookup("response has no web_url".to_string())
    })?;
    debug!(web_url = %web_url, "Resolved project web URL");
    Ok(web_url)
}

fn extract_web_url(body: &Value) -> Option<String> {
    match body {
        Value::String(text) => serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|v| extract_web_url(&v)),
        other => other
            .get("web_url")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Computes every destination path and encodes every payload.
pub fn prepare_images(
    config: &UploaderConfig,
    images: Vec<ImageInput>,
    now: &DateTime<FixedOffset>,
) -> UploaderResult<Vec<PreparedImage>> {
    images
        .into_iter()
        .map(|image| {
            let destination_path = format_path(&image, &config.path_template, now, false);
            if destination_path.is_empty() {
                return Err(UploaderError::InvalidImage(format!(
                    "{} expands to an empty destination path",
                    image.file_name
                )));
            }
            debug!(file = %image.file_name, path = %destination_path, "Computed destination path");
            Ok(PreparedImage {
                file_name: image.file_name,
                extname: image.extname,
                destination_path,
                base64: image.payload.into_base64(),
            })
        })
        .collect()
}

/// Single-file create for exactly one image, one batch commit otherwise.
pub fn build_upload_request(
    config: &UploaderConfig,
    images: &[PreparedImage],
    now: &DateTime<FixedOffset>,
) -> RequestDescriptor {
    match images {
        [image] => request::upload_single_file(
            config,
            &escape_path(&image.destination_path),
            &format_message(&config.commit_message, &image.file_name, now),
            &image.base64,
            now,
        ),
        _ => request::upload_multi_files(config, images, now),
    }
}

/// Single-file delete for exactly one file, one batch commit otherwise.
pub fn build_remove_request(
    config: &UploaderConfig,
    files: &[RemovedImage],
    now: &DateTime<FixedOffset>,
) -> UploaderResult<RequestDescriptor> {
    match files {
        [file] => Ok(request::remove_single_file(
            config,
            &escape_path(request::recorded_path(file)?),
            &format_message(&config.delete_message, &file.file_name, now),
            now,
        )),
        _ => request::remove_multi_files(config, files, now),
    }
}

pub async fn upload<T>(
    config: &UploaderConfig,
    images: Vec<ImageInput>,
    transport: &T,
    now: &DateTime<FixedOffset>,
) -> UploaderResult<UploadOutcome>
where
    T: Transport + ?Sized,
{
    if images.is_empty() {
        info!("No images to upload");
        return Ok(UploadOutcome::default());
    }
    info!(count = images.len(), "Starting upload");

    let prepared = prepare_images(config, images, now)?;
    let web_url = project_web_url(config, transport, now).await?;

    let req = build_upload_request(config, &prepared, now);
    info!(method = req.method.as_str(), url = %req.url, files = prepared.len(), "Committing images");

    match transport.execute(req).await {
        Ok(_) => {
            let images: Vec<UploadedImage> = prepared
                .into_iter()
                .map(|image| {
                    let url = request::raw_url(config, &web_url, &image.destination_path);
                    UploadedImage {
                        url,
                        ..UploadedImage::from(image)
                    }
                })
                .collect();
            for image in &images {
                info!(file = %image.file_name, url = %image.url, "Uploaded image");
            }
            Ok(UploadOutcome {
                images,
                failed: false,
                notifications: Vec::new(),
            })
        }
        Err(e) => {
            error!(error = ?e, files = prepared.len(), "GitLab upload failed");
            Ok(UploadOutcome {
                images: Vec::new(),
                failed: true,
                notifications: vec![Notification::new(UPLOAD_FAILED_TITLE, UPLOAD_FAILED_BODY)],
            })
        }
    }
}

pub async fn remove<T>(
    config: &UploaderConfig,
    files: Vec<RemovedImage>,
    transport: &T,
    now: &DateTime<FixedOffset>,
) -> UploaderResult<RemoveOutcome>
where
    T: Transport + ?Sized,
{
    let ours: Vec<RemovedImage> = files
        .into_iter()
        .filter(RemovedImage::belongs_to_uploader)
        .collect();
    if ours.is_empty() || !config.delete_remote {
        info!(
            files = ours.len(),
            delete_remote = config.delete_remote,
            "Skipping remote delete"
        );
        return Ok(RemoveOutcome {
            skipped: true,
            ..RemoveOutcome::default()
        });
    }

    let req = build_remove_request(config, &ours, now)?;
    info!(method = req.method.as_str(), url = %req.url, files = ours.len(), "Deleting remote images");

    let mut outcome = RemoveOutcome::default();
    match transport.execute(req).await {
        Ok(_) => {
            outcome.removed = ours
                .into_iter()
                .filter_map(|file| file.destination_path)
                .collect();
            info!(files = outcome.removed.len(), "Remote delete succeeded");
        }
        Err(e) => {
            error!(error = ?e, files = ours.len(), "GitLab delete failed");
            outcome.failed = true;
        }
    }

    if config.delete_inform {
        let body = if outcome.failed {
            REMOVE_FAILED_BODY
        } else {
            REMOVE_SUCCEEDED_BODY
        };
        outcome.notifications.push(Notification::new(REMOVE_TITLE, body));
    }
    Ok(outcome)
}
