//! Image descriptors as they move through the pipeline.
//!
//! An [`ImageInput`] comes from the host, [`PreparedImage`] carries the computed
//! destination path and the base64 payload, and [`UploadedImage`] is what is handed back
//! once the commit succeeded (payload dropped).

use base64::{engine::general_purpose::STANDARD, Engine};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Uploader type tag the host attaches to images this uploader created.
pub const UPLOADER_ID: &str = "gitlab-files-uploader";

/// Raw image content, either bytes or an already encoded base64 string.
#[derive(Debug, Clone)]
pub enum Payload {
    Buffer(Vec<u8>),
    Base64(String),
}

impl Payload {
    /// Hex MD5 digest. Buffers are hashed over their bytes, base64 payloads over the text.
    pub fn md5_hex(&self) -> String {
        let mut hasher = Md5::new();
        match self {
            Payload::Buffer(bytes) => hasher.update(bytes),
            Payload::Base64(text) => hasher.update(text.as_bytes()),
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn into_base64(self) -> String {
        match self {
            Payload::Buffer(bytes) => STANDARD.encode(bytes),
            Payload::Base64(text) => text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Original file name including extension, e.g. `photo.png`.
    pub file_name: String,
    /// Extension including the leading dot, e.g. `.png`.
    pub extname: String,
    pub payload: Payload,
}

impl ImageInput {
    pub fn new(file_name: impl Into<String>, extname: impl Into<String>, payload: Payload) -> Self {
        Self {
            file_name: file_name.into(),
            extname: extname.into(),
            payload,
        }
    }

    /// File name with the first occurrence of the extension removed.
    pub fn stem(&self) -> String {
        if self.extname.is_empty() {
            return self.file_name.clone();
        }
        self.file_name.replacen(&self.extname, "", 1)
    }

    /// Extension with its first dot removed.
    pub fn ext(&self) -> String {
        self.extname.replacen('.', "", 1)
    }
}

#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub file_name: String,
    pub extname: String,
    /// Hierarchical path inside the repository, without leading slash.
    pub destination_path: String,
    pub base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub file_name: String,
    pub extname: String,
    pub destination_path: String,
    pub url: String,
}

impl From<PreparedImage> for UploadedImage {
    fn from(image: PreparedImage) -> Self {
        Self {
            file_name: image.file_name,
            extname: image.extname,
            destination_path: image.destination_path,
            url: String::new(),
        }
    }
}

/// An image the host is removing from its gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedImage {
    pub file_name: String,
    pub ext_name: String,
    /// Destination path recorded at upload time.
    #[serde(rename = "newPath")]
    pub destination_path: Option<String>,
    /// Uploader that created the image; only [`UPLOADER_ID`] entries are handled.
    #[serde(rename = "type")]
    pub kind: String,
}

impl RemovedImage {
    pub fn belongs_to_uploader(&self) -> bool {
        self.kind == UPLOADER_ID
    }
}
