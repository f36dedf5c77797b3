use thiserror::Error;

/// Faults raised by the core. Upload/delete transport failures are not listed here:
/// the flows in [`crate::operation`] recover those and report them in their outcome.
#[derive(Error, Debug)]
pub enum UploaderError {
    #[error("Can't find uploader config")]
    ConfigMissing,

    #[error("Invalid uploader config: missing required field `{field}`")]
    InvalidConfig { field: &'static str },

    #[error("Project lookup failed: {0}")]
    ProjectLookup(String),

    #[error("Invalid image descriptor: {0}")]
    InvalidImage(String),

    #[error("Unknown template token: {{{0}}}")]
    UnknownToken(String),
}

pub type UploaderResult<T> = Result<T, UploaderError>;
