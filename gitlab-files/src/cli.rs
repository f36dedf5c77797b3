///
/// This module implements the CLI interface for gitlab-files: command parsing, reading the
/// files to upload, and printing results.
///
/// All decisions about paths, messages and requests live in the [`gitlab-files-core`] crate.
/// This module is strictly CLI glue around [`upload`], [`remove`] and the project lookup.
///
/// ## How To Use
/// - From the shell: `gitlab-files upload --config gitlab.yaml shot.png`.
/// - Programmatically / in tests: call [`run`] with a constructed [`Cli`].
///
/// [`gitlab-files-core`]: ../../gitlab-files-core/
/// [`upload`]: gitlab_files_core::operation::upload
/// [`remove`]: gitlab_files_core::operation::remove
use crate::load_config::load_config;
use crate::transport::HttpTransport;
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use gitlab_files_core::config::UploaderConfig;
use gitlab_files_core::contract::Notification;
use gitlab_files_core::image::{ImageInput, Payload, RemovedImage, UPLOADER_ID};
use gitlab_files_core::operation::{project_web_url, remove, upload};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI for gitlab-files: commit images to a GitLab project and print their raw URLs.
#[derive(Parser)]
#[clap(
    name = "gitlab-files",
    version,
    about = "Upload images to a GitLab repository and get back their raw URLs"
)]
pub struct Cli {
    /// Request timeout in seconds
    #[clap(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the web URL of the configured project
    Info {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Upload images, one commit for all of them
    Upload {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Image files to upload
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete previously uploaded images by their repository path
    Remove {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Repository paths, as printed in the uploaded URLs after the branch name
        #[clap(required = true)]
        paths: Vec<String>,
    },
}

fn read_image(path: &Path) -> Result<ImageInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let extname = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    Ok(ImageInput::new(file_name, extname, Payload::Buffer(bytes)))
}

fn removal_for(path: &str) -> RemovedImage {
    let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
    let ext_name = Path::new(&file_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    RemovedImage {
        file_name,
        ext_name,
        destination_path: Some(path.to_string()),
        kind: UPLOADER_ID.to_string(),
    }
}

fn report_notifications(notifications: &[Notification]) {
    for n in notifications {
        eprintln!("[{}] {}", n.title, n.body);
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let timeout = Duration::from_secs(cli.timeout);
    let now = Local::now().fixed_offset();

    match cli.command {
        Commands::Info { config } => {
            let config = load_config(config)?;
            let transport = HttpTransport::new(timeout)?;
            let web_url = project_web_url(&config, &transport, &now).await?;
            tracing::info!(command = "info", web_url = %web_url, "Project resolved");
            println!("{web_url}");
            Ok(())
        }
        Commands::Upload { config, files } => {
            let config = load_config(config)?;
            let images = files
                .iter()
                .map(|path| read_image(path))
                .collect::<Result<Vec<_>>>()?;
            let transport = HttpTransport::new(timeout)?;
            let outcome = upload(&config, images, &transport, &now).await?;
            report_notifications(&outcome.notifications);
            if outcome.failed {
                tracing::error!(command = "upload", "Upload failed");
                anyhow::bail!("Upload failed");
            }
            for image in &outcome.images {
                println!("{}", image.url);
            }
            tracing::info!(command = "upload", count = outcome.images.len(), "Upload complete");
            Ok(())
        }
        Commands::Remove { config, paths } => {
            // An explicit remove command always deletes remotely.
            let config = UploaderConfig {
                delete_remote: true,
                ..load_config(config)?
            };
            let files = paths.iter().map(|p| removal_for(p)).collect();
            let transport = HttpTransport::new(timeout)?;
            let outcome = remove(&config, files, &transport, &now).await?;
            report_notifications(&outcome.notifications);
            if outcome.failed {
                tracing::error!(command = "remove", "Remote delete failed");
                anyhow::bail!("Remote delete failed");
            }
            for path in &outcome.removed {
                println!("deleted {path}");
            }
            Ok(())
        }
    }
}
