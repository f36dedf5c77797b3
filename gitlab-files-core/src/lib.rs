#![doc = "gitlab-files-core: core logic library for gitlab-files."]

//! This crate holds everything that decides *what* is sent to GitLab: configuration
//! normalisation, the path/message template engine, request construction and the
//! upload/remove flows. It performs no network I/O itself; requests go through the
//! [`contract::Transport`] trait.
//!
//! # Usage
//! Add this as a dependency and provide a `Transport` implementation (the `gitlab-files`
//! crate ships a reqwest one; tests use the generated `MockTransport`).

pub mod config;
pub mod contract;
pub mod error;
pub mod image;
pub mod operation;
pub mod request;
pub mod template;
