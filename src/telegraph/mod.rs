//! Long-form page publishing and media hosting on Telegraph.

mod client;
mod nodes;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use client::TelegraphClient;
pub use nodes::{Element, Node, html_to_nodes};

/// Errors from the publisher or the media host.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Telegraph error: {0}")]
    Api(String),

    #[error("Telegraph request failed: {0}")]
    Transport(String),

    #[error("Could not read media: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Publishes HTML documents and returns their public URL.
#[async_trait]
pub trait DocumentPublisher: Send + Sync {
    async fn publish(&self, title: &str, html: &str) -> Result<String, PublishError>;
}

/// Hosts a local media file and returns its path on the host, like `/file/abc.jpg`.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<String, PublishError>;
}
