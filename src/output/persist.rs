//! Content persistence: writes each fetched page to the output directory
//!
//! Layout:
//! - HTML and Markdown both enabled: `<dir>/html/` and `<dir>/markdown/`
//! - otherwise: whichever is enabled goes straight to `<dir>/`
//! - PDFs and screenshots always go to `<dir>/`

use crate::config::OutputConfig;
use crate::crawler::FetchedPage;
use crate::output::filename::safe_filename;
use crate::output::markdown::html_to_markdown;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// A single failed save
#[derive(Debug, Error)]
#[error("Failed to write {}: {}", .path.display(), .source)]
pub struct PersistError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Saves page content according to the output configuration
#[derive(Debug, Clone)]
pub struct ContentPersister {
    config: OutputConfig,
    html_dir: PathBuf,
    markdown_dir: PathBuf,
    artifact_dir: PathBuf,
}

impl ContentPersister {
    /// Computes the output layout; touches nothing on disk
    pub fn new(config: &OutputConfig) -> Self {
        let root = config.dir.clone();
        let (html_dir, markdown_dir) = if config.save_html && config.save_markdown {
            (root.join("html"), root.join("markdown"))
        } else {
            (root.clone(), root.clone())
        };

        Self {
            config: config.clone(),
            html_dir,
            markdown_dir,
            artifact_dir: root,
        }
    }

    /// Returns true if nothing will ever be written
    pub fn is_disabled(&self) -> bool {
        !self.config.saves_content()
    }

    /// Creates every directory the enabled saves need
    ///
    /// Does nothing in urls-only mode or when no save is enabled.
    pub async fn prepare(&self) -> std::io::Result<()> {
        if self.is_disabled() {
            return Ok(());
        }

        for dir in self.directories() {
            tokio::fs::create_dir_all(dir).await?;
            tracing::debug!("Output directory ready: {}", dir.display());
        }

        Ok(())
    }

    fn directories(&self) -> Vec<&Path> {
        let mut dirs = Vec::new();
        if self.config.save_html {
            dirs.push(self.html_dir.as_path());
        }
        if self.config.save_markdown {
            dirs.push(self.markdown_dir.as_path());
        }
        if self.config.save_pdf || self.config.save_screenshot {
            dirs.push(self.artifact_dir.as_path());
        }
        dirs.dedup();
        dirs
    }

    /// Saves one fetched page
    ///
    /// Each enabled save is attempted independently; a failure is logged and
    /// collected and never stops the other saves.
    ///
    /// # Arguments
    ///
    /// * `url` - The normalized URL the page was claimed under; names files
    /// * `page` - The fetched page
    ///
    /// # Returns
    ///
    /// Every save that failed (empty on success or when persistence is off)
    pub async fn persist(&self, url: &Url, page: &FetchedPage) -> Vec<PersistError> {
        if self.is_disabled() {
            return Vec::new();
        }

        let mut errors = Vec::new();

        if self.config.save_html {
            let path = self.html_dir.join(safe_filename(url, "html"));
            self.save(path, page.html.as_bytes(), &mut errors).await;
        }

        if self.config.save_markdown {
            let path = self.markdown_dir.join(safe_filename(url, "md"));
            let markdown = html_to_markdown(&page.html);
            self.save(path, markdown.as_bytes(), &mut errors).await;
        }

        if self.config.save_pdf {
            match &page.artifacts.pdf {
                Some(pdf) => {
                    let path = self.artifact_dir.join(safe_filename(url, "pdf"));
                    self.save(path, pdf, &mut errors).await;
                }
                None => tracing::debug!("No PDF captured for {}", url),
            }
        }

        if self.config.save_screenshot {
            match &page.artifacts.screenshot {
                Some(png) => {
                    let path = self.artifact_dir.join(safe_filename(url, "png"));
                    self.save(path, png, &mut errors).await;
                }
                None => tracing::debug!("No screenshot captured for {}", url),
            }
        }

        errors
    }

    async fn save(&self, path: PathBuf, contents: &[u8], errors: &mut Vec<PersistError>) {
        match tokio::fs::write(&path, contents).await {
            Ok(()) => tracing::trace!("Wrote {}", path.display()),
            Err(source) => {
                tracing::warn!("Failed to write {}: {}", path.display(), source);
                errors.push(PersistError { path, source });
            }
        }
    }

    pub fn html_dir(&self) -> &Path {
        &self.html_dir
    }

    pub fn markdown_dir(&self) -> &Path {
        &self.markdown_dir
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }
}
