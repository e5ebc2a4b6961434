//! Where vendor page text comes from.
//!
//! The library never talks to the network. Hosts plug their own retrieval in
//! through [`PageSource`]; [`FilePageSource`] covers pages saved to disk.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// One attempt was made and failed; callers may retry.
    #[error("source unavailable: {location}: {reason}")]
    SourceUnavailable { location: String, reason: String },
}

impl FetchError {
    pub fn unavailable(location: impl Into<String>, reason: impl ToString) -> Self {
        FetchError::SourceUnavailable {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

/// Blocking, single-attempt page retrieval.
pub trait PageSource {
    fn fetch_page(&self, location: &str) -> Result<String, FetchError>;
}

impl<F> PageSource for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch_page(&self, location: &str) -> Result<String, FetchError> {
        self(location)
    }
}

/// Reads pages from local files (HTML or plain text).
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePageSource;

impl PageSource for FilePageSource {
    fn fetch_page(&self, location: &str) -> Result<String, FetchError> {
        if is_url(location) {
            return Err(FetchError::unavailable(location, "network retrieval is not available here"));
        }
        let bytes = std::fs::read(Path::new(location)).map_err(|e| FetchError::unavailable(location, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

pub fn is_url(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
