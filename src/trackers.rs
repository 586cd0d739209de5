//! Announce urls and how they are written to the metainfo.

use crate::config::{DEFAULT_LEGACY_PATH, DEFAULT_LEGACY_PORT};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::BuildError;

/// Ordered tracker urls. The first is the primary tracker.
#[derive(Debug, Clone)]
pub struct TrackerSpec {
    urls: Vec<String>,
    legacy_port: String,
    legacy_path: String,
}

/// What ends up in `announce` and `announce-list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announce {
    pub url: String,
    /// One tier per url, primary first
    pub list: Option<Vec<String>>,
}

impl TrackerSpec {
    pub fn new<I, S>(urls: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.is_empty() {
            return Err(BuildError::NoTrackers);
        }
        if let Some(i) = urls.iter().position(|u| u.trim().is_empty()) {
            return Err(BuildError::EmptyTracker(i + 1));
        }
        Ok(Self {
            urls,
            legacy_port: DEFAULT_LEGACY_PORT.to_string(),
            legacy_path: DEFAULT_LEGACY_PATH.to_string(),
        })
    }

    /// Port appended to a legacy primary url
    pub fn with_legacy_port(mut self, port: impl Into<String>) -> Self {
        self.legacy_port = port.into();
        self
    }

    /// Path appended to a legacy primary url
    pub fn with_legacy_path(mut self, path: impl Into<String>) -> Self {
        self.legacy_path = path.into();
        self
    }

    pub fn primary(&self) -> &str {
        &self.urls[0]
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Decide the `announce` value and whether an `announce-list` is written.
    ///
    /// A legacy primary url is rewritten to `<url>:<port><path>`, and any
    /// other urls are dropped since they can't be combined with it.
    pub fn announce(&self, diag: &mut dyn Diagnostics) -> Announce {
        let primary = self.primary();

        if is_legacy_url(primary) {
            let rewritten = format!("{}:{}{}", primary, self.legacy_port, self.legacy_path);
            diag.report(Diagnostic::LegacyTracker {
                url: primary.to_string(),
                rewritten: rewritten.clone(),
            });
            if self.urls.len() > 1 {
                diag.report(Diagnostic::ExtraTrackersDropped {
                    count: self.urls.len() - 1,
                });
            }
            return Announce {
                url: rewritten,
                list: None,
            };
        }

        Announce {
            url: primary.to_string(),
            list: (self.urls.len() > 1).then(|| self.urls.clone()),
        }
    }
}

/// A url with fewer than three `/`-separated segments after its scheme
/// carries no full announce path.
pub fn is_legacy_url(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split('/').filter(|s| !s.is_empty()).count() < 3
}
