// crates/folio-core/src/config.rs
// Site configuration - every field has a default so a page may omit any section

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration, usually embedded in the page as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub include: IncludeConfig,
    pub contact: ContactConfig,
    pub comments: CommentsConfig,
    pub nav: NavConfig,
    /// Quiet period before a structural-change rescan runs
    pub rescan_debounce_ms: u64,
    pub log_level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            include: IncludeConfig::default(),
            contact: ContactConfig::default(),
            comments: CommentsConfig::default(),
            nav: NavConfig::default(),
            rescan_debounce_ms: 50,
            log_level: "info".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rescan_debounce(&self) -> Duration {
        Duration::from_millis(self.rescan_debounce_ms)
    }

    /// Parsed log level, falling back to Info for unknown names
    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IncludeConfig {
    /// Attribute marking placeholders; its value is the fragment URL
    pub attribute: String,
    /// Token name -> default value, used when the placeholder has no `data-<name>`
    pub tokens: BTreeMap<String, String>,
    /// Extra origins fragments may be fetched from
    pub allowed_origins: Vec<String>,
    /// `None` waits forever
    pub timeout_ms: Option<u64>,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        let tokens = [("title", "Portfolio"), ("subtitle", "")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            attribute: "data-include".to_string(),
            tokens,
            allowed_origins: Vec::new(),
            timeout_ms: Some(10_000),
        }
    }
}

impl IncludeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub form_id: String,
    pub status_id: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/contact".to_string(),
            timeout_ms: 10_000,
            form_id: "contact-form".to_string(),
            status_id: "form-status".to_string(),
        }
    }
}

impl ContactConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Third-party comments widget. Nothing mounts while `script_src` is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub container_id: Option<String>,
    pub script_src: String,
    pub attributes: BTreeMap<String, String>,
}

impl CommentsConfig {
    pub fn container_id(&self) -> &str {
        self.container_id.as_deref().unwrap_or("comments")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub sticky_id: String,
    /// Scroll offset in pixels past which the bar turns sticky
    pub sticky_threshold: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            sticky_id: "site-nav".to_string(),
            sticky_threshold: 10.0,
        }
    }
}
