//! Configuration loading and management

use crate::core::engine::ListSettings;
use crate::core::error::ConfigError;
use crate::core::feed::FeedLimits;
use crate::core::sort::SortDirection;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Page size of each list view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub users: usize,
    pub drivers: usize,
    pub rides: usize,
    pub payments: usize,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            users: 10,
            drivers: 12,
            rides: 10,
            payments: 10,
        }
    }
}

impl PageSizes {
    /// Page size for a plural resource name, `None` if unknown
    pub fn for_resource(&self, resource: &str) -> Option<usize> {
        match resource {
            "users" => Some(self.users),
            "drivers" => Some(self.drivers),
            "rides" => Some(self.rides),
            "payments" => Some(self.payments),
            _ => None,
        }
    }
}

/// Complete portal configuration
///
/// ```yaml
/// api_base_url: http://localhost:8080/api
/// request_timeout_secs: 15
/// page_sizes:
///   drivers: 24
/// sort_overrides:
///   drivers:
///     name: desc
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the REST backend, without a trailing slash
    pub api_base_url: String,

    pub request_timeout_secs: u64,

    pub page_sizes: PageSizes,

    pub feed: FeedLimits,

    /// resource -> sort key -> direction the key starts with
    pub sort_overrides: HashMap<String, HashMap<String, SortDirection>>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            request_timeout_secs: 30,
            page_sizes: PageSizes::default(),
            feed: FeedLimits::default(),
            sort_overrides: HashMap::new(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no view can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                value: self.api_base_url.clone(),
                message: "must be an http(s) URL".to_string(),
            });
        }

        let sizes = [
            ("users", self.page_sizes.users),
            ("drivers", self.page_sizes.drivers),
            ("rides", self.page_sizes.rides),
            ("payments", self.page_sizes.payments),
        ];
        if let Some((resource, size)) = sizes.iter().find(|(_, size)| *size == 0) {
            return Err(ConfigError::InvalidValue {
                field: format!("page_sizes.{}", resource),
                value: size.to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if let Some(resource) = self
            .sort_overrides
            .keys()
            .find(|r| self.page_sizes.for_resource(r).is_none())
        {
            return Err(ConfigError::InvalidValue {
                field: "sort_overrides".to_string(),
                value: resource.clone(),
                message: "unknown resource".to_string(),
            });
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    /// Engine settings for the list view of `resource`
    pub fn list_settings(&self, resource: &str) -> ListSettings {
        let page_size = self
            .page_sizes
            .for_resource(resource)
            .unwrap_or(PageSizes::default().users);
        ListSettings {
            page_size,
            sort_overrides: self
                .sort_overrides
                .get(resource)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8080/api");
        assert_eq!(config.list_settings("drivers").page_size, 12);
        assert_eq!(config.list_settings("payments").page_size, 10);
        assert_eq!(config.feed.total, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ConsoleConfig::from_yaml_str(
            r#"
api_base_url: https://rides.example.com/api/
page_sizes:
  drivers: 24
sort_overrides:
  drivers:
    name: desc
"#,
        )
        .unwrap();

        assert_eq!(config.base_url(), "https://rides.example.com/api");
        let settings = config.list_settings("drivers");
        assert_eq!(settings.page_size, 24);
        assert_eq!(settings.sort_overrides.get("name"), Some(&SortDirection::Desc));
        assert_eq!(config.list_settings("users").page_size, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = ConsoleConfig::from_yaml_str("page_sizes:\n  rides: 0\n").unwrap_err();
        assert!(err.to_string().contains("page_sizes.rides"));

        let err = ConsoleConfig::from_yaml_str("api_base_url: ftp://nope\n").unwrap_err();
        assert!(err.to_string().contains("api_base_url"));

        let err = ConsoleConfig::from_yaml_str("sort_overrides:\n  cars:\n    name: asc\n")
            .unwrap_err();
        assert!(err.to_string().contains("unknown resource"));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let config = ConsoleConfig {
            request_timeout_secs: 5,
            ..ConsoleConfig::default()
        };
        write!(file, "{}", serde_yaml::to_string(&config).unwrap()).unwrap();

        let parsed = ConsoleConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file() {
        let err = ConsoleConfig::from_yaml_file("/nonexistent/ridedesk.yaml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::FileNotFound { .. })
        ));
    }
}
