//! The on-disk feature record and the component selector used to update it.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RegistryError;

/// Deployment state of one feature branch, stored as `<identifier>.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecord {
    /// Sanitized branch name, also the file's base name
    pub identifier: String,
    #[serde(default)]
    pub appserver_image_tag: String,
    #[serde(default)]
    pub ui_image_tag: String,
    /// Sort key for pruning, serialized as RFC3339
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_deployed: DateTime<Utc>,
}

/// Accept a full RFC3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid lastDeployed '{}': expected an RFC3339 timestamp or YYYY-MM-DD date",
            raw
        ))
    })
}

/// Parse a `lastDeployed` value, normalizing to UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl FeatureRecord {
    pub fn new(
        identifier: impl Into<String>,
        appserver_image_tag: impl Into<String>,
        ui_image_tag: impl Into<String>,
        last_deployed: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            appserver_image_tag: appserver_image_tag.into(),
            ui_image_tag: ui_image_tag.into(),
            last_deployed,
        }
    }

    /// File name backing this record
    pub fn file_name(&self) -> String {
        format!("{}.json", self.identifier)
    }
}

/// Which image tag a redeploy updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Appserver,
    Ui,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Appserver => "appserver",
            Component::Ui => "ui",
        }
    }
}

impl FromStr for Component {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "appserver" => Ok(Component::Appserver),
            "ui" => Ok(Component::Ui),
            other => Err(RegistryError::InvalidComponent {
                value: other.to_string(),
            }),
        }
    }
}
