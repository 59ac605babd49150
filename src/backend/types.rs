//! Browse API data types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of the filesystem endpoint being browsed.
///
/// Opaque to the browser; the grabarr API addresses remotes by their
/// database id, which is carried here verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteTarget(String);

impl RemoteTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RemoteTarget {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RemoteTarget {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Directory entry as returned by a listing call.
///
/// Field names follow rclone's `operations/list` output, which the grabarr
/// backend forwards unchanged for both listing transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Path as reported by the backend (not necessarily relative)
    #[serde(rename = "Path", default)]
    pub path: String,
    /// Entry name (not full path)
    #[serde(rename = "Name")]
    pub name: String,
    /// Size in bytes; directories usually report 0 or -1
    #[serde(rename = "Size", default)]
    pub size_bytes: i64,
    #[serde(rename = "MimeType", default)]
    pub mime_type: String,
    /// Last modified time; SFTP sessions report an empty string when unknown
    #[serde(rename = "ModTime", default, deserialize_with = "deserialize_mod_time")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(rename = "IsDir", default)]
    pub is_directory: bool,
}

impl DirectoryEntry {
    pub fn file(name: &str, size_bytes: i64) -> Self {
        Self {
            path: name.to_string(),
            name: name.to_string(),
            size_bytes,
            mime_type: String::new(),
            modified_at: None,
            is_directory: false,
        }
    }

    pub fn directory(name: &str) -> Self {
        Self {
            path: name.to_string(),
            name: name.to_string(),
            size_bytes: 0,
            mime_type: "inode/directory".to_string(),
            modified_at: None,
            is_directory: true,
        }
    }

    /// Substring after the last `.` of a file name, if any.
    pub fn extension(&self) -> Option<&str> {
        if self.is_directory {
            return None;
        }
        self.name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

fn deserialize_mod_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc)))
}
