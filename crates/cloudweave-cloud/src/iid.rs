//! Canonical resource identity

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};

/// Dual identity of a canonical resource
///
/// `name_id` is chosen by the caller and survives provider re-creation;
/// `system_id` is assigned by the provider once creation is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Iid {
    #[serde(rename = "NameId")]
    pub name_id: String,

    #[serde(rename = "SystemId")]
    pub system_id: String,
}

impl Iid {
    pub fn new(name_id: impl Into<String>, system_id: impl Into<String>) -> Self {
        Self {
            name_id: name_id.into(),
            system_id: system_id.into(),
        }
    }

    /// Reference by name only; the system id is resolved from a live list.
    pub fn named(name_id: impl Into<String>) -> Self {
        Self::new(name_id, "")
    }

    pub fn system(system_id: impl Into<String>) -> Self {
        Self::new("", system_id)
    }

    pub fn is_valid(&self) -> bool {
        !self.name_id.is_empty() || !self.system_id.is_empty()
    }

    pub fn require_valid(&self, kind: &str) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CloudError::InvalidArgument(format!(
                "{} NameId or SystemId is required",
                kind
            )))
        }
    }

    /// True when either populated field equals the other IID's field.
    /// Names compare case-insensitively, matching provider list semantics.
    pub fn matches(&self, name: &str, system_id: &str) -> bool {
        if !self.system_id.is_empty() {
            return self.system_id == system_id;
        }
        self.name_id.eq_ignore_ascii_case(name)
    }
}

impl std::fmt::Display for Iid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.name_id.is_empty(), self.system_id.is_empty()) {
            (false, false) => write!(f, "{} ({})", self.name_id, self.system_id),
            (false, true) => write!(f, "{}", self.name_id),
            _ => write!(f, "{}", self.system_id),
        }
    }
}

/// Escape a NameId for use as a single store key segment.
pub fn escape_name_id(name_id: &str) -> String {
    name_id.replace('/', "%2F")
}

pub fn unescape_name_id(segment: &str) -> String {
    segment.replace("%2F", "/")
}
