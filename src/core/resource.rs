//! Records known to the resource registry.

use std::fmt;

use serde::Serialize;

/// A resource as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
}

impl ResourceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        ResourceRecord {
            id: id.into(),
            name: name.into(),
        }
    }

    /// True if `key` is this record's id or name.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// First record whose id or name equals `key`.
pub fn find_record<'a>(records: &'a [ResourceRecord], key: &str) -> Option<&'a ResourceRecord> {
    records.iter().find(|r| r.matches(key))
}
