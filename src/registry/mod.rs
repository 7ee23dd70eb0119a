//! Access to the resource registry.
//!
//! The registry is the remote control plane that knows which managed
//! resources exist. Tether never talks to it directly: it shells out to a
//! control command (see [`CommandRegistry`]) and parses the text it prints.
//! The [`ResourceRegistry`] trait is the seam the validator and the
//! recovery flow depend on, so both can be driven by a fake in tests.

pub mod command;
pub mod error;
pub mod output;

pub use command::CommandRegistry;
pub use error::RegistryError;

use crate::core::{find_record, ResourceRecord};

/// Outcome of looking a resource up by name or id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A record whose id or name matched.
    Found(ResourceRecord),
    /// No match; carries the full listing so callers can offer alternatives
    /// without another round-trip.
    Missing { available: Vec<ResourceRecord> },
}

impl Lookup {
    /// Resolve `key` against an already fetched listing.
    pub fn resolve(records: Vec<ResourceRecord>, key: &str) -> Self {
        match find_record(&records, key) {
            Some(record) => Lookup::Found(record.clone()),
            None => Lookup::Missing { available: records },
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn record(&self) -> Option<&ResourceRecord> {
        match self {
            Lookup::Found(record) => Some(record),
            Lookup::Missing { .. } => None,
        }
    }
}

/// Operations against the resource registry.
///
/// Every call blocks for the duration of the underlying request. None of
/// them retry; retry policy belongs to the caller.
pub trait ResourceRegistry {
    /// All resources currently known to the registry.
    fn list(&self) -> Result<Vec<ResourceRecord>, RegistryError>;

    /// Create a resource called `name` and return the new record.
    fn create(&self, name: &str) -> Result<ResourceRecord, RegistryError>;

    /// Look up a resource by name or id.
    fn exists(&self, name_or_id: &str) -> Result<Lookup, RegistryError> {
        Ok(Lookup::resolve(self.list()?, name_or_id))
    }
}
