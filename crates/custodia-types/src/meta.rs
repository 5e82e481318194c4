use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::EvidenceId;

/// Where a piece of evidence came from.
///
/// Provider and collector names are opaque to the core; they are whatever
/// the acquiring collector reports (`"aws"` / `"cloudtrail"`,
/// `"docker"` / `"container-logs"`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Platform the evidence was acquired from (e.g. `"aws"`, `"k8s"`).
    pub provider: String,
    /// The collector implementation that produced the evidence.
    pub collector: String,
    /// Provider-side resource the evidence describes (instance id,
    /// container id, bucket/key, ...). May be empty.
    #[serde(default)]
    pub resource: String,
}

impl SourceDescriptor {
    pub fn new(provider: impl Into<String>, collector: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            collector: collector.into(),
            resource: String::new(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }
}

/// Collector-supplied metadata for one piece of acquired evidence.
///
/// The acquisition timestamp is descriptive, not authoritative: integrity
/// comes from the hash chain, never from collector clocks. Unknown extra
/// attributes are carried through opaquely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    /// Identifier unique within the case.
    pub evidence_id: EvidenceId,
    /// Where the evidence came from.
    pub source: SourceDescriptor,
    /// When the collector acquired the evidence.
    pub acquired_at: DateTime<Utc>,
    /// Where the acquired bytes were stored (a path for filesystem
    /// storage; any addressable locator otherwise). Resolvers use this
    /// to re-open the artifact at verification time.
    pub location: String,
    /// Free-form key/value attributes, carried opaquely.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl EvidenceMetadata {
    /// Metadata with the current time as the acquisition timestamp.
    pub fn new(
        evidence_id: EvidenceId,
        source: SourceDescriptor,
        location: impl Into<String>,
    ) -> Self {
        Self {
            evidence_id,
            source,
            acquired_at: Utc::now(),
            location: location.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Attach a free-form attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
