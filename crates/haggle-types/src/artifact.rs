//! Download artifact types
//!
//! The artifact is what the buyer ultimately receives: a download locator
//! plus an unguessable access key, valid for a bounded window. Expiry is
//! enforced at redeem time, not merely advertised.

use crate::{AccessKey, ResourceId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a released artifact stays redeemable
pub const ARTIFACT_VALIDITY_HOURS: i64 = 48;

/// A released download artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadArtifact {
    /// Resource this artifact grants access to
    pub resource_id: ResourceId,
    /// Download locator
    pub url: String,
    /// Bearer key required to redeem the download
    pub access_key: AccessKey,
    /// Hard expiry; redeeming after this fails
    pub expires_at: DateTime<Utc>,
}

impl DownloadArtifact {
    /// Compute the expiry for an artifact released now
    pub fn expiry_from(released_at: DateTime<Utc>) -> DateTime<Utc> {
        released_at + Duration::hours(ARTIFACT_VALIDITY_HOURS)
    }

    /// Whether the artifact is still redeemable at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_validity_window() {
        let released = Utc::now();
        let artifact = DownloadArtifact {
            resource_id: ResourceId::new("housing"),
            url: "https://downloads.example/housing".to_string(),
            access_key: AccessKey::new("k"),
            expires_at: DownloadArtifact::expiry_from(released),
        };

        assert!(artifact.is_valid_at(released));
        assert!(artifact.is_valid_at(released + Duration::hours(47)));
        assert!(!artifact.is_valid_at(released + Duration::hours(49)));
    }
}
