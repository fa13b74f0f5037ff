//! Measurement-report gating.
//!
//! Whether a node may forward spectrum sensing results depends on which
//! reporting capabilities the authority configured for it and on the
//! current grant status. A closed gate is a normal outcome, not an error:
//! it means "not authorized/configured to report right now".

use std::collections::HashSet;
use std::fmt;

use clearband_grant::GrantStatus;
use serde::{Deserialize, Serialize};

/// A measurement-reporting capability tag configured by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasurementCapability {
    /// Report received power while holding no grant (status `Idle`).
    #[serde(rename = "RECEIVED_POWER_WITHOUT_GRANT")]
    WithoutGrant,
    /// Report received power while a grant is live (`Granted`/`Authorized`).
    #[serde(rename = "RECEIVED_POWER_WITH_GRANT")]
    WithGrant,
}

impl fmt::Display for MeasurementCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithoutGrant => write!(f, "RECEIVED_POWER_WITHOUT_GRANT"),
            Self::WithGrant => write!(f, "RECEIVED_POWER_WITH_GRANT"),
        }
    }
}

/// Whether sensing results may be forwarded under `status` with the given
/// capability set.
#[must_use]
pub fn reporting_allowed(
    capabilities: &HashSet<MeasurementCapability>,
    status: GrantStatus,
) -> bool {
    match status {
        GrantStatus::Idle => capabilities.contains(&MeasurementCapability::WithoutGrant),
        GrantStatus::Granted | GrantStatus::Authorized => {
            capabilities.contains(&MeasurementCapability::WithGrant)
        }
    }
}
