//! Spectrum grant lifecycle records.
//!
//! A grant is a time-bounded authorization for one node to transmit on a
//! given channel. Every node owns exactly one [`GrantRecord`] at all times;
//! a node without an authorization holds the default record in the
//! [`GrantStatus::Idle`] state. The authority replaces the record wholesale
//! when it issues a grant, and returning to `Idle` always resets the record
//! to its default shape, so accumulated fields never leak across grants.
//!
//! # Invariant
//!
//! `status == Idle` implies that `id`, `expires_at`,
//! `heartbeat_interval_secs`, and `channel_type` are all `None`. The
//! constructors and [`GrantRecord::with_status`] uphold this; no other
//! mutation path exists.
//!
//! Transition *legality* (which status may follow which) is deliberately not
//! enforced here; that is the node's responsibility. This layer only
//! guarantees the shape of the record.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Authorization state of a grant.
///
/// `Idle` is the default and reset state: the node holds no authorization.
/// `Granted` means the authority has issued a grant but transmission is not
/// yet permitted; `Authorized` permits transmission until the next heartbeat
/// deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum GrantStatus {
    /// No authorization held.
    #[default]
    Idle,
    /// Grant issued, transmission not yet permitted.
    Granted,
    /// Transmission permitted until the heartbeat deadline.
    Authorized,
}

impl GrantStatus {
    /// Whether a grant in this status is live (issued and not reset).
    ///
    /// A live grant is awaiting heartbeat renewal; the heartbeat supervisor
    /// may only be armed while the grant is live.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Granted | Self::Authorized)
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Granted => write!(f, "GRANTED"),
            Self::Authorized => write!(f, "AUTHORIZED"),
        }
    }
}

/// Channel class assigned with a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChannelType {
    /// Priority Access License channel.
    #[cfg_attr(feature = "serde", serde(rename = "PAL"))]
    Pal,
    /// General Authorized Access channel.
    #[cfg_attr(feature = "serde", serde(rename = "GAA"))]
    Gaa,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pal => write!(f, "PAL"),
            Self::Gaa => write!(f, "GAA"),
        }
    }
}

/// Authorization state for one node.
///
/// Field spellings follow the authority's wire protocol, so a decoded grant
/// or heartbeat response deserializes directly into this record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrantRecord {
    /// Identifier assigned by the authority on a successful grant request.
    #[cfg_attr(feature = "serde", serde(rename = "grantId", default))]
    pub id: Option<String>,

    /// Current authorization state.
    #[cfg_attr(feature = "serde", serde(rename = "grantStatus", default))]
    pub status: GrantStatus,

    /// Unix time (seconds) at which the grant stops being valid.
    /// Meaningful only while the grant is live.
    #[cfg_attr(feature = "serde", serde(rename = "grantExpireTime", default))]
    pub expires_at: Option<u64>,

    /// Maximum seconds allowed between heartbeats while the grant is live.
    #[cfg_attr(feature = "serde", serde(rename = "heartbeatInterval", default))]
    pub heartbeat_interval_secs: Option<u64>,

    /// Channel class the grant was issued on.
    #[cfg_attr(feature = "serde", serde(rename = "channelType", default))]
    pub channel_type: Option<ChannelType>,
}

impl GrantRecord {
    /// The default record: `Idle`, all fields absent.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Wholesale replacement record for a grant issued by the authority.
    ///
    /// An `Idle` issuance is normalized to the default record, so the shape
    /// invariant holds no matter what the caller passes alongside it.
    #[must_use]
    pub fn issued(
        id: impl Into<String>,
        status: GrantStatus,
        expires_at: Option<u64>,
        heartbeat_interval_secs: Option<u64>,
        channel_type: Option<ChannelType>,
    ) -> Self {
        if status == GrantStatus::Idle {
            return Self::default();
        }
        Self {
            id: Some(id.into()),
            status,
            expires_at,
            heartbeat_interval_secs,
            channel_type,
        }
    }

    /// Produce a record with `status` replaced.
    ///
    /// All other fields carry over, except that transitioning to `Idle`
    /// yields the full default record (the documented reset behavior).
    #[must_use]
    pub fn with_status(&self, status: GrantStatus) -> Self {
        if status == GrantStatus::Idle {
            return Self::default();
        }
        Self {
            status,
            ..self.clone()
        }
    }

    /// Heartbeat interval as a [`Duration`], if the authority supplied one.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval_secs.map(Duration::from_secs)
    }

    /// Whether a live grant has passed its expire time.
    ///
    /// An `Idle` record never expires (there is nothing to expire), and a
    /// live record without an expire time is treated as unexpired.
    #[must_use]
    pub fn is_expired(&self, now_unix: u64) -> bool {
        self.status.is_live() && self.expires_at.is_some_and(|t| t <= now_unix)
    }
}
