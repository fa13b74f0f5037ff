//! Clearband node orchestration.
//!
//! Each physical radio is represented by one [`Node`]: a managed wrapper
//! that tracks registration with the spectrum authority, a single
//! time-bounded usage authorization (the grant), and a heartbeat liveness
//! contract. If the heartbeat is not renewed in time, a fail-safe
//! [`HeartbeatSupervisor`] forcibly disables the transmitter.
//!
//! The external protocol layer decodes authority responses and calls into
//! the node (`register`, `set_grant`, `change_grant_status`,
//! `start_heartbeat_timer`, …); the node mutates its grant record, drives
//! its radio controller, and arms or disarms heartbeat supervision. An
//! external reporting layer calls `spectrum_probe_data` to decide whether
//! sensing results may be forwarded.
//!
//! # Concurrency
//!
//! Node commands run on whatever task the protocol layer calls from; the
//! heartbeat supervisor fires on an independent timer task. Everything the
//! two can touch lives behind one per-node async mutex, and a fired
//! supervisor validates its generation token under that lock before acting,
//! so command/expiry interleavings cannot produce an inconsistent state.
//! Nodes are independent of each other; there is no cross-node locking.

pub mod device;
pub mod error;
pub mod heartbeat;
pub mod node;
pub mod report;

pub use device::{resolve_hardware, DeviceDirectory, DeviceRecord, HardwareInfo};
pub use error::{Error, Result};
pub use heartbeat::HeartbeatSupervisor;
pub use node::{ExpiryPolicy, Node, NodeConfig, NodeSnapshot};
pub use report::{reporting_allowed, MeasurementCapability};

// Re-export the value layers the node surface is built from.
pub use clearband_grant::{ChannelType, GrantRecord, GrantStatus};
pub use clearband_radio::{OperationMode, RadioFactory, RxTuning, TxTuning};
