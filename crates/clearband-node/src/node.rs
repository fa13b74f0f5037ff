//! The managed node: grant lifecycle, radio command surface, heartbeat
//! arming.
//!
//! A [`Node`] has a 1-to-1 relationship with a physical radio, addressed by
//! a stable identifier. The node owns at most one radio controller (created
//! exactly once through a mode-specific factory call), exactly one grant
//! record, and at most one armed heartbeat supervisor. All mutable state
//! sits behind one async mutex shared with the supervisor's timer task.
//!
//! The transmit-enable path exists only inside [`Node::change_grant_status`],
//! so the core invariant (transmitter on implies a TX-capable mode and an
//! `Authorized` grant) holds structurally rather than by caller discipline.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clearband_grant::{GrantRecord, GrantStatus};
use clearband_radio::{
    OperationMode, RadioFactory, RadioHandle, RxRadioConfig, RxTuning, TxRadioConfig,
    TxRxRadioConfig, TxTuning,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::device::{resolve_hardware, DeviceDirectory, HardwareInfo};
use crate::error::{Error, Result};
use crate::heartbeat::HeartbeatSupervisor;
use crate::report::{reporting_allowed, MeasurementCapability};

/// What the heartbeat fail-safe does beyond disabling the transmitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Disable the transmitter and leave the grant record intact.
    #[default]
    DisableTransmit,
    /// Disable the transmitter and reset the grant to the default record.
    ResetGrant,
}

/// Construction-time node options.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Heartbeat fail-safe behavior.
    pub expiry_policy: ExpiryPolicy,
}

impl NodeConfig {
    /// Set the heartbeat fail-safe behavior.
    #[must_use]
    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }
}

/// Everything a node command or a firing supervisor may touch.
struct NodeState {
    mode: Option<OperationMode>,
    radio: Option<RadioHandle>,
    registered: bool,
    cbsd_id: Option<String>,
    grant: GrantRecord,
    capabilities: HashSet<MeasurementCapability>,
    supervisor: Option<HeartbeatSupervisor>,
    next_generation: u64,
}

impl NodeState {
    fn new() -> Self {
        Self {
            mode: None,
            radio: None,
            registered: false,
            cbsd_id: None,
            grant: GrantRecord::default(),
            capabilities: HashSet::new(),
            supervisor: None,
            next_generation: 0,
        }
    }

    fn enable_transmit(&mut self) {
        if let Some(tx) = self.radio.as_mut().and_then(RadioHandle::tx_mut) {
            tx.enable_transmit();
        }
    }

    fn disable_transmit(&mut self) {
        if let Some(tx) = self.radio.as_mut().and_then(RadioHandle::tx_mut) {
            tx.disable_transmit();
        }
    }

    /// Remove and cancel the supervisor, if one is armed. Removal precedes
    /// the abort (via drop), so a concurrently fired callback can no longer
    /// match its generation.
    fn disarm_supervisor(&mut self) -> bool {
        self.supervisor.take().is_some()
    }
}

/// A managed radio in the shared-spectrum scheme.
pub struct Node {
    identifier: String,
    hardware: HardwareInfo,
    factory: Arc<dyn RadioFactory>,
    expiry_policy: ExpiryPolicy,
    state: Arc<Mutex<NodeState>>,
}

impl Node {
    /// Create a node for the radio at `identifier` with default options.
    ///
    /// The device directory is queried once for hardware metadata; a miss
    /// leaves the metadata absent and is not an error.
    pub fn new(
        identifier: impl Into<String>,
        directory: &dyn DeviceDirectory,
        factory: Arc<dyn RadioFactory>,
    ) -> Self {
        Self::with_config(identifier, directory, factory, NodeConfig::default())
    }

    /// Create a node with explicit options.
    pub fn with_config(
        identifier: impl Into<String>,
        directory: &dyn DeviceDirectory,
        factory: Arc<dyn RadioFactory>,
        config: NodeConfig,
    ) -> Self {
        let identifier = identifier.into();
        let hardware = resolve_hardware(&identifier, directory);
        if hardware.is_resolved() {
            debug!(
                node = %identifier,
                serial = ?hardware.serial,
                model = ?hardware.model,
                "hardware metadata resolved"
            );
        }
        Self {
            identifier,
            hardware,
            factory,
            expiry_policy: config.expiry_policy,
            state: Arc::new(Mutex::new(NodeState::new())),
        }
    }

    /// Stable handle of the underlying radio.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Hardware metadata resolved at construction.
    #[must_use]
    pub fn hardware(&self) -> &HardwareInfo {
        &self.hardware
    }

    /// The operation mode, fixed at radio creation; `None` before then.
    pub async fn operation_mode(&self) -> Option<OperationMode> {
        self.state.lock().await.mode
    }

    /// Snapshot of the current grant record.
    pub async fn grant(&self) -> GrantRecord {
        self.state.lock().await.grant.clone()
    }

    /// Whether the protocol layer has confirmed registration.
    pub async fn is_registered(&self) -> bool {
        self.state.lock().await.registered
    }

    /// The authority-assigned CBSD identifier, once registered.
    pub async fn cbsd_id(&self) -> Option<String> {
        self.state.lock().await.cbsd_id.clone()
    }

    /// Whether a heartbeat supervisor is currently armed.
    pub async fn heartbeat_armed(&self) -> bool {
        self.state.lock().await.supervisor.is_some()
    }

    /// Record a confirmed registration and the assigned CBSD identifier.
    pub async fn register(&self, cbsd_id: impl Into<String>) {
        let cbsd_id = cbsd_id.into();
        let mut state = self.state.lock().await;
        state.registered = true;
        info!(node = %self.identifier, cbsd_id = %cbsd_id, "registered with spectrum authority");
        state.cbsd_id = Some(cbsd_id);
    }

    /// Replace the measurement-reporting capability set.
    pub async fn set_measurement_capabilities(
        &self,
        capabilities: impl IntoIterator<Item = MeasurementCapability>,
    ) {
        let mut state = self.state.lock().await;
        state.capabilities = capabilities.into_iter().collect();
    }

    /// Replace the grant record wholesale, as issued by the authority.
    pub async fn set_grant(&self, grant: GrantRecord) {
        let mut state = self.state.lock().await;
        debug!(
            node = %self.identifier,
            status = %grant.status,
            id = ?grant.id,
            "grant record replaced"
        );
        state.grant = grant;
    }

    /// Create a transmit-only controller. Callable exactly once per node.
    pub async fn create_tx_radio(&self, config: TxRadioConfig) -> Result<()> {
        config.validate()?;
        let mut state = self.state.lock().await;
        self.ensure_no_radio(&state)?;
        let radio = self.factory.create_tx(&self.identifier, &config)?;
        self.install_radio(&mut state, RadioHandle::Tx(radio));
        Ok(())
    }

    /// Create a receive-only controller. Callable exactly once per node.
    pub async fn create_rx_radio(&self, config: RxRadioConfig) -> Result<()> {
        config.validate()?;
        let mut state = self.state.lock().await;
        self.ensure_no_radio(&state)?;
        let radio = self.factory.create_rx(&self.identifier, &config)?;
        self.install_radio(&mut state, RadioHandle::Rx(radio));
        Ok(())
    }

    /// Create a combined controller. Callable exactly once per node.
    ///
    /// The clamping policy runs first: out-of-range gain and source
    /// amplitude are pulled to the hardware bounds rather than rejected.
    /// Validation then applies to the clamped config.
    pub async fn create_tx_rx_radio(&self, config: TxRxRadioConfig) -> Result<()> {
        let config = config.clamped();
        config.validate()?;
        let mut state = self.state.lock().await;
        self.ensure_no_radio(&state)?;
        let radio = self.factory.create_tx_rx(&self.identifier, &config)?;
        self.install_radio(&mut state, RadioHandle::TxRx(radio));
        Ok(())
    }

    /// Transition the grant to `status` and actuate the transmitter
    /// accordingly.
    ///
    /// The record transition always happens first; enable/disable strictly
    /// follows it, so the transmitter is never enabled under a
    /// non-`Authorized` grant, even transiently. Transitioning to `Idle`
    /// additionally disarms any armed heartbeat supervisor.
    ///
    /// Authorizing a node with no transmit chain applies the transition and
    /// then reports an invalid-command condition, since there is nothing to
    /// enable. The disable direction on such a node is a silent no-op: a
    /// sensing-only node legitimately holds grants for reporting.
    pub async fn change_grant_status(&self, status: GrantStatus) -> Result<()> {
        let mut state = self.state.lock().await;
        let previous = state.grant.status;
        state.grant = state.grant.with_status(status);
        debug!(node = %self.identifier, from = %previous, to = %status, "grant status changed");

        if status == GrantStatus::Authorized {
            let mode = state.mode;
            if !mode.is_some_and(OperationMode::is_tx_capable) {
                warn!(node = %self.identifier, "authorized grant on a node with no transmit chain");
                return Err(Error::invalid_command("enable_transmit", mode));
            }
            state.enable_transmit();
        } else {
            state.disable_transmit();
        }

        if status == GrantStatus::Idle && state.disarm_supervisor() {
            debug!(node = %self.identifier, "heartbeat supervisor disarmed on grant reset");
        }
        Ok(())
    }

    /// Forward the supplied transmit-chain fields to the controller.
    ///
    /// Valid only on a TX-capable node; a mode mismatch aborts before any
    /// field is applied. Omitted fields keep their current values. A
    /// combined controller drives a noise source, so a waveform change is
    /// only forwarded on a transmit-only node.
    pub async fn update_tx_params(&self, tuning: TxTuning) -> Result<()> {
        let mut state = self.state.lock().await;
        let mode = state.mode;
        if !mode.is_some_and(OperationMode::is_tx_capable) {
            return Err(Error::invalid_command("update_tx_params", mode));
        }
        let tx = match state.radio.as_mut().and_then(RadioHandle::tx_mut) {
            Some(tx) => tx,
            None => return Err(Error::invalid_command("update_tx_params", mode)),
        };

        if let Some(hz) = tuning.center_freq_hz {
            tx.set_center_frequency(hz);
        }
        if let Some(hz) = tuning.bandwidth_hz {
            tx.set_bandwidth(hz);
        }
        if let Some(db) = tuning.gain_db {
            tx.set_gain(db);
        }
        if let Some(amplitude) = tuning.source_amplitude {
            tx.set_source_amplitude(amplitude);
        }
        if let Some(waveform) = tuning.waveform {
            if mode == Some(OperationMode::Tx) {
                tx.set_waveform(waveform);
            } else {
                debug!(
                    node = %self.identifier,
                    %waveform,
                    "combined controller drives a noise source; waveform change ignored"
                );
            }
        }
        Ok(())
    }

    /// Forward the supplied receive-chain fields to the controller.
    ///
    /// Valid only on an RX-capable node; a mode mismatch aborts before any
    /// field is applied. Omitted fields keep their current values.
    pub async fn update_rx_params(&self, tuning: RxTuning) -> Result<()> {
        let mut state = self.state.lock().await;
        let mode = state.mode;
        if !mode.is_some_and(OperationMode::is_rx_capable) {
            return Err(Error::invalid_command("update_rx_params", mode));
        }
        let rx = match state.radio.as_mut().and_then(RadioHandle::rx_mut) {
            Some(rx) => rx,
            None => return Err(Error::invalid_command("update_rx_params", mode)),
        };

        if let Some(hz) = tuning.center_freq_hz {
            rx.set_center_frequency(hz);
        }
        if let Some(hz) = tuning.bandwidth_hz {
            rx.set_bandwidth(hz);
        }
        if let Some(db) = tuning.gain_db {
            rx.set_gain(db);
        }
        Ok(())
    }

    /// Sample the spectrum probe, gated by reporting capability and grant
    /// status.
    ///
    /// Valid only on an RX-capable node. `Ok(None)` is the normal "not
    /// authorized/configured to report right now" outcome, not an error.
    pub async fn spectrum_probe_data(&self) -> Result<Option<Vec<f32>>> {
        let mut state = self.state.lock().await;
        let mode = state.mode;
        if !mode.is_some_and(OperationMode::is_rx_capable) {
            return Err(Error::invalid_command("spectrum_probe_data", mode));
        }
        if !reporting_allowed(&state.capabilities, state.grant.status) {
            debug!(
                node = %self.identifier,
                status = %state.grant.status,
                "measurement reporting gate closed"
            );
            return Ok(None);
        }
        match state.radio.as_mut().and_then(RadioHandle::rx_mut) {
            Some(rx) => Ok(Some(rx.sample_spectrum())),
            None => Err(Error::invalid_command("spectrum_probe_data", mode)),
        }
    }

    /// Arm the heartbeat supervisor for `interval`, replacing any armed one.
    ///
    /// The previous supervisor is cancelled first; a node never has two
    /// concurrent supervisors. Requires a live grant, which keeps the
    /// "supervisor armed implies grant live" invariant with the node rather
    /// than with caller discipline.
    pub async fn start_heartbeat_timer(&self, interval: Duration) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.grant.status.is_live() {
            return Err(Error::GrantNotLive {
                status: state.grant.status,
            });
        }
        if state.disarm_supervisor() {
            debug!(node = %self.identifier, "previous heartbeat supervisor replaced");
        }
        let generation = state.next_generation;
        state.next_generation += 1;

        let shared = Arc::downgrade(&self.state);
        let identifier = self.identifier.clone();
        let policy = self.expiry_policy;
        let on_expiry = async move {
            if let Some(shared) = shared.upgrade() {
                let mut state = shared.lock().await;
                let current = state.supervisor.as_ref().map(HeartbeatSupervisor::generation);
                if current != Some(generation) {
                    debug!(node = %identifier, generation, "stale heartbeat expiry ignored");
                    return;
                }
                // No await points below. Clearing the supervisor aborts our
                // own task handle, and an abort only lands at an await.
                state.supervisor = None;
                state.disable_transmit();
                if policy == ExpiryPolicy::ResetGrant {
                    state.grant = state.grant.with_status(GrantStatus::Idle);
                }
                info!(
                    node = %identifier,
                    "heartbeat interval elapsed without renewal; transmitter disabled"
                );
            }
        };
        state.supervisor = Some(HeartbeatSupervisor::arm(generation, interval, on_expiry));
        info!(
            node = %self.identifier,
            interval_ms = interval.as_millis() as u64,
            "heartbeat supervisor armed"
        );
        Ok(())
    }

    /// Cancel and clear the armed supervisor.
    ///
    /// Returns whether one was actually cancelled; calling with none armed
    /// is an informational no-op.
    pub async fn stop_heartbeat_timer(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.disarm_supervisor() {
            debug!(node = %self.identifier, "heartbeat supervisor cancelled");
            true
        } else {
            debug!(node = %self.identifier, "no active heartbeat supervisor to cancel");
            false
        }
    }

    /// Serializable summary of the node for operators and reporting layers.
    pub async fn snapshot(&self) -> NodeSnapshot {
        let state = self.state.lock().await;
        let mut capabilities: Vec<_> = state.capabilities.iter().copied().collect();
        capabilities.sort();
        NodeSnapshot {
            identifier: self.identifier.clone(),
            hardware: self.hardware.clone(),
            operation_mode: state.mode,
            registered: state.registered,
            cbsd_id: state.cbsd_id.clone(),
            grant: state.grant.clone(),
            capabilities,
            heartbeat_armed: state.supervisor.is_some(),
        }
    }

    fn ensure_no_radio(&self, state: &NodeState) -> Result<()> {
        match state.mode {
            Some(mode) => Err(Error::RadioExists {
                identifier: self.identifier.clone(),
                mode,
            }),
            None => Ok(()),
        }
    }

    fn install_radio(&self, state: &mut NodeState, radio: RadioHandle) {
        let mode = radio.mode();
        state.mode = Some(mode);
        state.radio = Some(radio);
        info!(node = %self.identifier, %mode, "radio controller created");
    }
}

/// Point-in-time summary of a node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub identifier: String,
    pub hardware: HardwareInfo,
    pub operation_mode: Option<OperationMode>,
    pub registered: bool,
    pub cbsd_id: Option<String>,
    pub grant: GrantRecord,
    pub capabilities: Vec<MeasurementCapability>,
    pub heartbeat_armed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceRecord;
    use clearband_grant::ChannelType;
    use clearband_radio::{RadioError, RxRadio, TxChainConfig, TxRadio, Waveform};
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Default)]
    struct RadioLog {
        enable_calls: u32,
        disable_calls: u32,
        tx_enabled: bool,
        tx_freq: Option<f64>,
        tx_bw: Option<f64>,
        tx_gain: Option<f64>,
        tx_amp: Option<f64>,
        tx_waveform: Option<Waveform>,
        rx_freq: Option<f64>,
        rx_bw: Option<f64>,
        rx_gain: Option<f64>,
        created_tx_rx: Option<TxRxRadioConfig>,
    }

    struct MockRadio {
        log: Arc<StdMutex<RadioLog>>,
    }

    impl TxRadio for MockRadio {
        fn enable_transmit(&mut self) {
            let mut log = self.log.lock().unwrap();
            log.enable_calls += 1;
            log.tx_enabled = true;
        }
        fn disable_transmit(&mut self) {
            let mut log = self.log.lock().unwrap();
            log.disable_calls += 1;
            log.tx_enabled = false;
        }
        fn set_center_frequency(&mut self, hz: f64) {
            self.log.lock().unwrap().tx_freq = Some(hz);
        }
        fn set_gain(&mut self, db: f64) {
            self.log.lock().unwrap().tx_gain = Some(db);
        }
        fn set_bandwidth(&mut self, hz: f64) {
            self.log.lock().unwrap().tx_bw = Some(hz);
        }
        fn set_source_amplitude(&mut self, amplitude: f64) {
            self.log.lock().unwrap().tx_amp = Some(amplitude);
        }
        fn set_waveform(&mut self, waveform: Waveform) {
            self.log.lock().unwrap().tx_waveform = Some(waveform);
        }
    }

    impl RxRadio for MockRadio {
        fn set_center_frequency(&mut self, hz: f64) {
            self.log.lock().unwrap().rx_freq = Some(hz);
        }
        fn set_gain(&mut self, db: f64) {
            self.log.lock().unwrap().rx_gain = Some(db);
        }
        fn set_bandwidth(&mut self, hz: f64) {
            self.log.lock().unwrap().rx_bw = Some(hz);
        }
        fn sample_spectrum(&self) -> Vec<f32> {
            vec![-80.0; 8]
        }
    }

    struct MockFactory {
        log: Arc<StdMutex<RadioLog>>,
        fail: bool,
    }

    impl RadioFactory for MockFactory {
        fn create_tx(
            &self,
            _identifier: &str,
            _config: &TxRadioConfig,
        ) -> std::result::Result<Box<dyn TxRadio>, RadioError> {
            if self.fail {
                return Err(RadioError::new("device unreachable"));
            }
            Ok(Box::new(MockRadio {
                log: Arc::clone(&self.log),
            }))
        }

        fn create_rx(
            &self,
            _identifier: &str,
            _config: &RxRadioConfig,
        ) -> std::result::Result<Box<dyn RxRadio>, RadioError> {
            if self.fail {
                return Err(RadioError::new("device unreachable"));
            }
            Ok(Box::new(MockRadio {
                log: Arc::clone(&self.log),
            }))
        }

        fn create_tx_rx(
            &self,
            _identifier: &str,
            config: &TxRxRadioConfig,
        ) -> std::result::Result<Box<dyn clearband_radio::TxRxRadio>, RadioError> {
            if self.fail {
                return Err(RadioError::new("device unreachable"));
            }
            self.log.lock().unwrap().created_tx_rx = Some(config.clone());
            Ok(Box::new(MockRadio {
                log: Arc::clone(&self.log),
            }))
        }
    }

    fn node_with_log() -> (Node, Arc<StdMutex<RadioLog>>) {
        let log = Arc::new(StdMutex::new(RadioLog::default()));
        let factory = Arc::new(MockFactory {
            log: Arc::clone(&log),
            fail: false,
        });
        let directory: Vec<DeviceRecord> = Vec::new();
        (Node::new("192.168.40.205", &directory, factory), log)
    }

    fn tx_config() -> TxRadioConfig {
        TxRadioConfig {
            center_freq_hz: 3_555_000_000.0,
            gain_db: 10.0,
            bandwidth_hz: 10_000_000.0,
            source_amplitude: 0.8,
            waveform: Waveform::Sine,
        }
    }

    fn rx_config() -> RxRadioConfig {
        RxRadioConfig::new(3_555_000_000.0, 0.0, 10_000_000.0)
    }

    fn txrx_config() -> TxRxRadioConfig {
        TxRxRadioConfig {
            tx: TxChainConfig {
                center_freq_hz: 3_555_000_000.0,
                gain_db: 10.0,
                bandwidth_hz: 10_000_000.0,
                source_amplitude: 0.8,
            },
            rx: rx_config(),
        }
    }

    fn granted_record() -> GrantRecord {
        GrantRecord::issued(
            "g-1",
            GrantStatus::Granted,
            Some(1_700_000_500),
            Some(30),
            Some(ChannelType::Gaa),
        )
    }

    async fn tx_node() -> (Node, Arc<StdMutex<RadioLog>>) {
        let (node, log) = node_with_log();
        node.create_tx_radio(tx_config()).await.unwrap();
        (node, log)
    }

    async fn rx_node() -> (Node, Arc<StdMutex<RadioLog>>) {
        let (node, log) = node_with_log();
        node.create_rx_radio(rx_config()).await.unwrap();
        (node, log)
    }

    async fn txrx_node() -> (Node, Arc<StdMutex<RadioLog>>) {
        let (node, log) = node_with_log();
        node.create_tx_rx_radio(txrx_config()).await.unwrap();
        (node, log)
    }

    #[test]
    fn construction_resolves_hardware_metadata() {
        let log = Arc::new(StdMutex::new(RadioLog::default()));
        let factory = Arc::new(MockFactory { log, fail: false });
        let directory = vec![DeviceRecord {
            addr: "192.168.40.205".to_string(),
            serial: Some("31B92AF".to_string()),
            product: Some("B210".to_string()),
            device_type: None,
        }];
        let node = Node::new("192.168.40.205", &directory, factory);
        assert_eq!(node.identifier(), "192.168.40.205");
        assert_eq!(node.hardware().serial.as_deref(), Some("31B92AF"));
        assert_eq!(node.hardware().model.as_deref(), Some("B210"));
    }

    #[test]
    fn hardware_lookup_miss_is_not_fatal() {
        let (node, _log) = node_with_log();
        assert!(!node.hardware().is_resolved());
    }

    #[tokio::test]
    async fn fresh_node_holds_the_default_grant_and_no_radio() {
        let (node, _log) = node_with_log();
        assert_eq!(node.grant().await, GrantRecord::default());
        assert_eq!(node.operation_mode().await, None);
        assert!(!node.is_registered().await);
        assert!(!node.heartbeat_armed().await);
    }

    #[tokio::test]
    async fn radio_creation_is_once_per_node() {
        let (node, _log) = tx_node().await;
        assert_eq!(node.operation_mode().await, Some(OperationMode::Tx));
        let err = node.create_rx_radio(rx_config()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RadioExists {
                mode: OperationMode::Tx,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_parameters_create_nothing() {
        let (node, _log) = node_with_log();
        let mut bad = tx_config();
        bad.center_freq_hz = 0.0;
        let err = node.create_tx_radio(bad).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(node.operation_mode().await, None);

        // Nothing was half-built: a later valid creation succeeds.
        node.create_tx_radio(tx_config()).await.unwrap();
        assert_eq!(node.operation_mode().await, Some(OperationMode::Tx));
    }

    #[tokio::test]
    async fn factory_refusal_surfaces_and_leaves_node_radioless() {
        let log = Arc::new(StdMutex::new(RadioLog::default()));
        let factory = Arc::new(MockFactory { log, fail: true });
        let directory: Vec<DeviceRecord> = Vec::new();
        let node = Node::new("192.168.40.1", &directory, factory);
        let err = node.create_tx_radio(tx_config()).await.unwrap_err();
        assert!(matches!(err, Error::Radio(_)));
        assert_eq!(node.operation_mode().await, None);
    }

    #[tokio::test]
    async fn combined_creation_clamps_before_the_factory_sees_the_config() {
        let (node, log) = node_with_log();
        let mut cfg = txrx_config();
        cfg.tx.gain_db = 40.0;
        cfg.tx.source_amplitude = -1.0;
        node.create_tx_rx_radio(cfg).await.unwrap();

        let created = log.lock().unwrap().created_tx_rx.clone().unwrap();
        assert_eq!(created.tx.gain_db, 31.5);
        assert_eq!(created.tx.source_amplitude, 0.0);
    }

    #[tokio::test]
    async fn authorization_toggles_the_transmitter() {
        let (node, log) = tx_node().await;
        node.set_grant(granted_record()).await;
        assert!(!log.lock().unwrap().tx_enabled);

        node.change_grant_status(GrantStatus::Authorized).await.unwrap();
        {
            let recorded = log.lock().unwrap();
            assert!(recorded.tx_enabled);
            assert_eq!(recorded.enable_calls, 1);
        }

        node.change_grant_status(GrantStatus::Granted).await.unwrap();
        assert!(!log.lock().unwrap().tx_enabled);
        // Fields carried over between live states.
        assert_eq!(node.grant().await.id.as_deref(), Some("g-1"));
    }

    #[tokio::test]
    async fn idle_transition_resets_the_record() {
        let (node, log) = tx_node().await;
        node.set_grant(granted_record()).await;
        node.change_grant_status(GrantStatus::Authorized).await.unwrap();
        node.change_grant_status(GrantStatus::Idle).await.unwrap();
        assert_eq!(node.grant().await, GrantRecord::default());
        assert!(!log.lock().unwrap().tx_enabled);
    }

    #[tokio::test]
    async fn authorizing_a_sensing_only_node_is_reported_not_fatal() {
        let (node, log) = rx_node().await;
        let err = node
            .change_grant_status(GrantStatus::Authorized)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { .. }));
        // The record transition still applied; actuation follows it.
        assert_eq!(node.grant().await.status, GrantStatus::Authorized);
        assert!(!log.lock().unwrap().tx_enabled);
    }

    #[tokio::test]
    async fn tx_tuning_applies_only_supplied_fields() {
        let (node, log) = tx_node().await;
        node.update_tx_params(
            TxTuning::default()
                .with_gain(12.0)
                .with_waveform(Waveform::Square),
        )
        .await
        .unwrap();

        let recorded = log.lock().unwrap();
        assert_eq!(recorded.tx_gain, Some(12.0));
        assert_eq!(recorded.tx_waveform, Some(Waveform::Square));
        assert_eq!(recorded.tx_freq, None);
        assert_eq!(recorded.tx_bw, None);
        assert_eq!(recorded.tx_amp, None);
    }

    #[tokio::test]
    async fn combined_node_ignores_waveform_tuning() {
        let (node, log) = txrx_node().await;
        node.update_tx_params(
            TxTuning::default()
                .with_waveform(Waveform::Square)
                .with_gain(5.0),
        )
        .await
        .unwrap();

        let recorded = log.lock().unwrap();
        assert_eq!(recorded.tx_waveform, None);
        assert_eq!(recorded.tx_gain, Some(5.0));
    }

    #[tokio::test]
    async fn rx_tuning_reaches_the_receive_chain() {
        let (node, log) = txrx_node().await;
        node.update_rx_params(
            RxTuning::default()
                .with_center_frequency(3_560_000_000.0)
                .with_bandwidth(5_000_000.0),
        )
        .await
        .unwrap();

        let recorded = log.lock().unwrap();
        assert_eq!(recorded.rx_freq, Some(3_560_000_000.0));
        assert_eq!(recorded.rx_bw, Some(5_000_000.0));
        assert_eq!(recorded.rx_gain, None);
    }

    #[tokio::test]
    async fn rx_commands_on_tx_node_change_nothing() {
        let (node, log) = tx_node().await;
        let err = node
            .update_rx_params(RxTuning::default().with_gain(10.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCommand {
                command: "update_rx_params",
                ..
            }
        ));
        assert_eq!(log.lock().unwrap().rx_gain, None);

        let err = node.spectrum_probe_data().await.unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { .. }));
    }

    #[tokio::test]
    async fn tx_commands_on_rx_node_change_nothing() {
        let (node, log) = rx_node().await;
        let err = node
            .update_tx_params(TxTuning::default().with_gain(3.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCommand { .. }));
        assert_eq!(log.lock().unwrap().tx_gain, None);
    }

    #[tokio::test]
    async fn reporting_gate_follows_capabilities_and_status() {
        let (node, _log) = rx_node().await;

        // No capabilities, idle grant: gate closed.
        assert_eq!(node.spectrum_probe_data().await.unwrap(), None);

        // Without-grant capability, idle grant: data flows.
        node.set_measurement_capabilities([MeasurementCapability::WithoutGrant])
            .await;
        assert!(node.spectrum_probe_data().await.unwrap().is_some());

        // With-grant capability, granted: data flows.
        node.set_measurement_capabilities([MeasurementCapability::WithGrant])
            .await;
        node.set_grant(granted_record()).await;
        assert!(node.spectrum_probe_data().await.unwrap().is_some());

        // With-grant capability, idle grant: gate closed again.
        node.change_grant_status(GrantStatus::Idle).await.unwrap();
        assert_eq!(node.spectrum_probe_data().await.unwrap(), None);
    }

    #[tokio::test]
    async fn arming_requires_a_live_grant() {
        let (node, _log) = tx_node().await;
        let err = node
            .start_heartbeat_timer(Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::GrantNotLive {
                status: GrantStatus::Idle
            }
        ));
        assert!(!node.heartbeat_armed().await);
    }

    #[tokio::test]
    async fn heartbeat_expiry_disables_transmitter_exactly_once() {
        let (node, log) = tx_node().await;
        node.set_grant(granted_record()).await;
        node.change_grant_status(GrantStatus::Authorized).await.unwrap();
        assert!(log.lock().unwrap().tx_enabled);

        node.start_heartbeat_timer(Duration::from_millis(40)).await.unwrap();
        assert!(node.heartbeat_armed().await);

        tokio::time::sleep(Duration::from_millis(160)).await;

        {
            let recorded = log.lock().unwrap();
            assert!(!recorded.tx_enabled);
            assert_eq!(recorded.disable_calls, 1, "fail-safe must disable exactly once");
        }
        assert!(!node.heartbeat_armed().await);
        // Default policy leaves the grant record intact.
        assert_eq!(node.grant().await.status, GrantStatus::Authorized);
    }

    #[tokio::test]
    async fn idle_transition_cancels_pending_expiry() {
        let (node, log) = tx_node().await;
        node.set_grant(granted_record()).await;
        node.change_grant_status(GrantStatus::Authorized).await.unwrap();
        node.start_heartbeat_timer(Duration::from_millis(40)).await.unwrap();

        node.change_grant_status(GrantStatus::Idle).await.unwrap();
        assert!(!node.heartbeat_armed().await);
        let disables_after_idle = log.lock().unwrap().disable_calls;

        tokio::time::sleep(Duration::from_millis(160)).await;

        let recorded = log.lock().unwrap();
        assert!(!recorded.tx_enabled);
        assert_eq!(
            recorded.disable_calls, disables_after_idle,
            "stale supervisor must never fire"
        );
        drop(recorded);
        assert_eq!(node.grant().await, GrantRecord::default());
    }

    #[tokio::test]
    async fn rearming_replaces_the_previous_supervisor() {
        let (node, log) = tx_node().await;
        node.set_grant(granted_record()).await;
        node.change_grant_status(GrantStatus::Authorized).await.unwrap();

        node.start_heartbeat_timer(Duration::from_secs(30)).await.unwrap();
        node.start_heartbeat_timer(Duration::from_millis(40)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(160)).await;

        let recorded = log.lock().unwrap();
        assert!(!recorded.tx_enabled);
        assert_eq!(recorded.disable_calls, 1);
    }

    #[tokio::test]
    async fn stop_heartbeat_timer_reports_whether_one_was_armed() {
        let (node, _log) = tx_node().await;
        assert!(!node.stop_heartbeat_timer().await);

        node.set_grant(granted_record()).await;
        node.change_grant_status(GrantStatus::Granted).await.unwrap();
        node.start_heartbeat_timer(Duration::from_secs(5)).await.unwrap();
        assert!(node.stop_heartbeat_timer().await);
        assert!(!node.stop_heartbeat_timer().await);
    }

    #[tokio::test]
    async fn reset_policy_returns_grant_to_idle_on_expiry() {
        let log = Arc::new(StdMutex::new(RadioLog::default()));
        let factory = Arc::new(MockFactory {
            log: Arc::clone(&log),
            fail: false,
        });
        let directory: Vec<DeviceRecord> = Vec::new();
        let node = Node::with_config(
            "192.168.40.9",
            &directory,
            factory,
            NodeConfig::default().with_expiry_policy(ExpiryPolicy::ResetGrant),
        );
        node.create_tx_radio(tx_config()).await.unwrap();
        node.set_grant(granted_record()).await;
        node.change_grant_status(GrantStatus::Authorized).await.unwrap();
        node.start_heartbeat_timer(Duration::from_millis(40)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(160)).await;

        assert_eq!(node.grant().await, GrantRecord::default());
        assert!(!log.lock().unwrap().tx_enabled);
    }

    #[tokio::test]
    async fn registration_and_snapshot() {
        let (node, _log) = tx_node().await;
        assert!(!node.is_registered().await);

        node.register("cbsd-0007").await;
        assert!(node.is_registered().await);
        assert_eq!(node.cbsd_id().await.as_deref(), Some("cbsd-0007"));

        node.set_measurement_capabilities([MeasurementCapability::WithGrant])
            .await;
        let snapshot = node.snapshot().await;
        assert_eq!(snapshot.identifier, "192.168.40.205");
        assert_eq!(snapshot.operation_mode, Some(OperationMode::Tx));
        assert!(snapshot.registered);
        assert!(!snapshot.heartbeat_armed);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["operation_mode"], "TX");
        assert_eq!(json["grant"]["grantStatus"], "IDLE");
        assert_eq!(json["capabilities"][0], "RECEIVED_POWER_WITH_GRANT");
    }
}
