//! Capability traits and ownership of radio controllers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{RxRadioConfig, TxRadioConfig, TxRxRadioConfig};
use crate::waveform::Waveform;

/// Which directions a node's radio supports.
///
/// Fixed when the controller is created and never reassigned; the node's
/// command surface is gated on it for the rest of the node's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationMode {
    /// Transmit only.
    #[serde(rename = "TX")]
    Tx,
    /// Receive/sensing only.
    #[serde(rename = "RX")]
    Rx,
    /// Simultaneous transmit and receive on one controller.
    #[serde(rename = "TXRX")]
    TxRx,
}

impl OperationMode {
    /// Whether this mode carries a transmit chain.
    #[must_use]
    pub fn is_tx_capable(self) -> bool {
        matches!(self, Self::Tx | Self::TxRx)
    }

    /// Whether this mode carries a receive chain.
    #[must_use]
    pub fn is_rx_capable(self) -> bool {
        matches!(self, Self::Rx | Self::TxRx)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tx => write!(f, "TX"),
            Self::Rx => write!(f, "RX"),
            Self::TxRx => write!(f, "TXRX"),
        }
    }
}

/// Failure reported by the hardware layer while creating a controller.
#[derive(Debug, Error)]
#[error("radio hardware error: {0}")]
pub struct RadioError(pub String);

impl RadioError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Transmit capability of a radio controller.
///
/// Parameter changes take effect immediately; implementations may block on
/// hardware I/O. `enable_transmit`/`disable_transmit` are idempotent,
/// side-effect-only switches: repeated calls in either state must succeed
/// and must not disturb the configured source amplitude.
pub trait TxRadio: Send {
    /// Turn the transmitter on at the configured source amplitude.
    fn enable_transmit(&mut self);

    /// Turn the transmitter off, keeping the configured amplitude for the
    /// next enable.
    fn disable_transmit(&mut self);

    /// Retune the transmit center frequency.
    fn set_center_frequency(&mut self, hz: f64);

    /// Change the transmit gain.
    fn set_gain(&mut self, db: f64);

    /// Change the transmit bandwidth.
    fn set_bandwidth(&mut self, hz: f64);

    /// Change the signal source amplitude (0 to 1).
    fn set_source_amplitude(&mut self, amplitude: f64);

    /// Change the generated waveform.
    fn set_waveform(&mut self, waveform: Waveform);
}

/// Receive/sensing capability of a radio controller.
pub trait RxRadio: Send {
    /// Retune the receive center frequency.
    fn set_center_frequency(&mut self, hz: f64);

    /// Change the receive gain.
    fn set_gain(&mut self, db: f64);

    /// Change the receive bandwidth.
    fn set_bandwidth(&mut self, hz: f64);

    /// Snapshot the current spectrum probe: one power value per FFT bin.
    /// Not a stream; each call is an independent sample.
    fn sample_spectrum(&self) -> Vec<f32>;
}

/// Combined capability: both chains on a single controller.
///
/// The accessors exist so a boxed combined controller can be driven through
/// either capability without upcasting; any `TxRadio + RxRadio` type gets
/// them for free from the blanket impl.
pub trait TxRxRadio: Send {
    /// The transmit chain of this controller.
    fn tx(&mut self) -> &mut dyn TxRadio;

    /// The receive chain of this controller.
    fn rx(&mut self) -> &mut dyn RxRadio;
}

impl<T> TxRxRadio for T
where
    T: TxRadio + RxRadio,
{
    fn tx(&mut self) -> &mut dyn TxRadio {
        self
    }

    fn rx(&mut self) -> &mut dyn RxRadio {
        self
    }
}

/// Mode-specific creation seam implemented by the hardware/simulation layer.
///
/// Configs arrive validated (and, for TX/RX, clamped); a factory only fails
/// for hardware-level reasons and reports them as a [`RadioError`].
pub trait RadioFactory: Send + Sync {
    /// Create a transmit-only controller for the device at `identifier`.
    fn create_tx(
        &self,
        identifier: &str,
        config: &TxRadioConfig,
    ) -> Result<Box<dyn TxRadio>, RadioError>;

    /// Create a receive-only controller for the device at `identifier`.
    fn create_rx(
        &self,
        identifier: &str,
        config: &RxRadioConfig,
    ) -> Result<Box<dyn RxRadio>, RadioError>;

    /// Create a combined controller for the device at `identifier`.
    fn create_tx_rx(
        &self,
        identifier: &str,
        config: &TxRxRadioConfig,
    ) -> Result<Box<dyn TxRxRadio>, RadioError>;
}

/// A node's exclusively owned radio controller.
pub enum RadioHandle {
    Tx(Box<dyn TxRadio>),
    Rx(Box<dyn RxRadio>),
    TxRx(Box<dyn TxRxRadio>),
}

impl RadioHandle {
    /// The operation mode this controller was created for.
    #[must_use]
    pub fn mode(&self) -> OperationMode {
        match self {
            Self::Tx(_) => OperationMode::Tx,
            Self::Rx(_) => OperationMode::Rx,
            Self::TxRx(_) => OperationMode::TxRx,
        }
    }

    /// The transmit chain, if this controller has one.
    pub fn tx_mut(&mut self) -> Option<&mut dyn TxRadio> {
        match self {
            Self::Tx(radio) => Some(radio.as_mut()),
            Self::TxRx(radio) => Some(radio.tx()),
            Self::Rx(_) => None,
        }
    }

    /// The receive chain, if this controller has one.
    pub fn rx_mut(&mut self) -> Option<&mut dyn RxRadio> {
        match self {
            Self::Rx(radio) => Some(radio.as_mut()),
            Self::TxRx(radio) => Some(radio.rx()),
            Self::Tx(_) => None,
        }
    }
}

impl fmt::Debug for RadioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RadioHandle").field(&self.mode()).finish()
    }
}
