//! Radio controller contracts and configuration policy.
//!
//! A node drives its physical radio exclusively through the capability
//! traits in this crate: [`TxRadio`] for the transmit chain, [`RxRadio`] for
//! the receive/sensing chain, and [`TxRxRadio`] for hardware that carries
//! both on one controller. The hardware (or simulation) layer implements
//! these plus the [`RadioFactory`] creation seam; the node layer owns the
//! resulting controller through a [`RadioHandle`] and never sees past the
//! trait boundary.
//!
//! Configuration is validated *before* a controller is created:
//!
//! - Hard validation ([`TxRadioConfig::validate`], [`RxRadioConfig::validate`],
//!   [`TxRxRadioConfig::validate`]) refuses nonsensical physical parameters;
//!   nothing is constructed on failure.
//! - The clamping policy ([`TxRxRadioConfig::clamped`]) pulls out-of-range
//!   gain and source amplitude back to the device limits instead of
//!   rejecting them. Callers routinely pass percentage-style or unscaled
//!   values; that is a recoverable condition, logged but never an error.

mod controller;
mod params;
mod waveform;

pub use controller::{
    OperationMode, RadioError, RadioFactory, RadioHandle, RxRadio, TxRadio, TxRxRadio,
};
pub use params::{
    ConfigError, RxRadioConfig, RxTuning, TxChainConfig, TxRadioConfig, TxRxRadioConfig, TxTuning,
    DEFAULT_SPECTRUM_BINS, SOURCE_AMPLITUDE_MAX, SOURCE_AMPLITUDE_MIN, TX_GAIN_MAX_DB,
    TX_GAIN_MIN_DB,
};
pub use waveform::Waveform;
