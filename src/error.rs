// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the INSTEON library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, transport communication, persistence, and device operations.
//!
//! Note that a link request that times out without an answer is *not* an
//! error: it is reported as [`LinkOutcome::NoResponse`](crate::adapter::LinkOutcome).

use thiserror::Error;

use crate::types::Address;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the modem.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error occurred in the persistent link store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// No capabilities are known for this product class.
    #[error("unsupported device (category {category:#04x}, subcategory {subcategory:#04x})")]
    UnsupportedDevice {
        /// Device category reported by the device.
        category: u8,
        /// Device subcategory reported by the device.
        subcategory: u8,
    },

    /// Device was not found in the adapter.
    #[error("device not found")]
    DeviceNotFound,

    /// Device has no property with this name.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// Property cannot be written.
    #[error("property {0} is read-only")]
    ReadOnlyProperty(String),

    /// Value has the wrong kind for the property.
    #[error("invalid value {value} for property {property}")]
    InvalidPropertyValue {
        /// The property that was written.
        property: String,
        /// The rejected value.
        value: String,
    },

    /// Action input does not match the action's schema.
    #[error("invalid action input: {0}")]
    InvalidActionInput(String),

    /// A pairing attempt is already running.
    #[error("pairing already in progress")]
    PairingInProgress,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// An INSTEON address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A device identifier does not carry an INSTEON address.
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),
}

/// Errors reported by a [`Transport`](crate::protocol::Transport).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device refused the command.
    #[error("device {0} answered with a NAK")]
    Nak(Address),

    /// The pending request was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Serial port or socket failure.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors related to the persistent link store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: 150,
        };
        assert_eq!(err.to_string(), "value 150 is out of range [0, 100]");
    }

    #[test]
    fn error_from_transport_error() {
        let err: Error = TransportError::Timeout(500).into();
        assert!(matches!(err, Error::Transport(TransportError::Timeout(500))));
    }

    #[test]
    fn unsupported_device_display() {
        let err = Error::UnsupportedDevice {
            category: 0x05,
            subcategory: 0x0b,
        };
        assert_eq!(
            err.to_string(),
            "unsupported device (category 0x05, subcategory 0x0b)"
        );
    }

    #[test]
    fn nak_display_uses_dotted_address() {
        let address = Address::new([0x1a, 0x2b, 0x3c]);
        let err = TransportError::Nak(address);
        assert_eq!(err.to_string(), "device 1A.2B.3C answered with a NAK");
    }
}
