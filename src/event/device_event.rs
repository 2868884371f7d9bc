// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use serde::{Deserialize, Serialize};

use crate::property::PropertyValue;

use super::DeviceId;

/// Notifications emitted by the adapter for the host's thing registry.
///
/// # Examples
///
/// ```
/// use insteon_lib::event::{DeviceEvent, DeviceId};
/// use insteon_lib::property::PropertyValue;
/// use insteon_lib::types::Address;
///
/// let device_id = DeviceId::from_address(Address::new([1, 2, 3]));
///
/// let added = DeviceEvent::device_added(device_id);
/// assert!(added.is_lifecycle());
///
/// let changed = DeviceEvent::property_changed(device_id, "on", PropertyValue::Bool(true));
/// assert_eq!(changed.device_id(), Some(device_id));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A device was added to the adapter.
    DeviceAdded {
        /// The ID of the added device.
        device_id: DeviceId,
    },

    /// A device was removed from the adapter.
    DeviceRemoved {
        /// The ID of the removed device.
        device_id: DeviceId,
    },

    /// A cached property value changed.
    PropertyChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// Property name.
        property: String,
        /// The new value.
        value: PropertyValue,
    },

    /// A device raised one of its declared events.
    EventRaised {
        /// The ID of the device.
        device_id: DeviceId,
        /// Event name.
        event: String,
    },

    /// Status text for the operator during pairing and scanning.
    PairingPrompt {
        /// Text to show.
        message: String,
        /// Device the prompt refers to, if any.
        device_id: Option<DeviceId>,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        match self {
            Self::DeviceAdded { device_id }
            | Self::DeviceRemoved { device_id }
            | Self::PropertyChanged { device_id, .. }
            | Self::EventRaised { device_id, .. } => Some(*device_id),
            Self::PairingPrompt { device_id, .. } => *device_id,
        }
    }

    /// Returns `true` if this is a device lifecycle event (added/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::DeviceAdded { .. } | Self::DeviceRemoved { .. })
    }

    /// Creates a device added event.
    #[must_use]
    pub fn device_added(device_id: DeviceId) -> Self {
        Self::DeviceAdded { device_id }
    }

    /// Creates a device removed event.
    #[must_use]
    pub fn device_removed(device_id: DeviceId) -> Self {
        Self::DeviceRemoved { device_id }
    }

    /// Creates a property changed event.
    #[must_use]
    pub fn property_changed(
        device_id: DeviceId,
        property: impl Into<String>,
        value: PropertyValue,
    ) -> Self {
        Self::PropertyChanged {
            device_id,
            property: property.into(),
            value,
        }
    }

    /// Creates an event raised notification.
    #[must_use]
    pub fn event_raised(device_id: DeviceId, event: impl Into<String>) -> Self {
        Self::EventRaised {
            device_id,
            event: event.into(),
        }
    }

    /// Creates an operator prompt.
    #[must_use]
    pub fn prompt(message: impl Into<String>, device_id: Option<DeviceId>) -> Self {
        Self::PairingPrompt {
            message: message.into(),
            device_id,
        }
    }
}
