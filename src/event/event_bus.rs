// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting adapter notifications.

use tokio::sync::broadcast;

use crate::property::PropertyValue;

use super::{DeviceEvent, DeviceId};

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus carrying adapter notifications to the host.
///
/// Backed by a tokio broadcast channel: every subscriber (thing registry,
/// UI, logger) receives its own copy of each event. A subscriber that falls
/// more than the channel capacity behind receives `RecvError::Lagged` and
/// misses the oldest events; publishers never block.
///
/// # Examples
///
/// ```
/// use insteon_lib::event::{DeviceEvent, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.prompt("Scan complete. Added 0 devices.");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus buffering at most `capacity` events per
    /// subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event; discarded when nobody listens.
    pub fn publish(&self, event: DeviceEvent) {
        let _ = self.sender.send(event);
    }

    /// Publishes a property value change.
    pub fn property_changed(&self, device_id: DeviceId, property: &str, value: PropertyValue) {
        tracing::debug!(%device_id, property, ?value, "Property changed");
        self.publish(DeviceEvent::property_changed(device_id, property, value));
    }

    /// Publishes a device event such as `FastOn` or `Heartbeat`.
    pub fn raise(&self, device_id: DeviceId, event: &str) {
        tracing::debug!(%device_id, event, "Event raised");
        self.publish(DeviceEvent::event_raised(device_id, event));
    }

    /// Publishes operator-facing status text.
    pub fn prompt(&self, message: impl Into<String>) {
        self.publish(DeviceEvent::prompt(message, None));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
