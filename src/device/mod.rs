// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! INSTEON devices.
//!
//! A [`Device`] is assembled once from its capability tags and never changes
//! shape afterwards. Its state is the set of cached property values, kept
//! current by two interleaved channels:
//!
//! - [`Device::dispatch_message`] for unsolicited reports, which never waits
//!   on the network: any follow-up poll runs in a detached task
//! - [`Device::poll`] for explicit status requests
//!
//! Devices are shared as `Arc<Device<T>>` between the adapter registry and
//! those detached tasks.

mod assembly;
mod description;

pub use description::{ActionDescription, DeviceDescription, EventDescription};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::capabilities::{self, Capabilities};
use crate::config::Timing;
use crate::error::{Error, Result, TransportError};
use crate::event::{DeviceId, EventBus};
use crate::property::{Property, PropertyValue};
use crate::protocol::{
    HEARTBEAT_GROUP, LOW_BATTERY_GROUP, LinkRecord, LinkRequest, Message, Transport,
    TurnOnOptions,
};
use crate::types::{Address, Level};

/// Names of the events devices raise.
pub mod events {
    /// Double tap on.
    pub const FAST_ON: &str = "FastOn";
    /// Double tap off.
    pub const FAST_OFF: &str = "FastOff";
    /// Battery device heartbeat (group 4).
    pub const HEARTBEAT: &str = "Heartbeat";
    /// Battery device low-battery warning (group 3).
    pub const LOW_BATTERY: &str = "Low Battery";
}

/// Names of the actions devices perform.
pub mod actions {
    /// Timed level transition, input `{level, duration}`.
    pub const FADE: &str = "Fade";
    /// Immediate status poll. Always available, never declared.
    pub const POLL: &str = "Poll";
}

/// Identity of a device on the INSTEON network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device address.
    pub address: Address,
    /// Device category.
    pub category: u8,
    /// Device subcategory.
    pub subcategory: u8,
    /// Human readable title.
    pub title: String,
}

impl DeviceInfo {
    /// Creates the identity with a title derived from the product class.
    #[must_use]
    pub fn new(address: Address, category: u8, subcategory: u8) -> Self {
        let name = capabilities::product_name(category, subcategory).unwrap_or("INSTEON Device");
        Self {
            address,
            category,
            subcategory,
            title: format!("{name} [{address}]"),
        }
    }

    /// Overrides the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// A device built from its capability tags.
#[derive(Debug)]
pub struct Device<T> {
    id: DeviceId,
    info: DeviceInfo,
    capabilities: Capabilities,
    properties: Vec<Property>,
    events: Vec<EventDescription>,
    actions: Vec<ActionDescription>,
    transport: Arc<T>,
    bus: EventBus,
    timing: Timing,
}

impl<T> Device<T> {
    /// Builds a device from its product class.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedDevice` when the class resolves to no
    /// capability.
    pub fn new(info: DeviceInfo, transport: Arc<T>, bus: EventBus, timing: Timing) -> Result<Self> {
        let capabilities = Capabilities::resolve(info.category, info.subcategory);
        if capabilities.is_empty() {
            return Err(Error::UnsupportedDevice {
                category: info.category,
                subcategory: info.subcategory,
            });
        }
        Ok(Self::with_capabilities(
            info,
            capabilities,
            transport,
            bus,
            timing,
        ))
    }

    /// Builds a device from an explicit capability set.
    #[must_use]
    pub fn with_capabilities(
        info: DeviceInfo,
        capabilities: Capabilities,
        transport: Arc<T>,
        bus: EventBus,
        timing: Timing,
    ) -> Self {
        let io_linc = capabilities::is_io_linc(info.category, info.subcategory);
        let assembly = assembly::assemble(&capabilities, io_linc);

        Self {
            id: DeviceId::from_address(info.address),
            info,
            capabilities,
            properties: assembly.properties,
            events: assembly.events,
            actions: assembly.actions,
            transport,
            bus,
            timing,
        }
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.info.address
    }

    /// Returns the device identity.
    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Returns the device title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.info.title
    }

    /// Returns the capability tags.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns `true` for battery-powered devices.
    #[must_use]
    pub fn is_battery_powered(&self) -> bool {
        self.capabilities.is_battery_powered()
    }

    /// Returns `true` for the I/O Linc relay/sensor module.
    #[must_use]
    pub fn is_io_linc(&self) -> bool {
        capabilities::is_io_linc(self.info.category, self.info.subcategory)
    }

    /// Returns the properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Returns a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Returns the cached value of a property.
    #[must_use]
    pub fn property_value(&self, name: &str) -> Option<PropertyValue> {
        self.property(name).map(Property::value)
    }

    /// Returns the declared events.
    #[must_use]
    pub fn events(&self) -> &[EventDescription] {
        &self.events
    }

    /// Returns the declared actions.
    #[must_use]
    pub fn actions(&self) -> &[ActionDescription] {
        &self.actions
    }

    /// Returns `true` if the device declares an event with this name.
    #[must_use]
    pub fn has_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name == name)
    }

    /// Returns `true` if the device declares an action with this name.
    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name == name)
    }

    /// Returns a snapshot for the host registry.
    #[must_use]
    pub fn description(&self) -> DeviceDescription {
        DeviceDescription {
            id: self.id,
            title: self.info.title.clone(),
            at_type: self.capabilities.iter().map(|t| t.as_str()).collect(),
            address: self.info.address,
            category: self.info.category,
            subcategory: self.info.subcategory,
            properties: self.properties.iter().map(Property::description).collect(),
            events: self.events.clone(),
            actions: self.actions.clone(),
        }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn timing(&self) -> Timing {
        self.timing
    }

    pub(crate) fn notify(&self, property: &str, value: PropertyValue) {
        self.bus.property_changed(self.id, property, value);
    }

    pub(crate) fn raise(&self, event: &str) {
        if self.has_event(event) {
            self.bus.raise(self.id, event);
        }
    }
}

impl<T: Transport> Device<T> {
    /// Feeds an unsolicited message to every property.
    ///
    /// Battery devices additionally report heartbeats on group 4 and low
    /// battery on group 3; those broadcasts raise events and do not touch
    /// property state.
    pub fn dispatch_message(self: &Arc<Self>, message: &Message) {
        if self.is_battery_powered() {
            match message.broadcast_group() {
                Some(HEARTBEAT_GROUP) => {
                    self.raise(events::HEARTBEAT);
                    return;
                }
                Some(LOW_BATTERY_GROUP) => {
                    self.raise(events::LOW_BATTERY);
                    return;
                }
                _ => {}
            }
        }

        for property in &self.properties {
            property.on_message(self, message);
        }
    }

    /// Polls every property.
    ///
    /// A failing property does not stop its siblings from being polled.
    ///
    /// # Errors
    ///
    /// Returns the first failure once all properties were polled.
    pub async fn poll(&self) -> Result<()> {
        let mut first_error = None;
        for property in &self.properties {
            if let Err(e) = property.poll(self).await {
                tracing::warn!(
                    device_id = %self.id,
                    property = property.name(),
                    error = %e,
                    "Failed to poll property"
                );
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Polls one property.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownProperty` for unknown names, or the poll failure.
    pub async fn poll_property(&self, name: &str) -> Result<()> {
        let property = self
            .property(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))?;
        property.poll(self).await
    }

    /// Writes a property, returning the accepted value.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown or read-only properties, values of the
    /// wrong kind, or when the command is not acknowledged.
    pub async fn set_property(
        self: &Arc<Self>,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertyValue> {
        let property = self
            .property(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))?;
        property.set_value(self, value).await
    }

    /// Performs a device action.
    ///
    /// Unknown actions are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidActionInput` for malformed `Fade` input, or the
    /// transport failure.
    pub async fn perform_action(self: &Arc<Self>, name: &str, input: &Value) -> Result<()> {
        match name {
            actions::FADE if self.has_action(actions::FADE) => {
                let (level, duration) = parse_fade_input(input)?;
                if level.is_off() {
                    self.transport
                        .turn_off(self.address(), Some(duration))
                        .await?;
                } else {
                    self.transport
                        .turn_on(
                            self.address(),
                            TurnOnOptions::level(level).with_duration(duration),
                        )
                        .await?;
                }
                self.schedule_poll(duration);
                Ok(())
            }
            actions::POLL => self.poll().await,
            _ => {
                tracing::warn!(device_id = %self.id, action = name, "Unknown action");
                Ok(())
            }
        }
    }

    /// Links the modem as responder of `group` on this device.
    ///
    /// Used to receive heartbeats (group 4) and low-battery warnings
    /// (group 3). Resolves to `None` when the device did not answer in time.
    ///
    /// # Errors
    ///
    /// Returns the transport failure.
    pub async fn link(&self, group: u8) -> Result<Option<LinkRecord>> {
        let request = LinkRequest::responder(self.address(), group, self.timing.link_timeout);
        match self.transport.request_link(request).await {
            Ok(record) => Ok(record),
            Err(TransportError::Timeout(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Polls one property after `delay` in a detached task.
    pub(crate) fn schedule_property_poll(self: &Arc<Self>, name: &'static str, delay: Duration) {
        let device = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = device.poll_property(name).await {
                tracing::warn!(
                    device_id = %device.id,
                    property = name,
                    error = %e,
                    "Delayed poll failed"
                );
            }
        });
    }

    /// Polls the whole device after `delay` in a detached task.
    pub(crate) fn schedule_poll(self: &Arc<Self>, delay: Duration) {
        let device = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = device.poll().await {
                tracing::warn!(device_id = %device.id, error = %e, "Delayed poll failed");
            }
        });
    }
}

fn parse_fade_input(input: &Value) -> Result<(Level, Duration)> {
    let level = input
        .get("level")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::InvalidActionInput("missing integer level".to_string()))?;
    let level = u8::try_from(level)
        .ok()
        .and_then(|l| Level::new(l).ok())
        .ok_or_else(|| Error::InvalidActionInput(format!("level {level} out of range")))?;

    let duration = input
        .get("duration")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::InvalidActionInput("missing integer duration".to_string()))?;

    Ok((level, Duration::from_secs(duration)))
}
