// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dimmer level property.

use std::sync::Arc;
use std::time::Duration;

use crate::device::Device;
use crate::error::{Error, Result};
use crate::protocol::{Command, Message, STATUS_LOAD, Transport, TurnOnOptions};
use crate::types::Level;

use super::{Cached, PropertyDescription, PropertyValue, ValueType, store, write_through};

/// The `level` property of dimmers, 0-100 with 0 meaning off.
///
/// ON notifications carry no level (the device ramps to its stored
/// on-level), so the level is confirmed with a status poll shortly after.
/// The end of a press-and-hold adjustment is polled right away. OFF sets the
/// level to 0 without a round trip.
#[derive(Debug)]
pub struct LevelProperty {
    value: Cached<Level>,
    read_only: bool,
}

impl LevelProperty {
    /// Property name.
    pub const NAME: &'static str = "level";

    /// Creates the property.
    #[must_use]
    pub fn new(read_only: bool) -> Self {
        Self {
            value: Cached::new(Level::MIN),
            read_only,
        }
    }

    /// Returns the cached level.
    #[must_use]
    pub fn value(&self) -> Level {
        self.value.get()
    }

    /// Returns `true` for battery-powered devices.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(super) fn description(&self) -> PropertyDescription {
        PropertyDescription {
            name: Self::NAME,
            at_type: "LevelProperty",
            title: "Level",
            value_type: ValueType::Integer,
            minimum: Some(Level::MIN.value()),
            maximum: Some(Level::MAX.value()),
            unit: Some("percent"),
            read_only: self.read_only,
            value: PropertyValue::Level(self.value()),
        }
    }

    pub(super) fn on_message<T: Transport>(&self, device: &Arc<Device<T>>, message: &Message) {
        match message.command {
            Command::On | Command::OnFast if !self.read_only => {
                device.schedule_property_poll(Self::NAME, device.timing().dimmer_confirm_delay);
            }
            Command::Off | Command::OffFast => {
                store(device, Self::NAME, &self.value, Level::MIN);
            }
            Command::StopManualChange if !self.read_only => {
                device.schedule_property_poll(Self::NAME, Duration::ZERO);
            }
            _ => {}
        }
    }

    pub(super) async fn poll<T: Transport>(&self, device: &Device<T>) -> Result<()> {
        if self.read_only {
            return Ok(());
        }

        let raw = device
            .transport()
            .query_status(device.address(), STATUS_LOAD)
            .await?;
        store(device, Self::NAME, &self.value, Level::from_raw(raw));
        Ok(())
    }

    pub(super) async fn set_value<T: Transport>(
        &self,
        device: &Arc<Device<T>>,
        value: PropertyValue,
    ) -> Result<PropertyValue> {
        if self.read_only {
            return Err(Error::ReadOnlyProperty(Self::NAME.to_string()));
        }
        let level = value.as_level().ok_or_else(|| Error::InvalidPropertyValue {
            property: Self::NAME.to_string(),
            value: value.to_string(),
        })?;

        let address = device.address();
        let transport = device.transport();
        if level.is_off() {
            write_through(
                device,
                Self::NAME,
                &self.value,
                level,
                transport.turn_off(address, None),
            )
            .await?;
        } else {
            write_through(
                device,
                Self::NAME,
                &self.value,
                level,
                transport.turn_on(address, TurnOnOptions::level(level)),
            )
            .await?;
        }

        Ok(PropertyValue::Level(level))
    }
}
