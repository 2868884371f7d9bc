// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On/off switch property.

use std::sync::Arc;

use crate::device::{Device, events};
use crate::error::{Error, Result};
use crate::protocol::{Command, Message, STATUS_LOAD, Transport, TurnOnOptions};

use super::{Cached, PropertyDescription, PropertyValue, ValueType, store, write_through};

/// The `on` property of switches, dimmers and remotes.
///
/// Double taps (`OnFast`/`OffFast`) also raise the `FastOn`/`FastOff`
/// events. On an I/O Linc the relay's ON/OFF reports are indistinguishable
/// from sensor reports, so they are left to the sensor property and the
/// relay state is only learned from polls; switching that relay on schedules
/// a re-poll in case it is in momentary mode and reverts silently.
#[derive(Debug)]
pub struct OnOffProperty {
    value: Cached<bool>,
    read_only: bool,
    io_linc: bool,
}

impl OnOffProperty {
    /// Property name.
    pub const NAME: &'static str = "on";

    /// Creates the property.
    #[must_use]
    pub fn new(read_only: bool, io_linc: bool) -> Self {
        Self {
            value: Cached::new(false),
            read_only,
            io_linc,
        }
    }

    /// Returns the cached state.
    #[must_use]
    pub fn value(&self) -> bool {
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
            at_type: "OnOffProperty",
            title: "On/Off",
            value_type: ValueType::Boolean,
            minimum: None,
            maximum: None,
            unit: None,
            read_only: self.read_only,
            value: PropertyValue::Bool(self.value()),
        }
    }

    pub(super) fn on_message<T: Transport>(&self, device: &Arc<Device<T>>, message: &Message) {
        if self.io_linc {
            return;
        }

        match message.command {
            Command::On => store(device, Self::NAME, &self.value, true),
            Command::OnFast => {
                store(device, Self::NAME, &self.value, true);
                device.raise(events::FAST_ON);
            }
            Command::Off => store(device, Self::NAME, &self.value, false),
            Command::OffFast => {
                store(device, Self::NAME, &self.value, false);
                device.raise(events::FAST_OFF);
            }
            _ => {}
        }
    }

    pub(super) async fn poll<T: Transport>(&self, device: &Device<T>) -> Result<()> {
        // Sleeping battery devices never answer status requests
        if self.read_only {
            return Ok(());
        }

        let raw = device
            .transport()
            .query_status(device.address(), STATUS_LOAD)
            .await?;
        store(device, Self::NAME, &self.value, raw > 0);
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
        let on = value.as_bool().ok_or_else(|| Error::InvalidPropertyValue {
            property: Self::NAME.to_string(),
            value: value.to_string(),
        })?;

        let address = device.address();
        let transport = device.transport();
        if on {
            write_through(
                device,
                Self::NAME,
                &self.value,
                true,
                transport.turn_on(address, TurnOnOptions::default()),
            )
            .await?;

            if self.io_linc {
                device.schedule_property_poll(Self::NAME, device.timing().momentary_revert_delay);
            }
        } else {
            write_through(
                device,
                Self::NAME,
                &self.value,
                false,
                transport.turn_off(address, None),
            )
            .await?;
        }

        Ok(PropertyValue::Bool(on))
    }
}
