// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device properties.
//!
//! A property is one typed attribute of a device with a cached value. The
//! cache is written by two independent channels: unsolicited messages from
//! the device ([`Property::on_message`]) and explicit status polls
//! ([`Property::poll`]). Whichever update lands last wins; every write
//! replaces the whole value and only actual changes are published.
//!
//! # Variants
//!
//! | Variant | Name | Type | Writable |
//! |---------|------|------|----------|
//! | [`OnOffProperty`] | `on` | boolean | unless battery powered |
//! | [`LevelProperty`] | `level` | integer 0-100 | unless battery powered |
//! | [`SensorProperty`] | `open` / `motion` / `active` | boolean | never |

mod level;
mod on_off;
mod sensor;

pub use level::LevelProperty;
pub use on_off::OnOffProperty;
pub use sensor::{SensorKind, SensorProperty};

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::{Error, Result};
use crate::protocol::{Message, Transport};
use crate::types::Level;

/// Value held by a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean state (on, open, motion, active).
    Bool(bool),
    /// Dimmer level.
    Level(Level),
}

impl PropertyValue {
    /// Returns the boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Level(_) => None,
        }
    }

    /// Returns the level, if this is one.
    #[must_use]
    pub fn as_level(&self) -> Option<Level> {
        match self {
            Self::Level(level) => Some(*level),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Level(level) => write!(f, "{}", level.value()),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Level> for PropertyValue {
    fn from(level: Level) -> Self {
        Self::Level(level)
    }
}

/// JSON type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// `true` / `false`.
    Boolean,
    /// Whole number.
    Integer,
}

/// Thing description of a property, including its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDescription {
    /// Property name.
    pub name: &'static str,
    /// Semantic annotation.
    #[serde(rename = "@type")]
    pub at_type: &'static str,
    /// Human readable title.
    pub title: &'static str,
    /// JSON type.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Lower bound for integers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<u8>,
    /// Upper bound for integers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<u8>,
    /// Unit for integers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    /// The host may not write this property.
    #[serde(rename = "readOnly")]
    pub read_only: bool,
    /// Current cached value.
    pub value: PropertyValue,
}

/// One property of a device.
#[derive(Debug)]
pub enum Property {
    /// `on` switch state.
    OnOff(OnOffProperty),
    /// `level` dimmer state.
    Level(LevelProperty),
    /// Read-only binary input.
    Sensor(SensorProperty),
}

impl Property {
    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OnOff(_) => OnOffProperty::NAME,
            Self::Level(_) => LevelProperty::NAME,
            Self::Sensor(p) => p.kind().name(),
        }
    }

    /// Returns the current cached value.
    #[must_use]
    pub fn value(&self) -> PropertyValue {
        match self {
            Self::OnOff(p) => PropertyValue::Bool(p.value()),
            Self::Level(p) => PropertyValue::Level(p.value()),
            Self::Sensor(p) => PropertyValue::Bool(p.value()),
        }
    }

    /// Returns `true` if the host may not write this property.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        match self {
            Self::OnOff(p) => p.is_read_only(),
            Self::Level(p) => p.is_read_only(),
            Self::Sensor(_) => true,
        }
    }

    /// Returns the thing description of this property.
    #[must_use]
    pub fn description(&self) -> PropertyDescription {
        match self {
            Self::OnOff(p) => p.description(),
            Self::Level(p) => p.description(),
            Self::Sensor(p) => p.description(),
        }
    }

    /// Updates the cache from an unsolicited message.
    ///
    /// Acknowledgements and unknown commands are ignored.
    pub(crate) fn on_message<T: Transport>(&self, device: &Arc<Device<T>>, message: &Message) {
        if message.flags.ack {
            return;
        }
        match self {
            Self::OnOff(p) => p.on_message(device, message),
            Self::Level(p) => p.on_message(device, message),
            Self::Sensor(p) => p.on_message(device, message),
        }
    }

    /// Refreshes the cache from a status request.
    pub(crate) async fn poll<T: Transport>(&self, device: &Device<T>) -> Result<()> {
        match self {
            Self::OnOff(p) => p.poll(device).await,
            Self::Level(p) => p.poll(device).await,
            Self::Sensor(p) => p.poll(device).await,
        }
    }

    /// Commands the device and updates the cache optimistically.
    pub(crate) async fn set_value<T: Transport>(
        &self,
        device: &Arc<Device<T>>,
        value: PropertyValue,
    ) -> Result<PropertyValue> {
        match self {
            Self::OnOff(p) => p.set_value(device, value).await,
            Self::Level(p) => p.set_value(device, value).await,
            Self::Sensor(_) => Err(Error::ReadOnlyProperty(self.name().to_string())),
        }
    }
}

/// Cached property value.
///
/// The lock is only held for the duration of a read or a swap, never across
/// an `.await`.
#[derive(Debug)]
pub(crate) struct Cached<V> {
    value: RwLock<V>,
}

impl<V: Copy + PartialEq> Cached<V> {
    pub(crate) fn new(value: V) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    pub(crate) fn get(&self) -> V {
        *self.value.read()
    }

    /// Stores `value` and returns the previous one.
    pub(crate) fn replace(&self, value: V) -> V {
        std::mem::replace(&mut *self.value.write(), value)
    }

    /// Puts `previous` back unless another update already replaced `ours`.
    pub(crate) fn restore(&self, ours: V, previous: V) -> bool {
        let mut guard = self.value.write();
        if *guard == ours && ours != previous {
            *guard = previous;
            true
        } else {
            false
        }
    }
}

/// Stores a value and publishes it when it changed.
pub(crate) fn store<T, V>(device: &Device<T>, name: &str, cache: &Cached<V>, value: V)
where
    V: Copy + PartialEq + Into<PropertyValue>,
{
    if cache.replace(value) != value {
        device.notify(name, value.into());
    }
}

/// Optimistic write: caches `value`, runs `command`, and rolls the cache back
/// if the command fails and nothing newer arrived meanwhile.
pub(crate) async fn write_through<T, V, F>(
    device: &Device<T>,
    name: &str,
    cache: &Cached<V>,
    value: V,
    command: F,
) -> Result<()>
where
    V: Copy + PartialEq + Into<PropertyValue>,
    F: Future<Output = std::result::Result<(), crate::error::TransportError>>,
{
    let previous = cache.replace(value);
    if previous != value {
        device.notify(name, value.into());
    }

    if let Err(e) = command.await {
        if cache.restore(value, previous) {
            device.notify(name, previous.into());
        }
        return Err(e.into());
    }
    Ok(())
}
