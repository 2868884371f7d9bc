// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only binary sensor properties.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::Result;
use crate::protocol::{Command, Message, STATUS_SENSOR, Transport};

use super::{Cached, PropertyDescription, PropertyValue, ValueType, store};

/// What a binary sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    /// Door/window contact, `open`.
    Open,
    /// Motion detector, `motion`.
    Motion,
    /// Generic input, `active`.
    Active,
}

impl SensorKind {
    /// Returns the property name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Motion => "motion",
            Self::Active => "active",
        }
    }

    const fn at_type(self) -> &'static str {
        match self {
            Self::Open => "OpenProperty",
            Self::Motion => "MotionProperty",
            Self::Active => "BooleanProperty",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::Open => "Open/Closed",
            Self::Motion => "Motion",
            Self::Active => "Active",
        }
    }
}

/// A read-only boolean fed by ON/OFF reports.
///
/// Normally ON means true. With `inverted` polarity OFF means true: the I/O
/// Linc reports a closed sensor input as OFF.
#[derive(Debug)]
pub struct SensorProperty {
    kind: SensorKind,
    value: Cached<bool>,
    inverted: bool,
}

impl SensorProperty {
    /// Creates a sensor with normal polarity.
    #[must_use]
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            value: Cached::new(false),
            inverted: false,
        }
    }

    /// Creates a sensor that reads OFF as true.
    #[must_use]
    pub fn inverted(kind: SensorKind) -> Self {
        Self {
            inverted: true,
            ..Self::new(kind)
        }
    }

    /// Returns what the sensor reports.
    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Returns `true` for inverted polarity.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Returns the cached state.
    #[must_use]
    pub fn value(&self) -> bool {
        self.value.get()
    }

    pub(super) fn description(&self) -> PropertyDescription {
        PropertyDescription {
            name: self.kind.name(),
            at_type: self.kind.at_type(),
            title: self.kind.title(),
            value_type: ValueType::Boolean,
            minimum: None,
            maximum: None,
            unit: None,
            read_only: true,
            value: PropertyValue::Bool(self.value()),
        }
    }

    pub(super) fn on_message<T: Transport>(&self, device: &Arc<Device<T>>, message: &Message) {
        let state = match message.command {
            Command::On => !self.inverted,
            Command::Off => self.inverted,
            _ => return,
        };
        store(device, self.kind.name(), &self.value, state);
    }

    pub(super) async fn poll<T: Transport>(&self, device: &Device<T>) -> Result<()> {
        // Contacts and motion detectors are battery devices that sleep
        if self.kind != SensorKind::Active {
            return Ok(());
        }

        let raw = device
            .transport()
            .query_status(device.address(), STATUS_SENSOR)
            .await?;
        store(device, self.kind.name(), &self.value, (raw > 0) != self.inverted);
        Ok(())
    }
}
