// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thing descriptions of devices, events and actions.

use serde::Serialize;
use serde_json::{Value, json};

use crate::event::DeviceId;
use crate::property::PropertyDescription;
use crate::types::Address;

use super::{actions, events};

/// A declared device event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDescription {
    /// Event name.
    pub name: &'static str,
    /// Semantic annotation.
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub at_type: Option<&'static str>,
    /// Human readable description.
    pub description: &'static str,
}

impl EventDescription {
    pub(crate) const FAST_ON: Self = Self {
        name: events::FAST_ON,
        at_type: Some("DoublePressedEvent"),
        description: "Double tap on",
    };

    pub(crate) const FAST_OFF: Self = Self {
        name: events::FAST_OFF,
        at_type: Some("DoublePressedEvent"),
        description: "Double tap off",
    };

    pub(crate) const HEARTBEAT: Self = Self {
        name: events::HEARTBEAT,
        at_type: None,
        description: "Periodic sign of life from a battery device",
    };

    pub(crate) const LOW_BATTERY: Self = Self {
        name: events::LOW_BATTERY,
        at_type: Some("AlarmEvent"),
        description: "Battery needs replacing",
    };
}

/// A declared device action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDescription {
    /// Action name.
    pub name: &'static str,
    /// Semantic annotation.
    #[serde(rename = "@type")]
    pub at_type: &'static str,
    /// JSON schema of the action input.
    pub input: Value,
}

impl ActionDescription {
    pub(crate) fn fade() -> Self {
        Self {
            name: actions::FADE,
            at_type: "FadeAction",
            input: json!({
                "type": "object",
                "required": ["level", "duration"],
                "properties": {
                    "level": {
                        "type": "integer",
                        "unit": "percent",
                        "minimum": 0,
                        "maximum": 100,
                    },
                    "duration": {
                        "type": "integer",
                        "unit": "second",
                        "minimum": 0,
                    },
                },
            }),
        }
    }
}

/// Serializable snapshot of a device for the host registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceDescription {
    /// Device identifier.
    pub id: DeviceId,
    /// Human readable title.
    pub title: String,
    /// Capability tags.
    #[serde(rename = "@type")]
    pub at_type: Vec<&'static str>,
    /// INSTEON address.
    pub address: Address,
    /// Device category.
    pub category: u8,
    /// Device subcategory.
    pub subcategory: u8,
    /// Properties with their current values, in declaration order.
    pub properties: Vec<PropertyDescription>,
    /// Declared events.
    pub events: Vec<EventDescription>,
    /// Declared actions.
    pub actions: Vec<ActionDescription>,
}
