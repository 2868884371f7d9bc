// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability-driven assembly of properties, events and actions.

use crate::capabilities::{Capabilities, CapabilityTag};
use crate::property::{LevelProperty, OnOffProperty, Property, SensorKind, SensorProperty};

use super::{ActionDescription, EventDescription};

/// Device-wide traits every facet may depend on.
#[derive(Debug, Clone, Copy)]
struct Traits {
    battery: bool,
    io_linc: bool,
}

/// What one capability tag contributes.
struct Facet {
    property: Option<Property>,
    events: &'static [EventDescription],
    actions: fn() -> Vec<ActionDescription>,
}

const LIGHT_EVENTS: &[EventDescription] = &[EventDescription::FAST_ON, EventDescription::FAST_OFF];
const BATTERY_EVENTS: &[EventDescription] =
    &[EventDescription::HEARTBEAT, EventDescription::LOW_BATTERY];

fn no_actions() -> Vec<ActionDescription> {
    Vec::new()
}

fn fade_action() -> Vec<ActionDescription> {
    vec![ActionDescription::fade()]
}

fn facet(tag: CapabilityTag, traits: Traits) -> Facet {
    match tag {
        CapabilityTag::OnOffSwitch => Facet {
            property: Some(Property::OnOff(OnOffProperty::new(
                traits.battery,
                traits.io_linc,
            ))),
            events: LIGHT_EVENTS,
            actions: no_actions,
        },
        CapabilityTag::MultiLevelSwitch => Facet {
            property: Some(Property::Level(LevelProperty::new(traits.battery))),
            events: LIGHT_EVENTS,
            actions: if traits.battery { no_actions } else { fade_action },
        },
        CapabilityTag::DoorSensor => Facet {
            property: Some(Property::Sensor(SensorProperty::new(SensorKind::Open))),
            events: &[],
            actions: no_actions,
        },
        CapabilityTag::MotionSensor => Facet {
            property: Some(Property::Sensor(SensorProperty::new(SensorKind::Motion))),
            events: &[],
            actions: no_actions,
        },
        CapabilityTag::BinarySensor => Facet {
            property: Some(Property::Sensor(if traits.io_linc {
                SensorProperty::inverted(SensorKind::Active)
            } else {
                SensorProperty::new(SensorKind::Active)
            })),
            events: &[],
            actions: no_actions,
        },
        CapabilityTag::BatteryPowered => Facet {
            property: None,
            events: BATTERY_EVENTS,
            actions: no_actions,
        },
    }
}

/// Everything a device exposes.
pub(super) struct Assembly {
    pub properties: Vec<Property>,
    pub events: Vec<EventDescription>,
    pub actions: Vec<ActionDescription>,
}

/// Folds the capability tags into properties, events and actions.
///
/// Each tag contributes independently; names are kept unique with the first
/// contribution winning.
pub(super) fn assemble(capabilities: &Capabilities, io_linc: bool) -> Assembly {
    let traits = Traits {
        battery: capabilities.is_battery_powered(),
        io_linc,
    };

    let mut assembly = Assembly {
        properties: Vec::new(),
        events: Vec::new(),
        actions: Vec::new(),
    };

    for tag in capabilities.iter() {
        let facet = facet(tag, traits);

        if let Some(property) = facet.property
            && !assembly.properties.iter().any(|p| p.name() == property.name())
        {
            assembly.properties.push(property);
        }
        for event in facet.events {
            if !assembly.events.iter().any(|e| e.name == event.name) {
                assembly.events.push(event.clone());
            }
        }
        for action in (facet.actions)() {
            if !assembly.actions.iter().any(|a| a.name == action.name) {
                assembly.actions.push(action);
            }
        }
    }

    assembly
}
