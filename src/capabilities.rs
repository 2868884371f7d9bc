// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device capabilities resolution.
//!
//! INSTEON devices identify themselves with a category and subcategory byte.
//! This module maps that pair to the set of [`CapabilityTag`]s the device
//! exposes. Resolution is a pure table lookup so that identities restored
//! from the store after a restart always rebuild the same device.
//!
//! # Lookup
//!
//! 1. Exact `(category, subcategory)` entry
//! 2. The category's default entry
//! 3. Nothing: the device is unsupported

use std::fmt;

use serde::{Deserialize, Serialize};

/// One behavioural facet of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapabilityTag {
    /// Load that can be switched on and off.
    OnOffSwitch,
    /// Load with a dimmable level.
    MultiLevelSwitch,
    /// Open/closed contact.
    DoorSensor,
    /// Motion detector.
    MotionSensor,
    /// Generic binary input.
    BinarySensor,
    /// Sleeps between transmissions; cannot be commanded or polled.
    BatteryPowered,
}

impl CapabilityTag {
    /// Returns the tag name used in thing descriptions.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnOffSwitch => "OnOffSwitch",
            Self::MultiLevelSwitch => "MultiLevelSwitch",
            Self::DoorSensor => "DoorSensor",
            Self::MotionSensor => "MotionSensor",
            Self::BinarySensor => "BinarySensor",
            Self::BatteryPowered => "BatteryPowered",
        }
    }
}

impl fmt::Display for CapabilityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free set of capability tags.
///
/// Iteration follows the order in which tags were declared.
///
/// # Examples
///
/// ```
/// use insteon_lib::{CapabilityTag, Capabilities};
///
/// let caps = Capabilities::resolve(0x01, 0x20);
/// assert!(caps.contains(CapabilityTag::MultiLevelSwitch));
/// assert!(caps.contains(CapabilityTag::OnOffSwitch));
///
/// // Unknown product classes resolve to nothing
/// assert!(Capabilities::resolve(0x05, 0x0b).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities(Vec<CapabilityTag>);

impl Capabilities {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from tags, keeping the first occurrence of each.
    #[must_use]
    pub fn from_tags(tags: impl IntoIterator<Item = CapabilityTag>) -> Self {
        let mut caps = Self::new();
        for tag in tags {
            caps.insert(tag);
        }
        caps
    }

    /// Resolves the capabilities of a product class.
    ///
    /// Returns an empty set for unsupported devices.
    #[must_use]
    pub fn resolve(category: u8, subcategory: u8) -> Self {
        Self::from_tags(lookup(category, subcategory).iter().copied())
    }

    /// Adds a tag at the end if not already present.
    pub fn insert(&mut self, tag: CapabilityTag) {
        if !self.0.contains(&tag) {
            self.0.push(tag);
        }
    }

    /// Returns `true` if the tag is present.
    #[must_use]
    pub fn contains(&self, tag: CapabilityTag) -> bool {
        self.0.contains(&tag)
    }

    /// Returns `true` if no tag is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the tags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = CapabilityTag> + '_ {
        self.0.iter().copied()
    }

    /// Returns `true` for battery-powered devices.
    #[must_use]
    pub fn is_battery_powered(&self) -> bool {
        self.contains(CapabilityTag::BatteryPowered)
    }
}

impl FromIterator<CapabilityTag> for Capabilities {
    fn from_iter<I: IntoIterator<Item = CapabilityTag>>(iter: I) -> Self {
        Self::from_tags(iter)
    }
}

/// Subcategory key of the capability table.
enum Sub {
    Exact(u8),
    Default,
}

use CapabilityTag::{
    BatteryPowered, BinarySensor, DoorSensor, MotionSensor, MultiLevelSwitch, OnOffSwitch,
};

const TABLE: &[(u8, Sub, &[CapabilityTag])] = &[
    // Mini remote, 1 scene
    (0x00, Sub::Exact(0x11), &[OnOffSwitch, BatteryPowered]),
    // Dimmable lighting
    (0x01, Sub::Default, &[MultiLevelSwitch, OnOffSwitch]),
    // Switched lighting
    (0x02, Sub::Default, &[OnOffSwitch]),
    // I/O Linc: relay plus sensor input
    (0x07, Sub::Exact(0x00), &[OnOffSwitch, BinarySensor]),
    (0x10, Sub::Exact(0x01), &[MotionSensor, BatteryPowered]),
    // TriggerLinc
    (0x10, Sub::Exact(0x02), &[DoorSensor, BatteryPowered]),
    // Hidden door sensor
    (0x10, Sub::Exact(0x11), &[DoorSensor, BatteryPowered]),
];

fn lookup(category: u8, subcategory: u8) -> &'static [CapabilityTag] {
    let mut fallback: &'static [CapabilityTag] = &[];
    for (cat, sub, tags) in TABLE {
        if *cat != category {
            continue;
        }
        match sub {
            Sub::Exact(s) if *s == subcategory => return tags,
            Sub::Exact(_) => {}
            Sub::Default => fallback = tags,
        }
    }
    fallback
}

/// Returns `true` for the I/O Linc relay/sensor module.
///
/// This device reports its relay and its sensor input with the same ON/OFF
/// codes; the sensor wins and its polarity is inverted.
#[must_use]
pub const fn is_io_linc(category: u8, subcategory: u8) -> bool {
    category == 0x07 && subcategory == 0x00
}

/// Returns a product name for known device classes.
#[must_use]
pub fn product_name(category: u8, subcategory: u8) -> Option<&'static str> {
    let name = match (category, subcategory) {
        (0x00, 0x11) => "Mini Remote - 1 Scene",
        (0x01, 0x20) => "SwitchLinc Dimmer",
        (0x01, 0x0e) => "LampLinc Dimmer",
        (0x01, _) => "Dimmer",
        (0x02, 0x2a) => "SwitchLinc Relay",
        (0x02, 0x09) => "ApplianceLinc",
        (0x02, _) => "Switch",
        (0x07, 0x00) => "I/O Linc",
        (0x10, 0x01) => "Motion Sensor",
        (0x10, 0x02) => "TriggerLinc",
        (0x10, 0x11) => "Hidden Door Sensor",
        _ => return None,
    };
    Some(name)
}
