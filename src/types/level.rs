// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Level type for dimmable loads.
//!
//! The host side works in percent (0-100) while INSTEON status replies
//! carry a raw on-level byte (0-255). This module converts between the two.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Brightness level as a percentage (0-100).
///
/// 0 is off and 100 is full brightness.
///
/// # Examples
///
/// ```
/// use insteon_lib::types::Level;
///
/// let level = Level::new(75).unwrap();
/// assert_eq!(level.value(), 75);
///
/// // Raw on-levels are scaled with rounding
/// assert_eq!(Level::from_raw(255), Level::MAX);
/// assert_eq!(Level::from_raw(128).value(), 50);
///
/// assert!(Level::new(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    /// Minimum level (off).
    pub const MIN: Self = Self(0);

    /// Maximum level (100%).
    pub const MAX: Self = Self(100);

    /// Creates a new level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a level, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Converts a raw 0-255 on-level reading into a percentage.
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        // Safe: raw <= 255 so the rounded result is within 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = (f32::from(raw) / 255.0 * 100.0).round() as u8;
        Self(percent)
    }

    /// Converts the percentage into a raw 0-255 on-level.
    #[must_use]
    pub fn to_raw(&self) -> u8 {
        // Safe: self.0 <= 100 so the rounded result is within 0..=255
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let raw = (f32::from(self.0) / 100.0 * 255.0).round() as u8;
        raw
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns `true` for level 0.
    #[must_use]
    pub const fn is_off(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Level {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}
