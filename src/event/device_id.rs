// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;
use crate::types::Address;

const ID_PREFIX: &str = "insteon-";

/// Stable identifier of a device, derived from its INSTEON address.
///
/// The same address always yields the same identifier, so things the host
/// saved before a restart map back onto the same physical device.
///
/// # Examples
///
/// ```
/// use insteon_lib::event::DeviceId;
/// use insteon_lib::types::Address;
///
/// let address = Address::new([0x1a, 0x2b, 0x3c]);
/// let id = DeviceId::from_address(address);
/// assert_eq!(id.to_string(), "insteon-1a2b3c");
/// assert_eq!(id.address(), address);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(Address);

impl DeviceId {
    /// Creates the identifier of the device at `address`.
    #[must_use]
    pub const fn from_address(address: Address) -> Self {
        Self(address)
    }

    /// Returns the address the identifier was derived from.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for DeviceId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({self})")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{}", self.0.to_hex())
    }
}

impl FromStr for DeviceId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix(ID_PREFIX)
            .ok_or_else(|| ValueError::InvalidDeviceId(s.to_string()))?;
        let address = hex
            .parse()
            .map_err(|_| ValueError::InvalidDeviceId(s.to_string()))?;
        Ok(Self(address))
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_address_same_id() {
        let address = Address::new([0xaa, 0xbb, 0xcc]);
        assert_eq!(DeviceId::from_address(address), DeviceId::from(address));
    }

    #[test]
    fn different_addresses_different_ids() {
        let a = DeviceId::from_address(Address::new([1, 2, 3]));
        let b = DeviceId::from_address(Address::new([1, 2, 4]));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_round_trip() {
        let id: DeviceId = "insteon-0a0b0c".parse().unwrap();
        assert_eq!(id.address(), Address::new([0x0a, 0x0b, 0x0c]));
        assert_eq!(id.to_string(), "insteon-0a0b0c");
    }

    #[test]
    fn parse_rejects_foreign_ids() {
        assert!("zwave-0a0b0c".parse::<DeviceId>().is_err());
        assert!("insteon-".parse::<DeviceId>().is_err());
        assert!("insteon-xyz".parse::<DeviceId>().is_err());
    }

    #[test]
    fn debug_format() {
        let id = DeviceId::from_address(Address::new([1, 2, 3]));
        assert_eq!(format!("{id:?}"), "DeviceId(insteon-010203)");
    }
}
