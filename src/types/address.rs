// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! INSTEON device address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// A 3-byte INSTEON device address.
///
/// Addresses are printed on every INSTEON device as three hex bytes, for
/// example `1A.2B.3C`. Parsing accepts dots, colons or no separator at all,
/// in either case.
///
/// # Examples
///
/// ```
/// use insteon_lib::types::Address;
///
/// let address: Address = "1a.2b.3c".parse().unwrap();
/// assert_eq!(address.to_string(), "1A.2B.3C");
/// assert_eq!(address, "1A2B3C".parse().unwrap());
///
/// assert!("1A.2B".parse::<Address>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 3]);

impl Address {
    /// Creates an address from its raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 3] {
        self.0
    }

    /// Returns the address as six lowercase hex digits without separators.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}.{:02X}.{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s
            .trim()
            .chars()
            .filter(|c| *c != '.' && *c != ':')
            .collect();

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValueError::InvalidAddress(s.to_string()));
        }

        let mut bytes = [0u8; 3];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| ValueError::InvalidAddress(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; 3]> for Address {
    fn from(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotted() {
        let address: Address = "1A.2B.3C".parse().unwrap();
        assert_eq!(address.bytes(), [0x1a, 0x2b, 0x3c]);
    }

    #[test]
    fn parse_plain_and_colon_forms() {
        let expected = Address::new([0xaa, 0xbb, 0x01]);
        assert_eq!("aabb01".parse::<Address>().unwrap(), expected);
        assert_eq!("AA:BB:01".parse::<Address>().unwrap(), expected);
        assert_eq!(" aa.bb.01 ".parse::<Address>().unwrap(), expected);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Address>().is_err());
        assert!("1A.2B".parse::<Address>().is_err());
        assert!("1A.2B.3C.4D".parse::<Address>().is_err());
        assert!("ZZ.2B.3C".parse::<Address>().is_err());
    }

    #[test]
    fn display_and_hex() {
        let address = Address::new([0x0a, 0xff, 0x00]);
        assert_eq!(address.to_string(), "0A.FF.00");
        assert_eq!(address.to_hex(), "0aff00");
    }

    #[test]
    fn serializes_as_string() {
        let address = Address::new([0x1a, 0x2b, 0x3c]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"1A.2B.3C\"");

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
