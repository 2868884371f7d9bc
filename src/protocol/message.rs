// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound INSTEON standard messages.
//!
//! The transport decodes modem frames into [`Message`] values. Only the
//! fields the device model reacts to are kept: source, destination, the
//! decoded `cmd1`, the raw `cmd2` and the acknowledgement/broadcast flags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Address;

/// Group used by battery devices to broadcast low-battery warnings.
pub const LOW_BATTERY_GROUP: u8 = 3;

/// Group used by battery devices to broadcast heartbeats.
pub const HEARTBEAT_GROUP: u8 = 4;

/// Primary group a device reports its own state on.
pub const PRIMARY_GROUP: u8 = 1;

/// Decoded `cmd1` of a standard message.
///
/// Codes the device model does not react to are preserved in
/// [`Command::Other`] and ignored downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Command {
    /// Turn on at the stored on-level (0x11).
    On,
    /// Turn on at full level, double tap (0x12).
    OnFast,
    /// Turn off (0x13).
    Off,
    /// Turn off immediately, double tap (0x14).
    OffFast,
    /// Start of a press-and-hold level change (0x17).
    StartManualChange,
    /// End of a press-and-hold level change (0x18).
    StopManualChange,
    /// Status request (0x19).
    StatusRequest,
    /// Any other command code.
    Other(u8),
}

impl Command {
    /// Decodes a raw `cmd1` byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x11 => Self::On,
            0x12 => Self::OnFast,
            0x13 => Self::Off,
            0x14 => Self::OffFast,
            0x17 => Self::StartManualChange,
            0x18 => Self::StopManualChange,
            0x19 => Self::StatusRequest,
            other => Self::Other(other),
        }
    }

    /// Returns the raw `cmd1` byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::On => 0x11,
            Self::OnFast => 0x12,
            Self::Off => 0x13,
            Self::OffFast => 0x14,
            Self::StartManualChange => 0x17,
            Self::StopManualChange => 0x18,
            Self::StatusRequest => 0x19,
            Self::Other(byte) => byte,
        }
    }

    /// Returns `true` for `On` and `OnFast`.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On | Self::OnFast)
    }

    /// Returns `true` for `Off` and `OffFast`.
    #[must_use]
    pub const fn is_off(self) -> bool {
        matches!(self, Self::Off | Self::OffFast)
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.to_byte()
    }
}

/// Where a message was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// Direct message to one device (usually the modem).
    Address(Address),
    /// Broadcast to every responder of a group.
    Group(u8),
}

impl Destination {
    /// Returns the group number for group broadcasts.
    #[must_use]
    pub const fn group(&self) -> Option<u8> {
        match self {
            Self::Group(group) => Some(*group),
            Self::Address(_) => None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::Group(group) => write!(f, "group {group}"),
        }
    }
}

/// Message type flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageFlags {
    /// The message acknowledges a command we sent.
    pub ack: bool,
    /// The message is a group broadcast.
    pub broadcast: bool,
}

/// An inbound standard message.
///
/// # Examples
///
/// ```
/// use insteon_lib::protocol::{Command, Message};
/// use insteon_lib::types::Address;
///
/// let from = Address::new([0x1a, 0x2b, 0x3c]);
/// let message = Message::broadcast(from, 1, Command::OnFast);
/// assert!(message.flags.broadcast);
/// assert_eq!(message.to.group(), Some(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sending device.
    pub from: Address,
    /// Destination address or group.
    pub to: Destination,
    /// Decoded `cmd1`.
    pub command: Command,
    /// Raw `cmd2`.
    pub cmd2: u8,
    /// Acknowledgement and broadcast flags.
    pub flags: MessageFlags,
}

impl Message {
    /// Creates a group broadcast message.
    #[must_use]
    pub fn broadcast(from: Address, group: u8, command: Command) -> Self {
        Self {
            from,
            to: Destination::Group(group),
            command,
            cmd2: 0,
            flags: MessageFlags {
                ack: false,
                broadcast: true,
            },
        }
    }

    /// Creates a direct message.
    #[must_use]
    pub fn direct(from: Address, to: Address, command: Command) -> Self {
        Self {
            from,
            to: Destination::Address(to),
            command,
            cmd2: 0,
            flags: MessageFlags::default(),
        }
    }

    /// Returns the same message with the acknowledgement flag set.
    #[must_use]
    pub fn acknowledged(mut self) -> Self {
        self.flags.ack = true;
        self
    }

    /// Returns the same message with a different `cmd2`.
    #[must_use]
    pub fn with_cmd2(mut self, cmd2: u8) -> Self {
        self.cmd2 = cmd2;
        self
    }

    /// Returns the group when this is a group broadcast.
    #[must_use]
    pub fn broadcast_group(&self) -> Option<u8> {
        if self.flags.broadcast {
            self.to.group()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_byte_mapping() {
        assert_eq!(Command::from_byte(0x11), Command::On);
        assert_eq!(Command::from_byte(0x12), Command::OnFast);
        assert_eq!(Command::from_byte(0x13), Command::Off);
        assert_eq!(Command::from_byte(0x14), Command::OffFast);
        assert_eq!(Command::from_byte(0x18), Command::StopManualChange);
        assert_eq!(Command::from_byte(0x2e), Command::Other(0x2e));
        assert_eq!(Command::StatusRequest.to_byte(), 0x19);
        assert_eq!(Command::Other(0x2e).to_byte(), 0x2e);
    }

    #[test]
    fn on_off_helpers() {
        assert!(Command::OnFast.is_on());
        assert!(Command::OffFast.is_off());
        assert!(!Command::StopManualChange.is_on());
        assert!(!Command::StopManualChange.is_off());
    }

    #[test]
    fn broadcast_group_requires_flag() {
        let from = Address::new([1, 2, 3]);
        let broadcast = Message::broadcast(from, HEARTBEAT_GROUP, Command::On);
        assert_eq!(broadcast.broadcast_group(), Some(HEARTBEAT_GROUP));

        let mut not_flagged = broadcast;
        not_flagged.flags.broadcast = false;
        assert_eq!(not_flagged.broadcast_group(), None);

        let direct = Message::direct(from, Address::new([4, 5, 6]), Command::On);
        assert_eq!(direct.broadcast_group(), None);
    }

    #[test]
    fn acknowledged_sets_flag() {
        let from = Address::new([1, 2, 3]);
        let message = Message::broadcast(from, 1, Command::On).acknowledged();
        assert!(message.flags.ack);
    }
}
