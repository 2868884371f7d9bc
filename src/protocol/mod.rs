// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol surface consumed from the INSTEON modem.
//!
//! Framing bytes on the serial line is the job of a [`Transport`]
//! implementation living outside this crate. The device model only needs the
//! primitives below plus a stream of decoded inbound [`Message`]s, which the
//! transport delivers through a `tokio::sync::mpsc` channel passed to
//! [`Adapter::start`](crate::adapter::Adapter::start).

mod link;
mod message;
#[cfg(test)]
pub(crate) mod mock;

pub use link::{LinkRecord, LinkRole};
pub use message::{
    Command, Destination, HEARTBEAT_GROUP, LOW_BATTERY_GROUP, Message, MessageFlags,
    PRIMARY_GROUP,
};

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::types::{Address, Level};

/// Status request subcommand for the load or relay.
pub const STATUS_LOAD: u8 = 0x00;

/// Status request subcommand for the sensor input of an I/O Linc.
pub const STATUS_SENSOR: u8 = 0x01;

/// Options for [`Transport::turn_on`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnOnOptions {
    /// Target level, or the device's stored on-level when `None`.
    pub level: Option<Level>,
    /// Ramp duration, or the device default when `None`.
    pub duration: Option<Duration>,
}

impl TurnOnOptions {
    /// Turns on to a specific level.
    #[must_use]
    pub fn level(level: Level) -> Self {
        Self {
            level: Some(level),
            duration: None,
        }
    }

    /// Sets the ramp duration.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Parameters of a link request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRequest {
    /// Device to link, or `None` to accept whichever device's set button is
    /// pressed.
    pub address: Option<Address>,
    /// `true` to link the modem as controller, `false` as responder.
    pub controller: bool,
    /// All-link group, or the modem default when `None`.
    pub group: Option<u8>,
    /// How long to wait for a device to answer.
    pub timeout: Duration,
}

impl LinkRequest {
    /// Discovery request: link whichever device answers, modem as controller.
    #[must_use]
    pub fn discover(timeout: Duration) -> Self {
        Self {
            address: None,
            controller: true,
            group: None,
            timeout,
        }
    }

    /// Responder link for a known device on an explicit group.
    #[must_use]
    pub fn responder(address: Address, group: u8, timeout: Duration) -> Self {
        Self {
            address: Some(address),
            controller: false,
            group: Some(group),
            timeout,
        }
    }
}

/// Product identity returned by an ID request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductIdentity {
    /// Device category.
    pub category: u8,
    /// Device subcategory.
    pub subcategory: u8,
}

/// Send/receive primitives of an INSTEON modem.
///
/// Implementations must be cheap to share: the adapter keeps one instance in
/// an `Arc` and calls it concurrently from message handling, polling and
/// pairing tasks.
pub trait Transport: Send + Sync + 'static {
    /// Sends an ON (or ramp-on when a duration is given) command.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the command is not acknowledged.
    fn turn_on(
        &self,
        address: Address,
        options: TurnOnOptions,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends an OFF (or ramp-off when a duration is given) command.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the command is not acknowledged.
    fn turn_off(
        &self,
        address: Address,
        duration: Option<Duration>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a status request and returns the raw reading (0-255).
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the device does not answer.
    fn query_status(
        &self,
        address: Address,
        subcommand: u8,
    ) -> impl Future<Output = Result<u8, TransportError>> + Send;

    /// Enters linking mode and waits for a device to answer.
    ///
    /// Resolves to `Ok(None)` when the timeout elapses with no device.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on modem failure or cancellation.
    fn request_link(
        &self,
        request: LinkRequest,
    ) -> impl Future<Output = Result<Option<LinkRecord>, TransportError>> + Send;

    /// Reads the modem's all-link database.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the database cannot be read.
    fn link_database(&self)
    -> impl Future<Output = Result<Vec<LinkRecord>, TransportError>> + Send;

    /// Asks a device for its category and subcategory.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the device does not answer.
    fn product_identity(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<ProductIdentity, TransportError>> + Send;

    /// Leaves linking mode, releasing any pending [`request_link`](Self::request_link).
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the modem refuses the cancel.
    fn cancel_pending_link(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
