// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Link handshake and pairing mode.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::{Error, Result, TransportError};
use crate::event::{DeviceEvent, DeviceId};
use crate::protocol::{LinkRecord, LinkRequest, PRIMARY_GROUP, Transport};
use crate::store::LinkStore;
use crate::types::Address;

use super::{Adapter, Pairing};

const PRESS_SET_BUTTON: &str = "Press the 'set' button on the device you would like to link.";

/// Result of a link handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// No device answered before the timeout.
    NoResponse,
    /// The device that answered is already known.
    Existing(DeviceId),
    /// An unknown device linked as responder. Responder records carry no
    /// product class, so no device was created.
    ResponderOnly(Address),
    /// A new device was linked and added.
    Added(DeviceId),
}

impl<T: Transport, S: LinkStore> Adapter<T, S> {
    /// Runs the link handshake with whichever device's set button is pressed.
    ///
    /// A new controller is resolved, persisted and then registered, so a
    /// failure never leaves a half-built device behind. Non-battery devices
    /// additionally get a group 1 responder link so their state changes reach
    /// the modem; failing that is only logged.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedDevice` when the linked product class is
    /// unknown, or the transport or store failure.
    pub async fn link(&self, timeout: Duration) -> Result<LinkOutcome> {
        self.inner.event_bus.prompt(PRESS_SET_BUTTON);
        let received = self
            .inner
            .transport
            .request_link(LinkRequest::discover(timeout))
            .await;
        self.complete_link(received).await
    }

    /// Turns the modem's answer to a discover request into a device.
    async fn complete_link(
        &self,
        received: std::result::Result<Option<LinkRecord>, TransportError>,
    ) -> Result<LinkOutcome> {
        let record = match received {
            Ok(Some(record)) => record,
            Ok(None) | Err(TransportError::Timeout(_)) => {
                tracing::info!("No link information received");
                return Ok(LinkOutcome::NoResponse);
            }
            Err(e) => return Err(e.into()),
        };

        let device_id = DeviceId::from_address(record.address);
        tracing::info!(address = %record.address, role = ?record.role, "Link established");

        if self.inner.devices.read().await.contains(device_id) {
            return Ok(LinkOutcome::Existing(device_id));
        }
        if !record.is_controller() {
            return Ok(LinkOutcome::ResponderOnly(record.address));
        }

        let device = self.build_device(record.address, record.category, record.subcategory)?;
        self.inner.store.set(record.address, record).await?;
        if !self.register(Arc::clone(&device)).await {
            return Ok(LinkOutcome::Existing(device_id));
        }

        if !device.is_battery_powered() {
            match device.link(PRIMARY_GROUP).await {
                Ok(Some(_)) => tracing::debug!(%device_id, "Responder link established"),
                Ok(None) => tracing::warn!(%device_id, "No answer to responder link"),
                Err(e) => tracing::warn!(%device_id, error = %e, "Responder link failed"),
            }
        }

        Ok(LinkOutcome::Added(device_id))
    }

    /// Enters pairing mode for `timeout_secs` seconds.
    ///
    /// Returns immediately; the outcome arrives as
    /// [`DeviceEvent::DeviceAdded`] and [`DeviceEvent::PairingPrompt`].
    ///
    /// # Errors
    ///
    /// Returns `Error::PairingInProgress` if a pairing is still running.
    pub fn pair(&self, timeout_secs: u64) -> Result<()> {
        let mut tasks = self.inner.tasks.lock();
        if tasks.is_pairing() {
            return Err(Error::PairingInProgress);
        }

        let adapter = self.clone();
        let cancel = Arc::new(Notify::new());
        let cancelled = Arc::clone(&cancel);
        let handle = tokio::spawn(async move {
            adapter.inner.event_bus.prompt(PRESS_SET_BUTTON);
            let request = LinkRequest::discover(Duration::from_secs(timeout_secs));

            let received = tokio::select! {
                biased;
                () = cancelled.notified() => {
                    tracing::debug!("Link wait cancelled");
                    return;
                }
                received = adapter.inner.transport.request_link(request) => received,
            };

            let outcome = adapter.complete_link(received).await;
            adapter.report_pairing(outcome);
        });

        tasks.pairing = Some(Pairing { handle, cancel });
        tracing::info!(timeout_secs, "Pairing started");
        Ok(())
    }

    fn report_pairing(&self, outcome: Result<LinkOutcome>) {
        let prompt = match outcome {
            Ok(LinkOutcome::Added(device_id)) => {
                DeviceEvent::prompt("Linked new device", Some(device_id))
            }
            Ok(LinkOutcome::Existing(device_id)) => {
                DeviceEvent::prompt("Linked known device", Some(device_id))
            }
            Ok(LinkOutcome::ResponderOnly(address)) => DeviceEvent::prompt(
                format!("Linked {address} as responder; no device added"),
                None,
            ),
            Ok(LinkOutcome::NoResponse) => DeviceEvent::prompt("No device answered", None),
            Err(e) => {
                tracing::error!(error = %e, "Linking failed");
                DeviceEvent::prompt(format!("Linking failed: {e}"), None)
            }
        };
        self.inner.event_bus.publish(prompt);
    }

    /// Returns `true` while a pairing task is running.
    #[must_use]
    pub fn is_pairing(&self) -> bool {
        self.inner.tasks.lock().is_pairing()
    }

    /// Cancels a running pairing and leaves linking mode.
    ///
    /// Only the wait for a device is cancelled: a link record that already
    /// arrived is still persisted and registered, so no half-paired device
    /// is left behind. A new pairing may be started as soon as this returns.
    ///
    /// # Errors
    ///
    /// Returns the transport failure when the modem refuses to leave linking
    /// mode. The link wait is cancelled regardless.
    pub async fn cancel_pairing(&self) -> Result<()> {
        let pairing = self.inner.tasks.lock().pairing.take();
        if let Some(pairing) = pairing {
            pairing.cancel();
            tracing::info!("Pairing cancelled");
        }
        self.inner.transport.cancel_pending_link().await?;
        Ok(())
    }
}
