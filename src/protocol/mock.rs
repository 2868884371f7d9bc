// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::types::Address;

use super::{LinkRecord, LinkRequest, ProductIdentity, Transport, TurnOnOptions};

/// A request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    TurnOn(Address, TurnOnOptions),
    TurnOff(Address, Option<Duration>),
    Status(Address, u8),
    Link(LinkRequest),
    CancelLink,
}

#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<Call>>,
    statuses: Mutex<HashMap<(Address, u8), u8>>,
    links: Mutex<VecDeque<Result<Option<LinkRecord>, TransportError>>>,
    identities: Mutex<HashMap<Address, ProductIdentity>>,
    database: Mutex<Vec<LinkRecord>>,
    latency: Mutex<Duration>,
    failing: AtomicBool,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_status(&self, address: Address, subcommand: u8, raw: u8) {
        self.statuses.lock().insert((address, subcommand), raw);
    }

    pub(crate) fn push_link(&self, result: Result<Option<LinkRecord>, TransportError>) {
        self.links.lock().push_back(result);
    }

    pub(crate) fn set_identity(&self, address: Address, category: u8, subcategory: u8) {
        self.identities.lock().insert(
            address,
            ProductIdentity {
                category,
                subcategory,
            },
        );
    }

    pub(crate) fn set_database(&self, records: Vec<LinkRecord>) {
        *self.database.lock() = records;
    }

    /// Delays every command by `latency`.
    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Makes every command answer with a NAK.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    async fn respond(&self, address: Address) -> Result<(), TransportError> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Nak(address));
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    async fn turn_on(&self, address: Address, options: TurnOnOptions) -> Result<(), TransportError> {
        self.record(Call::TurnOn(address, options));
        self.respond(address).await
    }

    async fn turn_off(
        &self,
        address: Address,
        duration: Option<Duration>,
    ) -> Result<(), TransportError> {
        self.record(Call::TurnOff(address, duration));
        self.respond(address).await
    }

    async fn query_status(&self, address: Address, subcommand: u8) -> Result<u8, TransportError> {
        self.record(Call::Status(address, subcommand));
        self.respond(address).await?;
        let raw = self.statuses.lock().get(&(address, subcommand)).copied();
        Ok(raw.unwrap_or_default())
    }

    async fn request_link(
        &self,
        request: LinkRequest,
    ) -> Result<Option<LinkRecord>, TransportError> {
        self.record(Call::Link(request));
        let next = self.links.lock().pop_front();
        next.unwrap_or(Ok(None))
    }

    async fn link_database(&self) -> Result<Vec<LinkRecord>, TransportError> {
        Ok(self.database.lock().clone())
    }

    async fn product_identity(&self, address: Address) -> Result<ProductIdentity, TransportError> {
        let identity = self.identities.lock().get(&address).copied();
        identity.ok_or(TransportError::Timeout(0))
    }

    async fn cancel_pending_link(&self) -> Result<(), TransportError> {
        self.record(Call::CancelLink);
        Ok(())
    }
}
