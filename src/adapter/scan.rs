// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of the registry with the modem's link database.

use crate::error::Result;
use crate::event::DeviceId;
use crate::protocol::{LinkRecord, LinkRole, Transport};
use crate::store::LinkStore;
use crate::types::Address;

use super::Adapter;

impl<T: Transport, S: LinkStore> Adapter<T, S> {
    /// Adds every device of the modem's link database that is not known yet.
    ///
    /// Each new address is asked for its product class, resolved, persisted
    /// and added. Addresses that fail (no answer, unsupported class) are
    /// logged and skipped. Running it again with an unchanged database adds
    /// nothing.
    ///
    /// Returns the IDs of the added devices.
    ///
    /// # Errors
    ///
    /// Returns the transport failure if the link database cannot be read.
    pub async fn scan(&self) -> Result<Vec<DeviceId>> {
        tracing::info!("Adding devices from the modem link database");

        let addresses = unique_addresses(&self.inner.transport.link_database().await?);
        self.inner.event_bus.prompt(format!(
            "Found {} devices. Adding things. This may take a while...",
            addresses.len()
        ));

        let mut added = Vec::new();
        for address in addresses {
            let device_id = DeviceId::from_address(address);
            if self.inner.devices.read().await.contains(device_id) {
                continue;
            }

            match self.adopt(address).await {
                Ok(true) => added.push(device_id),
                Ok(false) => {}
                Err(e) => tracing::error!(%address, error = %e, "Failed to add device"),
            }
        }

        tracing::info!(count = added.len(), "Scan complete");
        self.inner
            .event_bus
            .prompt(format!("Scan complete. Added {} devices.", added.len()));
        Ok(added)
    }

    /// Adds one database address; `false` if it got registered meanwhile.
    async fn adopt(&self, address: Address) -> Result<bool> {
        let identity = self.inner.transport.product_identity(address).await?;
        let device = self.build_device(address, identity.category, identity.subcategory)?;

        // Only the product class is read back on restore. Role and group are
        // placeholders, not the entry found in the modem's database.
        let record = LinkRecord {
            address,
            category: identity.category,
            subcategory: identity.subcategory,
            role: LinkRole::Controller,
            group: 0,
        };
        self.inner.store.set(address, record).await?;

        Ok(self.register(device).await)
    }
}

/// Addresses of `records`, first occurrence first.
fn unique_addresses(records: &[LinkRecord]) -> Vec<Address> {
    let mut addresses: Vec<Address> = Vec::with_capacity(records.len());
    for record in records {
        if !addresses.contains(&record.address) {
            addresses.push(record.address);
        }
    }
    addresses
}
