// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapter coordinating all INSTEON devices behind one modem.
//!
//! # Overview
//!
//! The [`Adapter`] is the single entry point a host needs:
//!
//! - **Registry**: one [`Device`] per known address, add/remove serialized
//!   behind a `tokio::sync::RwLock`
//! - **Routing**: inbound messages are dispatched by source address, unknown
//!   senders are dropped
//! - **Polling**: a periodic sweep refreshes every device, isolating failures
//! - **Pairing**: the link handshake, cancellable at any time
//! - **Reconciliation**: [`Adapter::scan`] adopts every device found in the
//!   modem's link database
//!
//! Everything the host has to display arrives through
//! [`Adapter::subscribe`] as [`DeviceEvent`]s.
//!
//! # Tasks
//!
//! [`Adapter::start`] spawns the routing task and the poll sweep;
//! [`Adapter::pair`] spawns the pairing task. The adapter owns their handles
//! and [`Adapter::shutdown`] stops all of them. A pairing task is only ever
//! interrupted while it waits for the modem; once a link record has arrived
//! the device is persisted and registered to completion.

mod linking;
mod scan;

pub use linking::LinkOutcome;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{Notify, RwLock, broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::config::AdapterConfig;
use crate::device::{Device, DeviceInfo};
use crate::error::{Error, Result};
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::property::PropertyValue;
use crate::protocol::{HEARTBEAT_GROUP, LOW_BATTERY_GROUP, LinkRecord, Message, Transport};
use crate::store::LinkStore;
use crate::types::Address;

/// Lower bound of the poll sweep period.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Known devices in the order they were added.
#[derive(Debug)]
struct Registry<T> {
    devices: HashMap<DeviceId, Arc<Device<T>>>,
    order: Vec<DeviceId>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            devices: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    fn get(&self, device_id: DeviceId) -> Option<Arc<Device<T>>> {
        self.devices.get(&device_id).cloned()
    }

    fn contains(&self, device_id: DeviceId) -> bool {
        self.devices.contains_key(&device_id)
    }

    fn insert(&mut self, device: Arc<Device<T>>) {
        let device_id = device.id();
        if self.devices.insert(device_id, device).is_none() {
            self.order.push(device_id);
        }
    }

    fn remove(&mut self, device_id: DeviceId) -> Option<Arc<Device<T>>> {
        let device = self.devices.remove(&device_id)?;
        self.order.retain(|id| *id != device_id);
        Some(device)
    }

    fn snapshot(&self) -> Vec<Arc<Device<T>>> {
        self.order
            .iter()
            .filter_map(|id| self.devices.get(id).cloned())
            .collect()
    }
}

/// A running pairing task and the signal that ends its link wait.
#[derive(Debug)]
struct Pairing {
    handle: JoinHandle<()>,
    cancel: Arc<Notify>,
}

impl Pairing {
    /// Ends the link wait. A task already past it runs to completion.
    fn cancel(&self) {
        self.cancel.notify_one();
    }
}

/// Handles of the tasks the adapter owns.
#[derive(Debug, Default)]
struct Tasks {
    router: Option<JoinHandle<()>>,
    sweep: Option<JoinHandle<()>>,
    pairing: Option<Pairing>,
}

impl Tasks {
    fn is_pairing(&self) -> bool {
        self.pairing
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

#[derive(Debug)]
struct Inner<T, S> {
    transport: Arc<T>,
    store: S,
    devices: RwLock<Registry<T>>,
    event_bus: EventBus,
    config: AdapterConfig,
    tasks: Mutex<Tasks>,
}

/// Adapter for the devices behind one INSTEON modem.
///
/// Cloning is cheap and every clone drives the same registry.
#[derive(Debug)]
pub struct Adapter<T, S> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for Adapter<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport, S: LinkStore> Adapter<T, S> {
    /// Creates an adapter. No task runs until [`start`](Self::start).
    #[must_use]
    pub fn new(transport: T, store: S, config: AdapterConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport: Arc::new(transport),
                store,
                devices: RwLock::new(Registry::default()),
                event_bus: EventBus::with_capacity(config.event_capacity),
                config,
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Returns the link store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to device events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.inner.event_bus.subscribe()
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Returns all devices in the order they were added.
    pub async fn devices(&self) -> Vec<Arc<Device<T>>> {
        self.inner.devices.read().await.snapshot()
    }

    /// Returns all device IDs in the order they were added.
    pub async fn device_ids(&self) -> Vec<DeviceId> {
        self.inner.devices.read().await.order.clone()
    }

    /// Returns the number of known devices.
    pub async fn device_count(&self) -> usize {
        self.inner.devices.read().await.order.len()
    }

    /// Returns a device by ID.
    pub async fn device(&self, device_id: DeviceId) -> Option<Arc<Device<T>>> {
        self.inner.devices.read().await.get(device_id)
    }

    async fn require(&self, device_id: DeviceId) -> Result<Arc<Device<T>>> {
        self.device(device_id).await.ok_or(Error::DeviceNotFound)
    }

    /// Builds, registers and announces a device for a product class.
    ///
    /// Returns the existing ID without side effects when the address is
    /// already known. A new device gets an initial poll in the background.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedDevice` when the class resolves to no
    /// capability.
    pub async fn add_device(
        &self,
        address: Address,
        category: u8,
        subcategory: u8,
    ) -> Result<DeviceId> {
        let device_id = DeviceId::from_address(address);
        if self.inner.devices.read().await.contains(device_id) {
            return Ok(device_id);
        }

        let device = self.build_device(address, category, subcategory)?;
        self.register(device).await;
        Ok(device_id)
    }

    fn build_device(
        &self,
        address: Address,
        category: u8,
        subcategory: u8,
    ) -> Result<Arc<Device<T>>> {
        let device = Device::new(
            DeviceInfo::new(address, category, subcategory),
            Arc::clone(&self.inner.transport),
            self.inner.event_bus.clone(),
            self.inner.config.timing(),
        )?;
        Ok(Arc::new(device))
    }

    /// Inserts a built device, returning `false` if its address was taken
    /// meanwhile.
    async fn register(&self, device: Arc<Device<T>>) -> bool {
        let device_id = device.id();
        {
            let mut devices = self.inner.devices.write().await;
            if devices.contains(device_id) {
                return false;
            }
            devices.insert(Arc::clone(&device));
        }

        tracing::info!(
            %device_id,
            title = device.title(),
            capabilities = ?device.capabilities(),
            "Device added"
        );
        self.inner
            .event_bus
            .publish(DeviceEvent::device_added(device_id));

        tokio::spawn(async move {
            if let Err(e) = device.poll().await {
                tracing::warn!(%device_id, error = %e, "Initial poll failed");
            }
        });
        true
    }

    /// Removes a device and deletes its persisted link record.
    ///
    /// Returns `false` if the device was not known.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` if the record cannot be deleted. The device is
    /// unregistered regardless.
    pub async fn remove_device(&self, device_id: DeviceId) -> Result<bool> {
        let removed = self.inner.devices.write().await.remove(device_id);
        let Some(device) = removed else {
            return Ok(false);
        };

        tracing::info!(%device_id, "Device removed");
        self.inner
            .event_bus
            .publish(DeviceEvent::device_removed(device_id));

        self.inner.store.delete(device.address()).await?;
        Ok(true)
    }

    /// Rebuilds a device the host remembers from its persisted link record.
    ///
    /// Returns `None` when no record is stored for the device's address.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the stored product
    /// class is unsupported.
    pub async fn restore_device(&self, device_id: DeviceId) -> Result<Option<DeviceId>> {
        let Some(record) = self.inner.store.get(device_id.address()).await? else {
            tracing::debug!(%device_id, "No link record to restore from");
            return Ok(None);
        };

        self.add_device(record.address, record.category, record.subcategory)
            .await
            .map(Some)
    }

    // =========================================================================
    // Message Routing
    // =========================================================================

    /// Dispatches an inbound message to the device that sent it.
    ///
    /// Messages from unknown addresses are dropped.
    pub async fn handle_message(&self, message: &Message) {
        let device_id = DeviceId::from_address(message.from);
        let device = self.inner.devices.read().await.get(device_id);

        match device {
            Some(device) => {
                tracing::debug!(%device_id, command = ?message.command, "Routing message");
                device.dispatch_message(message);
            }
            None => {
                tracing::debug!(address = %message.from, "Dropping message from unknown device");
            }
        }
    }

    /// Starts routing `messages` and the periodic poll sweep.
    ///
    /// Calling this again replaces the previous tasks.
    pub fn start(&self, mut messages: mpsc::Receiver<Message>) {
        let router = {
            let adapter = self.clone();
            tokio::spawn(async move {
                tracing::debug!("Starting message router");
                while let Some(message) = messages.recv().await {
                    adapter.handle_message(&message).await;
                }
                tracing::debug!("Message router stopped");
            })
        };

        let sweep = {
            let adapter = self.clone();
            let period = self.inner.config.poll_interval.max(MIN_POLL_INTERVAL);
            tokio::spawn(async move {
                let start = tokio::time::Instant::now() + period;
                let mut interval = tokio::time::interval_at(start, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    adapter.poll_all().await;
                }
            })
        };

        let mut tasks = self.inner.tasks.lock();
        for handle in [tasks.router.replace(router), tasks.sweep.replace(sweep)]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Polls every device concurrently.
    ///
    /// Returns the IDs of the devices whose poll failed; a failing device
    /// never stops the others from being polled.
    pub async fn poll_all(&self) -> Vec<DeviceId> {
        let devices = self.devices().await;
        tracing::debug!(count = devices.len(), "Polling all devices");

        let mut polls = JoinSet::new();
        for device in devices {
            polls.spawn(async move { (device.id(), device.poll().await) });
        }

        let mut failed = Vec::new();
        while let Some(joined) = polls.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((device_id, Err(e))) => {
                    tracing::warn!(%device_id, error = %e, "Poll failed");
                    failed.push(device_id);
                }
                Err(e) => tracing::error!(error = %e, "Poll task panicked"),
            }
        }
        failed
    }

    // =========================================================================
    // Device Control
    // =========================================================================

    /// Writes a device property.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for unknown devices, or the property
    /// write failure.
    pub async fn set_property(
        &self,
        device_id: DeviceId,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertyValue> {
        self.require(device_id)
            .await?
            .set_property(name, value)
            .await
    }

    /// Performs a device action.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for unknown devices, or the action
    /// failure.
    pub async fn perform_action(&self, device_id: DeviceId, name: &str, input: &Value) -> Result<()> {
        self.require(device_id)
            .await?
            .perform_action(name, input)
            .await
    }

    /// Links the modem as responder of the device's heartbeat group (4).
    ///
    /// Resolves to `None` when the device did not answer in time.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for unknown devices, or the transport
    /// failure.
    pub async fn setup_heartbeat(&self, device_id: DeviceId) -> Result<Option<LinkRecord>> {
        self.require(device_id).await?.link(HEARTBEAT_GROUP).await
    }

    /// Links the modem as responder of the device's low-battery group (3).
    ///
    /// Resolves to `None` when the device did not answer in time.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` for unknown devices, or the transport
    /// failure.
    pub async fn setup_low_battery(&self, device_id: DeviceId) -> Result<Option<LinkRecord>> {
        self.require(device_id).await?.link(LOW_BATTERY_GROUP).await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Stops every task the adapter owns and leaves linking mode.
    ///
    /// A pairing that already received its link record still finishes
    /// adding the device.
    pub async fn shutdown(&self) {
        let (handles, pairing, was_pairing) = {
            let mut tasks = self.inner.tasks.lock();
            let was_pairing = tasks.is_pairing();
            let handles = [tasks.router.take(), tasks.sweep.take()];
            (handles, tasks.pairing.take(), was_pairing)
        };

        for handle in handles.into_iter().flatten() {
            handle.abort();
        }
        if let Some(pairing) = pairing {
            pairing.cancel();
        }
        if was_pairing && let Err(e) = self.inner.transport.cancel_pending_link().await {
            tracing::warn!(error = %e, "Failed to leave linking mode");
        }
        tracing::info!("Adapter shut down");
    }
}
