// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `INSTEON` Lib - A Rust library bridging INSTEON devices to smart-home
//! things.
//!
//! This library turns the devices behind an INSTEON modem into things with
//! typed properties, events and actions, and keeps their state current from
//! both unsolicited messages and status polls.
//!
//! # Supported Features
//!
//! - **Capability resolution**: product class (category, subcategory) to
//!   capability tags
//! - **Properties**: on/off, dimmer level, door/motion/generic sensors
//! - **Events and actions**: double taps, heartbeats, low battery, fades
//! - **Pairing**: cancellable link handshake with operator prompts
//! - **Reconciliation**: adopt every device of the modem's link database
//! - **Persistence**: link records in memory or in a JSON file
//!
//! # Supported Devices
//!
//! - Dimmers (category 0x01) and relay switches (category 0x02)
//! - I/O Linc relay/sensor module (0x07/0x00)
//! - Motion, door and hidden door sensors (category 0x10)
//! - Mini remotes (0x00/0x11)
//!
//! # Quick Start
//!
//! The serial protocol lives behind the [`Transport`] trait; any
//! implementation can drive an [`Adapter`]:
//!
//! ```no_run
//! use insteon_lib::event::DeviceEvent;
//! use insteon_lib::{Adapter, AdapterConfig, MemoryStore, Message, Transport};
//! use tokio::sync::mpsc;
//!
//! async fn run<T: Transport>(
//!     transport: T,
//!     inbound: mpsc::Receiver<Message>,
//! ) -> insteon_lib::Result<()> {
//!     let adapter = Adapter::new(transport, MemoryStore::new(), AdapterConfig::default());
//!     let mut events = adapter.subscribe();
//!     adapter.start(inbound);
//!
//!     // Adopt everything the modem already knows
//!     let added = adapter.scan().await?;
//!     println!("Added {} devices", added.len());
//!
//!     // Link one more device within 60 seconds
//!     adapter.pair(60)?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let DeviceEvent::PairingPrompt { message, .. } = event {
//!             println!("{message}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
mod capabilities;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod property;
pub mod protocol;
pub mod store;
pub mod types;

pub use adapter::{Adapter, LinkOutcome};
pub use capabilities::{Capabilities, CapabilityTag, is_io_linc, product_name};
pub use config::{AdapterConfig, Timing};
pub use device::{Device, DeviceDescription, DeviceInfo};
pub use error::{Error, Result, StoreError, TransportError, ValueError};
pub use event::{DeviceEvent, DeviceId, EventBus};
pub use property::{Property, PropertyValue};
pub use protocol::{Command, LinkRecord, LinkRole, Message, Transport};
pub use store::{JsonFileStore, LinkStore, MemoryStore};
pub use types::{Address, Level};
