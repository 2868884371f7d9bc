// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notifications for the host's thing registry.
//!
//! The adapter publishes device additions and removals, property value
//! changes, raised device events and operator prompts on an [`EventBus`].
//! The host subscribes once and mirrors them into its own registry.
//!
//! # Examples
//!
//! ```
//! use insteon_lib::event::{DeviceEvent, EventBus};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         match event {
//!             DeviceEvent::PropertyChanged { device_id, property, value } => {
//!                 println!("{device_id}.{property} = {value:?}");
//!             }
//!             DeviceEvent::PairingPrompt { message, .. } => println!("{message}"),
//!             _ => {}
//!         }
//!     }
//! });
//! # }
//! ```

mod device_event;
mod device_id;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_id::DeviceId;
pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
