// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! All-link records.

use serde::{Deserialize, Serialize};

use crate::types::Address;

/// Role of the remote device in a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
    /// The device sends commands to the modem.
    Controller,
    /// The device listens to commands from the modem.
    Responder,
}

/// A row of the modem's all-link database, or a freshly learned link.
///
/// Responder records do not carry a reliable category/subcategory; only
/// controller records may be used to decide what kind of device this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Remote device address.
    pub address: Address,
    /// Device category.
    pub category: u8,
    /// Device subcategory.
    pub subcategory: u8,
    /// Role of the remote device.
    pub role: LinkRole,
    /// All-link group number.
    pub group: u8,
}

impl LinkRecord {
    /// Creates a controller record.
    #[must_use]
    pub fn controller(address: Address, category: u8, subcategory: u8, group: u8) -> Self {
        Self {
            address,
            category,
            subcategory,
            role: LinkRole::Controller,
            group,
        }
    }

    /// Creates a responder record (category/subcategory unknown).
    #[must_use]
    pub fn responder(address: Address, group: u8) -> Self {
        Self {
            address,
            category: 0,
            subcategory: 0,
            role: LinkRole::Responder,
            group,
        }
    }

    /// Returns `true` when the remote device is the controller.
    #[must_use]
    pub fn is_controller(&self) -> bool {
        self.role == LinkRole::Controller
    }
}
