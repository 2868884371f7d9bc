// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for INSTEON device control.
//!
//! - [`Address`] - 3-byte device address (`1A.2B.3C`)
//! - [`Level`] - Brightness level (0-100%)

mod address;
mod level;

pub use address::Address;
pub use level::Level;
