// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::DEFAULT_CHANNEL_CAPACITY;

/// Configuration for an [`Adapter`](crate::adapter::Adapter).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use insteon_lib::AdapterConfig;
///
/// let config = AdapterConfig::default()
///     .with_poll_interval(Duration::from_secs(30 * 60))
///     .with_link_timeout(Duration::from_secs(60));
///
/// assert_eq!(config.poll_interval, Duration::from_secs(1800));
/// assert_eq!(config.timing().dimmer_confirm_delay, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Interval of the full-registry poll sweep.
    pub poll_interval: Duration,
    /// How long link requests for group setup wait for the device.
    pub link_timeout: Duration,
    /// Delay before confirming a dimmer level after an ON report.
    pub dimmer_confirm_delay: Duration,
    /// Delay before checking whether a momentary relay reverted.
    pub momentary_revert_delay: Duration,
    /// Capacity of the event bus.
    pub event_capacity: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2 * 60 * 60),
            link_timeout: Duration::from_secs(30),
            dimmer_confirm_delay: Duration::from_millis(500),
            momentary_revert_delay: Duration::from_secs(3),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl AdapterConfig {
    /// Sets the poll sweep interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the link timeout used for group setup.
    #[must_use]
    pub fn with_link_timeout(mut self, timeout: Duration) -> Self {
        self.link_timeout = timeout;
        self
    }

    /// Sets the dimmer confirmation delay.
    #[must_use]
    pub fn with_dimmer_confirm_delay(mut self, delay: Duration) -> Self {
        self.dimmer_confirm_delay = delay;
        self
    }

    /// Sets the momentary relay revert check delay.
    #[must_use]
    pub fn with_momentary_revert_delay(mut self, delay: Duration) -> Self {
        self.momentary_revert_delay = delay;
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Returns the per-device timing derived from this configuration.
    #[must_use]
    pub fn timing(&self) -> Timing {
        Timing {
            link_timeout: self.link_timeout,
            dimmer_confirm_delay: self.dimmer_confirm_delay,
            momentary_revert_delay: self.momentary_revert_delay,
        }
    }
}

/// Delays a device uses for its own follow-up requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Link request timeout for group setup.
    pub link_timeout: Duration,
    /// Delay before confirming a dimmer level after an ON report.
    pub dimmer_confirm_delay: Duration,
    /// Delay before checking whether a momentary relay reverted.
    pub momentary_revert_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        AdapterConfig::default().timing()
    }
}
