// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the adapter against a scripted modem.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use insteon_lib::error::TransportError;
use insteon_lib::event::DeviceEvent;
use insteon_lib::protocol::{LinkRequest, ProductIdentity, TurnOnOptions};
use insteon_lib::{
    Adapter, AdapterConfig, Address, Command, DeviceId, Error, JsonFileStore, LinkOutcome,
    LinkRecord, LinkStore, MemoryStore, Message, PropertyValue, StoreError, Transport,
};
use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast, mpsc};

// ============================================================================
// Scripted modem
// ============================================================================

/// Modem double. Link requests answer with the next scripted record, or wait
/// for their timeout or a cancel.
#[derive(Debug, Default)]
struct ScriptedModem {
    links: Mutex<VecDeque<LinkRecord>>,
    link_requests: Mutex<Vec<LinkRequest>>,
    database: Mutex<Vec<LinkRecord>>,
    identities: Mutex<HashMap<Address, ProductIdentity>>,
    statuses: Mutex<HashMap<Address, u8>>,
    cancel: Notify,
    waiting: AtomicUsize,
    cancels: AtomicUsize,
}

/// Decrements the waiting count when a link wait ends or is dropped.
struct Waiting<'a>(&'a AtomicUsize);

impl<'a> Waiting<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count)
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedModem {
    fn script_link(&self, record: LinkRecord) {
        self.links.lock().push_back(record);
    }

    fn set_database(&self, records: Vec<LinkRecord>) {
        *self.database.lock() = records;
    }

    fn set_identity(&self, address: Address, category: u8, subcategory: u8) {
        self.identities.lock().insert(
            address,
            ProductIdentity {
                category,
                subcategory,
            },
        );
    }

    fn link_requests(&self) -> Vec<LinkRequest> {
        self.link_requests.lock().clone()
    }

    fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedModem {
    async fn turn_on(&self, _: Address, _: TurnOnOptions) -> Result<(), TransportError> {
        Ok(())
    }

    async fn turn_off(&self, _: Address, _: Option<Duration>) -> Result<(), TransportError> {
        Ok(())
    }

    async fn query_status(&self, address: Address, _: u8) -> Result<u8, TransportError> {
        Ok(self.statuses.lock().get(&address).copied().unwrap_or_default())
    }

    async fn request_link(
        &self,
        request: LinkRequest,
    ) -> Result<Option<LinkRecord>, TransportError> {
        self.link_requests.lock().push(request);
        let scripted = self.links.lock().pop_front();
        if let Some(record) = scripted {
            return Ok(Some(record));
        }

        let _waiting = Waiting::enter(&self.waiting);
        tokio::select! {
            () = self.cancel.notified() => Err(TransportError::Cancelled),
            () = tokio::time::sleep(request.timeout) => Ok(None),
        }
    }

    async fn link_database(&self) -> Result<Vec<LinkRecord>, TransportError> {
        Ok(self.database.lock().clone())
    }

    async fn product_identity(&self, address: Address) -> Result<ProductIdentity, TransportError> {
        let identity = self.identities.lock().get(&address).copied();
        identity.ok_or(TransportError::Timeout(5_000))
    }

    async fn cancel_pending_link(&self) -> Result<(), TransportError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancel.notify_waiters();
        Ok(())
    }
}

/// Store whose writes land immediately but take a while to return.
#[derive(Debug, Default)]
struct SlowStore {
    records: MemoryStore,
    writing: AtomicBool,
}

impl SlowStore {
    fn writing(&self) -> bool {
        self.writing.load(Ordering::SeqCst)
    }
}

impl LinkStore for SlowStore {
    async fn get(&self, address: Address) -> Result<Option<LinkRecord>, StoreError> {
        self.records.get(address).await
    }

    async fn set(&self, address: Address, record: LinkRecord) -> Result<(), StoreError> {
        self.records.set(address, record).await?;
        self.writing.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(())
    }

    async fn delete(&self, address: Address) -> Result<(), StoreError> {
        self.records.delete(address).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn address(last: u8) -> Address {
    Address::new([0x1a, 0x2b, last])
}

fn config() -> AdapterConfig {
    AdapterConfig::default().with_link_timeout(Duration::from_millis(20))
}

fn adapter() -> Adapter<ScriptedModem, MemoryStore> {
    Adapter::new(ScriptedModem::default(), MemoryStore::new(), config())
}

fn drain(events: &mut broadcast::Receiver<DeviceEvent>) -> Vec<DeviceEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

fn prompts(events: &[DeviceEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            DeviceEvent::PairingPrompt { message, .. } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

/// Yields to the runtime until `condition` holds.
async fn settle(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never held");
}

async fn next_added(events: &mut broadcast::Receiver<DeviceEvent>) -> DeviceId {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let DeviceEvent::DeviceAdded { device_id } = events.recv().await.unwrap() {
                return device_id;
            }
        }
    })
    .await
    .expect("no device added")
}

// ============================================================================
// Scan
// ============================================================================

mod scan {
    use super::*;

    #[tokio::test]
    async fn second_scan_adds_nothing() {
        let adapter = adapter();
        let modem = adapter.transport();
        modem.set_database(vec![
            LinkRecord::controller(address(1), 0x01, 0x20, 1),
            LinkRecord::responder(address(1), 0),
            LinkRecord::controller(address(2), 0x02, 0x2a, 1),
        ]);
        modem.set_identity(address(1), 0x01, 0x20);
        modem.set_identity(address(2), 0x02, 0x2a);
        let mut events = adapter.subscribe();

        let first = adapter.scan().await.unwrap();
        assert_eq!(
            first,
            vec![
                DeviceId::from_address(address(1)),
                DeviceId::from_address(address(2))
            ]
        );

        let second = adapter.scan().await.unwrap();
        assert!(second.is_empty());
        assert_eq!(adapter.device_count().await, 2);

        let events = drain(&mut events);
        assert_eq!(
            prompts(&events),
            vec![
                "Found 2 devices. Adding things. This may take a while...",
                "Scan complete. Added 2 devices.",
                "Found 2 devices. Adding things. This may take a while...",
                "Scan complete. Added 0 devices.",
            ]
        );
        let added = events.iter().filter(|e| e.is_lifecycle()).count();
        assert_eq!(added, 2);
    }

    #[tokio::test]
    async fn scan_persists_product_class() {
        let adapter = adapter();
        adapter
            .transport()
            .set_database(vec![LinkRecord::responder(address(7), 1)]);
        adapter.transport().set_identity(address(7), 0x10, 0x02);

        adapter.scan().await.unwrap();

        let record = adapter.store().get(address(7)).await.unwrap().unwrap();
        assert_eq!((record.category, record.subcategory), (0x10, 0x02));
        assert!(record.is_controller());
    }
}

// ============================================================================
// Linking
// ============================================================================

mod linking {
    use super::*;

    #[tokio::test]
    async fn new_controller_is_added_with_responder_link() {
        let adapter = adapter();
        adapter
            .transport()
            .script_link(LinkRecord::controller(address(1), 0x01, 0x20, 1));
        let mut events = adapter.subscribe();

        let outcome = adapter.link(Duration::from_secs(30)).await.unwrap();

        let device_id = DeviceId::from_address(address(1));
        assert_eq!(outcome, LinkOutcome::Added(device_id));
        assert!(adapter.device(device_id).await.is_some());
        assert!(adapter.store().get(address(1)).await.unwrap().is_some());

        let requests = adapter.transport().link_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].address, None);
        assert!(requests[0].controller);
        assert_eq!(requests[1].address, Some(address(1)));
        assert!(!requests[1].controller);
        assert_eq!(requests[1].group, Some(1));

        let events = drain(&mut events);
        assert_eq!(
            prompts(&events),
            vec!["Press the 'set' button on the device you would like to link."]
        );
    }

    #[tokio::test]
    async fn battery_device_gets_no_responder_link() {
        let adapter = adapter();
        adapter
            .transport()
            .script_link(LinkRecord::controller(address(1), 0x10, 0x01, 1));

        let outcome = adapter.link(Duration::from_secs(30)).await.unwrap();

        assert!(matches!(outcome, LinkOutcome::Added(_)));
        assert_eq!(adapter.transport().link_requests().len(), 1);
    }

    #[tokio::test]
    async fn responder_records_never_create_devices() {
        let adapter = adapter();
        let modem = adapter.transport();
        modem.script_link(LinkRecord::responder(address(1), 1));

        let outcome = adapter.link(Duration::from_secs(30)).await.unwrap();
        assert_eq!(outcome, LinkOutcome::ResponderOnly(address(1)));
        assert_eq!(adapter.device_count().await, 0);

        let device_id = adapter.add_device(address(1), 0x02, 0x2a).await.unwrap();
        modem.script_link(LinkRecord::responder(address(1), 1));
        let outcome = adapter.link(Duration::from_secs(30)).await.unwrap();
        assert_eq!(outcome, LinkOutcome::Existing(device_id));
    }

    #[tokio::test]
    async fn unsupported_device_fails_without_leftovers() {
        let adapter = adapter();
        adapter
            .transport()
            .script_link(LinkRecord::controller(address(1), 0x42, 0x00, 1));

        let result = adapter.link(Duration::from_secs(30)).await;

        assert!(matches!(
            result,
            Err(Error::UnsupportedDevice {
                category: 0x42,
                subcategory: 0x00
            })
        ));
        assert_eq!(adapter.device_count().await, 0);
        assert!(adapter.store().is_empty());
    }

    #[tokio::test]
    async fn silence_is_no_response() {
        let adapter = adapter();
        let outcome = adapter.link(Duration::from_millis(10)).await.unwrap();
        assert_eq!(outcome, LinkOutcome::NoResponse);
    }

    #[tokio::test]
    async fn heartbeat_setup_links_group_four() {
        let adapter = adapter();
        let device_id = adapter.add_device(address(1), 0x10, 0x01).await.unwrap();
        adapter
            .transport()
            .script_link(LinkRecord::responder(address(1), 4));

        let record = adapter.setup_heartbeat(device_id).await.unwrap();

        assert_eq!(record.map(|r| r.group), Some(4));
        let request = adapter.transport().link_requests()[0];
        assert_eq!(request.group, Some(4));
        assert!(!request.controller);
    }
}

// ============================================================================
// Pairing
// ============================================================================

mod pairing {
    use super::*;

    #[tokio::test]
    async fn pairing_reports_new_device() {
        let adapter = adapter();
        adapter
            .transport()
            .script_link(LinkRecord::controller(address(1), 0x02, 0x2a, 1));
        let mut events = adapter.subscribe();

        adapter.pair(30).unwrap();

        let device_id = next_added(&mut events).await;
        assert_eq!(device_id, DeviceId::from_address(address(1)));

        let prompt = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let DeviceEvent::PairingPrompt {
                    message,
                    device_id: Some(id),
                } = events.recv().await.unwrap()
                {
                    return (message, id);
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(prompt, ("Linked new device".to_string(), device_id));
    }

    #[tokio::test]
    async fn second_pair_while_running_is_refused() {
        let adapter = adapter();
        adapter.pair(60).unwrap();

        assert!(adapter.is_pairing());
        assert!(matches!(adapter.pair(60), Err(Error::PairingInProgress)));

        adapter.cancel_pairing().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_releases_link_wait_and_allows_new_pairing() {
        let adapter = adapter();
        let modem = adapter.transport();

        adapter.pair(60).unwrap();
        settle(|| modem.waiting() == 1).await;

        adapter.cancel_pairing().await.unwrap();
        settle(|| modem.waiting() == 0).await;

        assert!(!adapter.is_pairing());
        assert_eq!(adapter.device_count().await, 0);
        assert_eq!(modem.cancels.load(Ordering::SeqCst), 1);

        modem.script_link(LinkRecord::controller(address(1), 0x01, 0x20, 1));
        let mut events = adapter.subscribe();
        adapter.pair(60).unwrap();

        let device_id = next_added(&mut events).await;
        assert_eq!(device_id, DeviceId::from_address(address(1)));
    }

    #[tokio::test]
    async fn cancel_after_link_record_still_adds_device() {
        let adapter = Adapter::new(ScriptedModem::default(), SlowStore::default(), config());
        adapter
            .transport()
            .script_link(LinkRecord::controller(address(1), 0x02, 0x2a, 1));
        let mut events = adapter.subscribe();

        adapter.pair(30).unwrap();
        settle(|| adapter.store().writing()).await;
        adapter.cancel_pairing().await.unwrap();
        assert!(!adapter.is_pairing());

        let device_id = next_added(&mut events).await;
        assert_eq!(device_id, DeviceId::from_address(address(1)));
        assert!(adapter.device(device_id).await.is_some());
        assert!(adapter.store().get(address(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn shutdown_leaves_linking_mode() {
        let adapter = adapter();
        adapter.pair(60).unwrap();
        settle(|| adapter.transport().waiting() == 1).await;

        adapter.shutdown().await;
        settle(|| adapter.transport().waiting() == 0).await;

        assert!(!adapter.is_pairing());
        assert_eq!(adapter.transport().cancels.load(Ordering::SeqCst), 1);
    }
}

// ============================================================================
// Routing
// ============================================================================

mod routing {
    use super::*;

    #[tokio::test]
    async fn inbound_messages_reach_their_device() {
        let adapter = adapter();
        let switch = adapter.add_device(address(1), 0x02, 0x2a).await.unwrap();
        let motion = adapter.add_device(address(2), 0x10, 0x01).await.unwrap();
        let mut events = adapter.subscribe();

        let (tx, rx) = mpsc::channel(16);
        adapter.start(rx);

        tx.send(Message::broadcast(address(9), 1, Command::On))
            .await
            .unwrap();
        tx.send(Message::broadcast(address(2), 1, Command::On))
            .await
            .unwrap();
        tx.send(Message::broadcast(address(2), 4, Command::On))
            .await
            .unwrap();
        tx.send(Message::broadcast(address(1), 1, Command::OnFast))
            .await
            .unwrap();

        let mut received = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), async {
            while received.len() < 4 {
                received.push(events.recv().await.unwrap());
            }
        })
        .await
        .unwrap();

        assert_eq!(
            received,
            vec![
                DeviceEvent::property_changed(motion, "motion", PropertyValue::Bool(true)),
                DeviceEvent::event_raised(motion, "Heartbeat"),
                DeviceEvent::property_changed(switch, "on", PropertyValue::Bool(true)),
                DeviceEvent::event_raised(switch, "FastOn"),
            ]
        );
        adapter.shutdown().await;
    }
}

// ============================================================================
// Persistence
// ============================================================================

mod persistence {
    use super::*;

    #[tokio::test]
    async fn linked_device_is_restored_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");
        let device_id = DeviceId::from_address(address(1));

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            let adapter = Adapter::new(ScriptedModem::default(), store, config());
            adapter
                .transport()
                .script_link(LinkRecord::controller(address(1), 0x01, 0x20, 1));
            adapter.link(Duration::from_secs(30)).await.unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        let adapter = Adapter::new(ScriptedModem::default(), store, config());
        assert_eq!(
            adapter.restore_device(device_id).await.unwrap(),
            Some(device_id)
        );

        let device = adapter.device(device_id).await.unwrap();
        assert_eq!(device.title(), "SwitchLinc Dimmer [1A.2B.01]");
        assert!(device.property("level").is_some());

        let unknown = DeviceId::from_address(address(2));
        assert_eq!(adapter.restore_device(unknown).await.unwrap(), None);
    }

    #[tokio::test]
    async fn removed_device_is_forgotten() {
        let adapter = adapter();
        adapter
            .transport()
            .script_link(LinkRecord::controller(address(1), 0x02, 0x2a, 1));
        let LinkOutcome::Added(device_id) = adapter.link(Duration::from_secs(30)).await.unwrap()
        else {
            panic!("expected a new device");
        };
        let mut events = adapter.subscribe();

        assert!(adapter.remove_device(device_id).await.unwrap());

        assert!(adapter.store().get(address(1)).await.unwrap().is_none());
        assert_eq!(
            drain(&mut events),
            vec![DeviceEvent::device_removed(device_id)]
        );
        assert_eq!(adapter.restore_device(device_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn shared_adapter_clones_see_the_same_registry() {
        let adapter = adapter();
        let clone = adapter.clone();
        let device_id = adapter.add_device(address(1), 0x02, 0x2a).await.unwrap();

        assert!(clone.device(device_id).await.is_some());
        let _: Arc<_> = clone.devices().await.remove(0);
    }
}
