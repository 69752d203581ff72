//! In-memory collaborators for unit tests.
//!
//! `FakeLegacy` mimics the directory subsystem: each refresh trigger can be
//! scheduled to populate `FakeStores` after a delay, or to never populate it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::model::{GroupRecord, MemberRecord, SessionMember};
use crate::protocol::{Command, GroupManagementRequest, ModifyCardRequest};
use crate::service::{
    GroupInfoStore, LegacyDirectory, MemberInfoStore, PacketDispatch, PacketHandler,
    SessionGroupService, SnapshotCallback, Transport,
};

pub const SELF_UIN: u64 = 10001;

pub fn member(group_id: u64, member_id: u64, nick: &str) -> MemberRecord {
    MemberRecord {
        group_id,
        member_id,
        nickname: Some(nick.to_string()),
        remark: format!("remark-{}", member_id),
        in_cache: true,
        ..Default::default()
    }
}

pub fn group(group_id: u64) -> GroupRecord {
    GroupRecord {
        group_id,
        group_code: group_id.to_string(),
        name: format!("group-{}", group_id),
        owner_uin: SELF_UIN.to_string(),
        administrators: "20001|20002".into(),
        ..Default::default()
    }
}

// ─── Stores ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStores {
    groups: Mutex<HashMap<u64, GroupRecord>>,
    initialized: AtomicBool,
    init_checks: AtomicUsize,
    lists: Mutex<HashMap<u64, Vec<MemberRecord>>>,
    cards: Mutex<HashMap<(u64, u64), MemberRecord>>,
}

impl FakeStores {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_group(&self, group: GroupRecord) {
        self.groups.lock().unwrap().insert(group.group_id, group);
    }

    pub fn set_initialized(&self, initialized: bool) {
        self.initialized.store(initialized, Ordering::SeqCst);
    }

    /// How many times the cache-initialized flag has been read.
    pub fn init_checks(&self) -> usize {
        self.init_checks.load(Ordering::SeqCst)
    }

    pub fn set_members(&self, group_id: u64, members: Vec<MemberRecord>) {
        self.lists.lock().unwrap().insert(group_id, members);
    }

    pub fn set_card(&self, member: MemberRecord) {
        self.cards
            .lock()
            .unwrap()
            .insert((member.group_id, member.member_id), member);
    }
}

impl GroupInfoStore for FakeStores {
    fn all_groups(&self) -> Option<Vec<GroupRecord>> {
        let groups = self.groups.lock().unwrap();
        if groups.is_empty() {
            return None;
        }
        let mut all: Vec<_> = groups.values().cloned().collect();
        all.sort_by_key(|g| g.group_id);
        Some(all)
    }

    fn group(&self, group_id: u64) -> Option<GroupRecord> {
        self.groups.lock().unwrap().get(&group_id).cloned()
    }

    fn is_cache_initialized(&self) -> bool {
        self.init_checks.fetch_add(1, Ordering::SeqCst);
        self.initialized.load(Ordering::SeqCst)
    }
}

impl MemberInfoStore for FakeStores {
    fn all_members(&self, group_id: u64) -> Option<Vec<MemberRecord>> {
        self.lists.lock().unwrap().get(&group_id).cloned()
    }

    fn member(&self, group_id: u64, member_id: u64) -> Option<MemberRecord> {
        self.cards.lock().unwrap().get(&(group_id, member_id)).cloned()
    }

    fn is_member_in_cache(&self, group_id: u64, member_id: u64) -> bool {
        self.cards.lock().unwrap().contains_key(&(group_id, member_id))
    }

    fn delete_members(&self, group_id: u64) {
        self.lists.lock().unwrap().remove(&group_id);
    }

    fn delete_member(&self, group_id: u64, member_id: u64) {
        self.cards.lock().unwrap().remove(&(group_id, member_id));
    }
}

// ─── Legacy handlers ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Plans {
    members: Option<(Duration, Vec<MemberRecord>)>,
    cards: Option<Duration>,
    groups: Option<(Duration, Vec<GroupRecord>)>,
}

pub struct FakeLegacy {
    stores: Arc<FakeStores>,
    plans: Mutex<Plans>,
    calls: Mutex<Vec<String>>,
    pub runtime_ready: AtomicBool,
    pub group_list_calls: AtomicUsize,
    pub member_list_calls: AtomicUsize,
    pub card_calls: AtomicUsize,
    cards_in_flight: Arc<AtomicUsize>,
    pub max_cards_in_flight: AtomicUsize,
}

impl FakeLegacy {
    pub fn new(stores: Arc<FakeStores>) -> Self {
        Self {
            stores,
            plans: Mutex::new(Plans::default()),
            calls: Mutex::new(Vec::new()),
            runtime_ready: AtomicBool::new(true),
            group_list_calls: AtomicUsize::new(0),
            member_list_calls: AtomicUsize::new(0),
            card_calls: AtomicUsize::new(0),
            cards_in_flight: Arc::new(AtomicUsize::new(0)),
            max_cards_in_flight: AtomicUsize::new(0),
        }
    }

    /// The next member-list refreshes populate `members` after `delay`.
    pub fn populate_members_after(&self, delay: Duration, members: Vec<MemberRecord>) {
        self.plans.lock().unwrap().members = Some((delay, members));
    }

    /// Member card requests populate the requested card after `delay`.
    pub fn populate_cards_after(&self, delay: Duration) {
        self.plans.lock().unwrap().cards = Some(delay);
    }

    /// Group-list refreshes populate `groups` and set the initialized flag after `delay`.
    pub fn populate_groups_after(&self, delay: Duration, groups: Vec<GroupRecord>) {
        self.plans.lock().unwrap().groups = Some((delay, groups));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        if !self.runtime_ready.load(Ordering::SeqCst) {
            return Err(BridgeError::RuntimeUnavailable("fake runtime not ready".into()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl LegacyDirectory for FakeLegacy {
    fn refresh_group_list(&self) -> Result<()> {
        self.record("group_list".into())?;
        self.group_list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((delay, groups)) = self.plans.lock().unwrap().groups.clone() {
            let stores = self.stores.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                for group in groups {
                    stores.set_group(group);
                }
                stores.set_initialized(true);
            });
        }
        Ok(())
    }

    fn refresh_member_list(
        &self,
        force: bool,
        group_id: u64,
        group_code: u64,
        req_type: i32,
    ) -> Result<()> {
        assert!(force);
        self.record(format!("member_list {} {} {}", group_id, group_code, req_type))?;
        self.member_list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((delay, members)) = self.plans.lock().unwrap().members.clone() {
            let stores = self.stores.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                stores.set_members(group_id, members);
            });
        }
        Ok(())
    }

    fn request_member_card(&self, group_id: u64, member_id: u64) -> Result<()> {
        self.record(format!("card {} {}", group_id, member_id))?;
        self.card_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.cards_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_cards_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let plan = self.plans.lock().unwrap().cards;
        let counter = self.cards_in_flight.clone();
        match plan {
            Some(delay) => {
                let stores = self.stores.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    counter.fetch_sub(1, Ordering::SeqCst);
                    stores.set_card(member(group_id, member_id, "card"));
                });
            }
            None => {
                counter.fetch_sub(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    fn request_member_card_v2(
        &self,
        group_id: u64,
        group_code: u64,
        member_ids: &[u64],
    ) -> Result<()> {
        self.record(format!("card_v2 {} {} {:?}", group_id, group_code, member_ids))
    }

    fn modify_member_card(&self, req: &ModifyCardRequest) -> Result<()> {
        let info = &req.uin_info[0];
        self.record(format!("modify_card {} {} {}", req.group_code, info.uin, info.name))
    }

    fn rename_group(&self, group_id: u64, name: &str, notify: bool) -> Result<()> {
        self.record(format!("rename {} {} {}", group_id, name, notify))
    }

    fn group_management(&self, req: &GroupManagementRequest) -> Result<()> {
        self.record(format!(
            "group_mng {} {} {}",
            req.req_type, req.group_id, req.self_uin
        ))
    }
}

// ─── Session, transport, dispatch ────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSession {
    snapshots: Mutex<HashMap<u64, (i32, HashMap<String, SessionMember>)>>,
}

impl FakeSession {
    pub fn set_snapshot(&self, group_id: u64, code: i32, members: Vec<SessionMember>) {
        let map = members.into_iter().map(|m| (m.uid.clone(), m)).collect();
        self.snapshots.lock().unwrap().insert(group_id, (code, map));
    }
}

impl SessionGroupService for FakeSession {
    fn fetch_member_snapshot(&self, group_id: u64, callback: SnapshotCallback) {
        // Unknown groups drop the callback without answering.
        if let Some((code, members)) = self.snapshots.lock().unwrap().get(&group_id).cloned() {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                callback(code, members);
            });
        }
    }
}

#[derive(Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<Command>>,
}

impl FakeTransport {
    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn send(&self, command: Command) -> Result<()> {
        self.sent.lock().unwrap().push(command);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDispatch {
    handlers: Mutex<HashMap<&'static str, PacketHandler>>,
}

impl FakeDispatch {
    /// Deliver an inbound packet; false when no handler is registered.
    pub fn deliver(&self, service: &str, raw: &[u8]) -> bool {
        match self.handlers.lock().unwrap().get(service) {
            Some(handler) => {
                handler(raw);
                true
            }
            None => false,
        }
    }
}

impl PacketDispatch for FakeDispatch {
    fn register(&self, service: &'static str, handler: PacketHandler) {
        self.handlers.lock().unwrap().insert(service, handler);
    }
}
