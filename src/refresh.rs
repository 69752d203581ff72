//! Single-flight refresh coordination.
//!
//! The directory subsystem offers no completion signal for its refreshes: the
//! only way to know a refresh landed is to watch its cache change. Each refresh
//! therefore runs the same protocol under a per-class lock:
//!
//! 1. acquire the class lock (one refresh per class at a time, across all keys)
//! 2. invalidate the target's cached entries so stale data cannot satisfy the poll
//! 3. trigger the legacy refresh
//! 4. poll the cache at a fixed interval until populated or the budget elapses
//! 5. release the lock and return the value, or `None` on timeout
//!
//! Lock granularity is per class, not per key: refreshes of unrelated groups
//! queue behind each other.
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::group_code::group_uin_to_code;
use crate::model::{GroupRecord, MemberRecord};
use crate::service::{GroupInfoStore, LegacyDirectory, MemberInfoStore};

/// Request type passed to the legacy member-list refresh.
pub const MEMBER_LIST_REQ_TYPE: i32 = 5;

// ─── Classes and phases ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshClass {
    GroupList,
    GroupInfo,
    MemberList,
    MemberInfo,
}

impl fmt::Display for RefreshClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshClass::GroupList => "group-list",
            RefreshClass::GroupInfo => "group-info",
            RefreshClass::MemberList => "member-list",
            RefreshClass::MemberInfo => "member-info",
        };
        f.write_str(name)
    }
}

/// Where the current (or last) refresh of a class stands.
///
/// `Idle -> Requested -> Polling -> {Satisfied, TimedOut}`; suspension happens
/// only while `Polling`. A failed trigger or a cancelled wait returns to `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Requested,
    Polling,
    Satisfied,
    TimedOut,
}

/// Counters for one refresh class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshStats {
    pub class: RefreshClass,
    pub phase: RefreshPhase,
    pub triggered: u64,
    pub satisfied: u64,
    pub timed_out: u64,
}

impl fmt::Display for RefreshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} | triggered {} | satisfied {} | timed out {}",
            self.class, self.phase, self.triggered, self.satisfied, self.timed_out
        )
    }
}

// ─── Per-class slot ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SlotState {
    phase: RefreshPhase,
    triggered: u64,
    satisfied: u64,
    timed_out: u64,
}

/// Lock plus bookkeeping for one refresh class.
struct ClassSlot {
    class: RefreshClass,
    lock: tokio::sync::Mutex<()>,
    state: Mutex<SlotState>,
}

impl ClassSlot {
    fn new(class: RefreshClass) -> Self {
        Self {
            class,
            lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(SlotState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: RefreshPhase) {
        self.state().phase = phase;
        log::trace!("{} refresh -> {:?}", self.class, phase);
    }

    /// Run the trigger side-effect, moving to `Requested`.
    fn trigger(&self, side_effect: impl FnOnce() -> Result<()>) -> Result<()> {
        {
            let mut state = self.state();
            state.phase = RefreshPhase::Requested;
            state.triggered += 1;
        }
        side_effect().map_err(|e| {
            log::error!("{} refresh trigger failed: {}", self.class, e);
            self.set_phase(RefreshPhase::Idle);
            e
        })
    }

    fn finish(&self, satisfied: bool) {
        let mut state = self.state();
        if satisfied {
            state.phase = RefreshPhase::Satisfied;
            state.satisfied += 1;
        } else {
            state.phase = RefreshPhase::TimedOut;
            state.timed_out += 1;
        }
    }

    fn stats(&self) -> RefreshStats {
        let state = self.state();
        RefreshStats {
            class: self.class,
            phase: state.phase,
            triggered: state.triggered,
            satisfied: state.satisfied,
            timed_out: state.timed_out,
        }
    }

    /// Poll `probe` every `interval` (probing immediately first) until it yields
    /// a value or `budget` elapses.
    async fn poll<T>(
        &self,
        interval: Duration,
        budget: Duration,
        mut probe: impl FnMut() -> Option<T>,
    ) -> Option<T> {
        self.set_phase(RefreshPhase::Polling);
        let waited = tokio::time::timeout(budget, async {
            loop {
                if let Some(value) = probe() {
                    return value;
                }
                tokio::time::sleep(interval).await;
            }
        })
        .await;

        match waited {
            Ok(value) => {
                self.finish(true);
                Some(value)
            }
            Err(_) => {
                log::warn!("{} refresh not satisfied within {:?}", self.class, budget);
                self.finish(false);
                None
            }
        }
    }
}

/// Aborts the group-list watcher when the waiting caller goes away.
struct WatcherGuard(JoinHandle<()>);

impl Drop for WatcherGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum GroupListWait {
    Initialized,
    Cancelled,
    TimedOut,
    WatcherGone,
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

pub struct RefreshCoordinator {
    config: BridgeConfig,
    group_list: ClassSlot,
    group_info: ClassSlot,
    member_list: ClassSlot,
    member_info: ClassSlot,
}

impl RefreshCoordinator {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            group_list: ClassSlot::new(RefreshClass::GroupList),
            group_info: ClassSlot::new(RefreshClass::GroupInfo),
            member_list: ClassSlot::new(RefreshClass::MemberList),
            member_info: ClassSlot::new(RefreshClass::MemberInfo),
        }
    }

    fn slot(&self, class: RefreshClass) -> &ClassSlot {
        match class {
            RefreshClass::GroupList => &self.group_list,
            RefreshClass::GroupInfo => &self.group_info,
            RefreshClass::MemberList => &self.member_list,
            RefreshClass::MemberInfo => &self.member_info,
        }
    }

    pub fn stats(&self, class: RefreshClass) -> RefreshStats {
        self.slot(class).stats()
    }

    /// Re-download a group's member list and wait for a non-empty result.
    pub async fn refresh_member_list(
        &self,
        store: &dyn MemberInfoStore,
        legacy: &dyn LegacyDirectory,
        group_id: u64,
    ) -> Result<Option<Vec<MemberRecord>>> {
        let slot = &self.member_list;
        let _guard = slot.lock.lock().await;

        store.delete_members(group_id);
        slot.trigger(|| {
            legacy.refresh_member_list(
                true,
                group_id,
                group_uin_to_code(group_id),
                MEMBER_LIST_REQ_TYPE,
            )
        })?;

        let members = slot
            .poll(
                self.config.member_list_poll(),
                self.config.member_list_timeout(),
                || store.all_members(group_id).filter(|list| !list.is_empty()),
            )
            .await;

        if let Some(list) = &members {
            log::debug!("Member list of group {} refreshed ({} members)", group_id, list.len());
        }
        Ok(members)
    }

    /// Re-fetch one member card and wait until the subsystem reports it cached.
    /// A member reported cached but unreadable resolves to `None`.
    pub async fn refresh_member(
        &self,
        store: &dyn MemberInfoStore,
        legacy: &dyn LegacyDirectory,
        group_id: u64,
        member_id: u64,
    ) -> Result<Option<MemberRecord>> {
        let slot = &self.member_info;
        let _guard = slot.lock.lock().await;

        store.delete_member(group_id, member_id);
        slot.trigger(|| {
            legacy.request_member_card_v2(group_id, group_uin_to_code(group_id), &[member_id])?;
            legacy.request_member_card(group_id, member_id)
        })?;

        let member = slot
            .poll(
                self.config.member_info_poll(),
                self.config.member_info_timeout(),
                || {
                    store
                        .is_member_in_cache(group_id, member_id)
                        .then(|| store.member(group_id, member_id))
                },
            )
            .await;

        Ok(member.flatten())
    }

    /// Trigger a group-list refresh and wait for a populated record of `group_id`.
    pub async fn refresh_group_info(
        &self,
        store: &dyn GroupInfoStore,
        legacy: &dyn LegacyDirectory,
        group_id: u64,
    ) -> Result<Option<GroupRecord>> {
        let slot = &self.group_info;
        let _guard = slot.lock.lock().await;

        slot.trigger(|| legacy.refresh_group_list())?;

        let group = slot
            .poll(
                self.config.group_info_poll(),
                self.config.group_info_timeout(),
                || {
                    store
                        .group(group_id)
                        .filter(|group| !group.group_code.trim().is_empty())
                },
            )
            .await;
        Ok(group)
    }

    /// Trigger a group-list refresh and wait for the subsystem's cache-initialized flag.
    ///
    /// The flag is checked by a spawned watcher once per `group_list_poll`. Returns
    /// `Ok(false)` when `cancel` fires (the watcher is aborted) or when the
    /// optional budget runs out. Dropping the returned future also aborts the watcher.
    pub async fn refresh_group_list(
        &self,
        store: Arc<dyn GroupInfoStore>,
        legacy: &dyn LegacyDirectory,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let slot = &self.group_list;
        let _guard = tokio::select! {
            guard = slot.lock.lock() => guard,
            _ = cancel.cancelled() => return Ok(false),
        };

        slot.trigger(|| legacy.refresh_group_list())?;
        slot.set_phase(RefreshPhase::Polling);

        let (done_tx, done_rx) = oneshot::channel();
        let interval = self.config.group_list_poll();
        let _watcher = WatcherGuard(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if store.is_cache_initialized() {
                    let _ = done_tx.send(());
                    return;
                }
            }
        }));

        let outcome = tokio::select! {
            _ = cancel.cancelled() => GroupListWait::Cancelled,
            _ = deadline(self.config.group_list_timeout()) => GroupListWait::TimedOut,
            done = done_rx => match done {
                Ok(()) => GroupListWait::Initialized,
                Err(_) => GroupListWait::WatcherGone,
            },
        };

        match outcome {
            GroupListWait::Initialized => {
                slot.finish(true);
                log::debug!("Group list cache initialized");
                Ok(true)
            }
            GroupListWait::TimedOut => {
                slot.finish(false);
                log::warn!("Group list cache not initialized in time");
                Ok(false)
            }
            GroupListWait::Cancelled => {
                slot.set_phase(RefreshPhase::Idle);
                log::info!("Group list wait cancelled by caller");
                Ok(false)
            }
            GroupListWait::WatcherGone => {
                slot.set_phase(RefreshPhase::Idle);
                log::error!("Group list watcher ended without a result");
                Ok(false)
            }
        }
    }
}

/// Completes after `budget`, or never.
fn deadline(budget: Option<Duration>) -> impl Future<Output = ()> {
    async move {
        match budget {
            Some(budget) => tokio::time::sleep(budget).await,
            None => std::future::pending::<()>().await,
        }
    }
}
