//! Interfaces of the external collaborators.
//!
//! The directory subsystem, the session service, the transport and the packet
//! dispatch table all live in the host application. The host implements these
//! traits (usually by adapting its own handlers) and hands them to
//! [`GroupDirectory`](crate::GroupDirectory).
//!
//! Every method is synchronous and fire-and-forget from the bridge's point of
//! view: refresh triggers return as soon as the request is queued, and the
//! bridge learns about completion only by reading the stores again.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{GroupRecord, MemberRecord, SessionMember};
use crate::protocol::{Command, GroupManagementRequest, ModifyCardRequest};

// ---------------------------------------------------------------------------
// Directory cache (read side)
// ---------------------------------------------------------------------------

/// Group cache of the directory subsystem.
pub trait GroupInfoStore: Send + Sync {
    fn all_groups(&self) -> Option<Vec<GroupRecord>>;
    fn group(&self, group_id: u64) -> Option<GroupRecord>;
    /// True once the group-list cache has completed at least one full population pass.
    fn is_cache_initialized(&self) -> bool;
}

/// Member cache of the directory subsystem.
pub trait MemberInfoStore: Send + Sync {
    fn all_members(&self, group_id: u64) -> Option<Vec<MemberRecord>>;
    fn member(&self, group_id: u64, member_id: u64) -> Option<MemberRecord>;
    fn is_member_in_cache(&self, group_id: u64, member_id: u64) -> bool;
    fn delete_members(&self, group_id: u64);
    fn delete_member(&self, group_id: u64, member_id: u64);
}

// ---------------------------------------------------------------------------
// Legacy directory handlers (write side)
// ---------------------------------------------------------------------------

/// Refresh and modification entry points of the legacy directory handlers.
///
/// Implementations return `BridgeError::RuntimeUnavailable` when the host
/// runtime is not ready to take the request.
pub trait LegacyDirectory: Send + Sync {
    /// Re-download the group list.
    fn refresh_group_list(&self) -> Result<()>;

    /// Re-download a group's member list.
    fn refresh_member_list(
        &self,
        force: bool,
        group_id: u64,
        group_code: u64,
        req_type: i32,
    ) -> Result<()>;

    /// Fetch one member card.
    fn request_member_card(&self, group_id: u64, member_id: u64) -> Result<()>;

    /// Fetch member cards through the newer batch path.
    fn request_member_card_v2(&self, group_id: u64, group_code: u64, member_ids: &[u64])
        -> Result<()>;

    fn modify_member_card(&self, req: &ModifyCardRequest) -> Result<()>;

    fn rename_group(&self, group_id: u64, name: &str, notify: bool) -> Result<()>;

    fn group_management(&self, req: &GroupManagementRequest) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Session service
// ---------------------------------------------------------------------------

/// Completion of a member snapshot: result code (`0` = success) and members keyed by uid.
pub type SnapshotCallback = Box<dyn FnOnce(i32, HashMap<String, SessionMember>) + Send>;

pub trait SessionGroupService: Send + Sync {
    /// Request a snapshot of a group's members. `callback` is invoked at most once;
    /// dropping it without invoking it is treated as a failed lookup.
    fn fetch_member_snapshot(&self, group_id: u64, callback: SnapshotCallback);
}

// ---------------------------------------------------------------------------
// Transport and inbound dispatch
// ---------------------------------------------------------------------------

pub trait Transport: Send + Sync {
    /// Queue a command for transmission. Success means "accepted", not "applied".
    fn send(&self, command: Command) -> Result<()>;
}

pub type PacketHandler = Box<dyn Fn(&[u8]) + Send + Sync>;

pub trait PacketDispatch {
    /// Route inbound packets for `service` to `handler`.
    fn register(&self, service: &'static str, handler: PacketHandler);
}
