// Crate-level lint configuration: suppress stylistic warnings that don't affect correctness.
#![allow(
    clippy::empty_line_after_doc_comments,
    clippy::doc_lazy_continuation,
    clippy::too_many_arguments,
    clippy::type_complexity
)]

// ── Pure building blocks ────────────────────────────────────────────────────
pub mod config;
pub mod error;
pub mod group_code;
pub mod model;
pub mod protocol;

// ── Stateful coordination ───────────────────────────────────────────────────
pub mod ark_cache;
pub mod group_svc;
pub mod refresh;
pub mod service;

pub mod logging;

#[cfg(test)]
mod testing;

// ── Re-export main types ────────────────────────────────────────────────────
pub use ark_cache::ArkCache;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use group_code::group_uin_to_code;
pub use group_svc::GroupDirectory;
pub use model::{parse_honor, GroupRecord, MemberRecord, SessionMember};
pub use protocol::Command;
pub use refresh::{RefreshClass, RefreshCoordinator, RefreshPhase, RefreshStats};
pub use service::{
    GroupInfoStore, LegacyDirectory, MemberInfoStore, PacketDispatch, PacketHandler,
    SessionGroupService, SnapshotCallback, Transport,
};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version
pub fn get_version() -> &'static str {
    VERSION
}
