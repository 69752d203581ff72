//! Group directory facade.
//!
//! Reads go to the directory subsystem's cache first and fall back to the
//! refresh coordinator when the caller asks for fresh data or the cached entry
//! is missing, stale or not yet initialized. Mutations are encoded and handed to
//! the transport (or the legacy handlers) without waiting for confirmation.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::ark_cache::ArkCache;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::group_code::group_uin_to_code;
use crate::model::{GroupRecord, MemberRecord, SessionMember};
use crate::protocol::{
    self, parse_uin, Command, GroupManagementRequest, ModifyCardRequest, SVC_JOIN_GROUP_LINK,
};
use crate::refresh::{RefreshClass, RefreshCoordinator, RefreshStats};
use crate::service::{
    GroupInfoStore, LegacyDirectory, MemberInfoStore, PacketDispatch, SessionGroupService,
    Transport,
};

pub struct GroupDirectory {
    groups: Arc<dyn GroupInfoStore>,
    members: Arc<dyn MemberInfoStore>,
    legacy: Arc<dyn LegacyDirectory>,
    session: Arc<dyn SessionGroupService>,
    transport: Arc<dyn Transport>,
    /// Logged-in account, used for ownership checks and for leaving groups.
    self_uin: u64,
    refresh: RefreshCoordinator,
    ark_cache: Arc<ArkCache>,
}

impl GroupDirectory {
    pub fn new(
        config: BridgeConfig,
        groups: Arc<dyn GroupInfoStore>,
        members: Arc<dyn MemberInfoStore>,
        legacy: Arc<dyn LegacyDirectory>,
        session: Arc<dyn SessionGroupService>,
        transport: Arc<dyn Transport>,
        self_uin: u64,
    ) -> Self {
        log::info!("Group directory started for account {}", self_uin);
        Self {
            groups,
            members,
            legacy,
            session,
            transport,
            self_uin,
            ark_cache: Arc::new(ArkCache::from_config(&config)),
            refresh: RefreshCoordinator::new(config),
        }
    }

    /// Route inbound share-link responses into the ark cache.
    pub fn register_handlers(&self, dispatch: &dyn PacketDispatch) {
        let cache = self.ark_cache.clone();
        dispatch.register(
            SVC_JOIN_GROUP_LINK,
            Box::new(move |raw| match cache.handle_join_group_link(raw) {
                Ok(group_id) => log::debug!("Share-link ark received for group {}", group_id),
                Err(e) => log::warn!("Dropping malformed {} packet: {}", SVC_JOIN_GROUP_LINK, e),
            }),
        );
    }

    pub fn stats(&self, class: RefreshClass) -> RefreshStats {
        self.refresh.stats(class)
    }

    /// Drop every cached ark. Collaborators are left untouched.
    pub fn shutdown(&self) {
        self.ark_cache.clear();
        log::info!("Group directory shut down");
    }

    // ─── Reads ───────────────────────────────────────────────────────────────

    pub async fn get_group_member_list(
        &self,
        group_id: &str,
        refresh: bool,
    ) -> Result<Option<Vec<MemberRecord>>> {
        let group_id = parse_uin(group_id)?;
        if !refresh {
            if let Some(list) = self.members.all_members(group_id).filter(|l| !l.is_empty()) {
                return Ok(Some(list));
            }
        }
        self.refresh
            .refresh_member_list(self.members.as_ref(), self.legacy.as_ref(), group_id)
            .await
    }

    /// All groups of the account. `None` when the group-list wait was cancelled
    /// or ran out of budget.
    pub async fn get_group_list(
        &self,
        refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<GroupRecord>>> {
        if !refresh && self.groups.is_cache_initialized() {
            if let Some(list) = self.groups.all_groups() {
                return Ok(Some(list));
            }
        }

        let initialized = self
            .refresh
            .refresh_group_list(self.groups.clone(), self.legacy.as_ref(), cancel)
            .await?;
        if !initialized {
            return Ok(None);
        }
        Ok(self.groups.all_groups())
    }

    pub async fn get_group_info(&self, group_id: &str, refresh: bool) -> Result<Option<GroupRecord>> {
        let group_id = parse_uin(group_id)?;
        if let Some(group) = self.fresh_group(group_id).filter(|_| !refresh) {
            return Ok(Some(group));
        }
        self.refresh
            .refresh_group_info(self.groups.as_ref(), self.legacy.as_ref(), group_id)
            .await
    }

    fn fresh_group(&self, group_id: u64) -> Option<GroupRecord> {
        if !self.groups.is_cache_initialized() {
            return None;
        }
        self.groups.group(group_id).filter(GroupRecord::is_populated)
    }

    /// One member of a group. Falls back to the session snapshot (names only)
    /// when the directory subsystem cannot produce the member card.
    pub async fn get_member_info(
        &self,
        group_id: &str,
        member_id: &str,
        refresh: bool,
    ) -> Result<Option<MemberRecord>> {
        let group_id = parse_uin(group_id)?;
        let member_id = parse_uin(member_id)?;

        if !refresh && self.members.is_member_in_cache(group_id, member_id) {
            if let Some(info) = self
                .members
                .member(group_id, member_id)
                .filter(|m| m.nickname.is_some())
            {
                return Ok(Some(info));
            }
        }

        let refreshed = self
            .refresh
            .refresh_member(self.members.as_ref(), self.legacy.as_ref(), group_id, member_id)
            .await?;
        if refreshed.is_some() {
            return Ok(refreshed);
        }

        log::debug!("Member {} of group {} not cached, asking the session", member_id, group_id);
        let fallback = self.find_in_snapshot(group_id, |_, m| m.uin == member_id).await;
        Ok(fallback.map(|m| m.into_member_record(group_id)))
    }

    pub async fn member_by_uin_via_session(
        &self,
        group_id: &str,
        uin: &str,
    ) -> Result<Option<SessionMember>> {
        let group_id = parse_uin(group_id)?;
        let uin = parse_uin(uin)?;
        Ok(self.find_in_snapshot(group_id, |_, m| m.uin == uin).await)
    }

    pub async fn member_by_uid(&self, group_id: &str, uid: &str) -> Result<Option<SessionMember>> {
        let group_id = parse_uin(group_id)?;
        Ok(self.find_in_snapshot(group_id, |key, _| key == uid).await)
    }

    async fn find_in_snapshot(
        &self,
        group_id: u64,
        matches: impl Fn(&str, &SessionMember) -> bool,
    ) -> Option<SessionMember> {
        let members = self.session_snapshot(group_id).await?;
        members
            .into_iter()
            .find(|(uid, member)| matches(uid, member))
            .map(|(_, member)| member)
    }

    /// One snapshot request. A failed code or a dropped callback yields `None`.
    async fn session_snapshot(&self, group_id: u64) -> Option<HashMap<String, SessionMember>> {
        let (tx, rx) = oneshot::channel();
        self.session.fetch_member_snapshot(
            group_id,
            Box::new(move |code, members| {
                let _ = tx.send((code, members));
            }),
        );

        match rx.await {
            Ok((0, members)) => Some(members),
            Ok((code, _)) => {
                log::warn!("Member snapshot of group {} failed with code {}", group_id, code);
                None
            }
            Err(_) => {
                log::warn!("Member snapshot of group {} was never answered", group_id);
                None
            }
        }
    }

    // ─── Cached record helpers ───────────────────────────────────────────────

    fn cached_group(&self, group_id: &str) -> Result<Option<GroupRecord>> {
        Ok(self.groups.group(parse_uin(group_id)?))
    }

    /// Administrator uins of a cached group; empty if the group is not cached.
    pub fn admin_list(&self, group_id: &str, with_owner: bool) -> Result<Vec<u64>> {
        Ok(self
            .cached_group(group_id)?
            .map(|g| g.admin_uins(with_owner))
            .unwrap_or_default())
    }

    pub fn owner(&self, group_id: &str) -> Result<Option<u64>> {
        Ok(self.cached_group(group_id)?.and_then(|g| g.owner()))
    }

    pub fn is_owner(&self, group_id: &str) -> Result<bool> {
        Ok(self
            .cached_group(group_id)?
            .is_some_and(|g| g.is_owned_by(self.self_uin)))
    }

    pub fn is_admin(&self, group_id: &str) -> Result<bool> {
        Ok(self
            .cached_group(group_id)?
            .is_some_and(|g| g.is_administered_by(self.self_uin)))
    }

    // ─── Mutations ───────────────────────────────────────────────────────────

    fn send(&self, command: Command) -> Result<()> {
        log::debug!("Sending {}", command);
        log::trace!("Payload: {}", hex::encode(&command.payload));
        self.transport.send(command)
    }

    pub fn kick(&self, group_id: &str, reject_add_request: bool, members: &[&str]) -> Result<()> {
        let group_id = parse_uin(group_id)?;
        let members = members
            .iter()
            .map(|m| parse_uin(m))
            .collect::<Result<Vec<_>>>()?;
        self.send(protocol::kick_members(group_id, reject_add_request, &members)?)
    }

    /// Mute a member for `duration_secs`; `0` lifts the mute.
    pub fn ban(&self, group_id: &str, member_id: &str, duration_secs: u32) -> Result<()> {
        let command = protocol::ban_member(parse_uin(group_id)?, parse_uin(member_id)?, duration_secs);
        self.send(command)
    }

    pub fn set_admin(&self, group_id: &str, member_id: &str, enable: bool) -> Result<()> {
        self.send(protocol::set_admin(parse_uin(group_id)?, parse_uin(member_id)?, enable))
    }

    pub fn set_whole_mute(&self, group_id: &str, enable: bool) -> Result<()> {
        self.send(protocol::set_whole_mute(parse_uin(group_id)?, enable))
    }

    /// Set a member's special title. The member card is refreshed first to
    /// learn the current display name.
    pub async fn set_unique_title(&self, group_id: &str, member_id: &str, title: &str) -> Result<()> {
        let member = self
            .get_member_info(group_id, member_id, true)
            .await?
            .ok_or_else(|| {
                BridgeError::NotFound(format!("member {} of group {}", member_id, group_id))
            })?;

        self.send(protocol::set_unique_title(
            member.group_id,
            member.member_id,
            member.display_name(),
            title,
        ))
    }

    /// Rename a member's group card.
    pub fn modify_card(&self, group_id: &str, member_id: &str, name: &str) -> Result<()> {
        let req = ModifyCardRequest::rename(parse_uin(group_id)?, parse_uin(member_id)?, name);
        self.legacy.modify_member_card(&req)
    }

    pub fn rename_group(&self, group_id: &str, name: &str) -> Result<()> {
        self.legacy.rename_group(parse_uin(group_id)?, name, false)
    }

    /// Leave a group as the logged-in account.
    pub fn resign(&self, group_id: &str) -> Result<()> {
        let req = GroupManagementRequest::quit(parse_uin(group_id)?, self.self_uin);
        log::info!("Leaving group {}", req.group_id);
        self.legacy.group_management(&req)
    }

    /// Share-link ark text of a group, requested on a cache miss.
    pub async fn share_ark(&self, group_id: &str) -> Result<String> {
        let group_id = parse_uin(group_id)?;
        self.ark_cache
            .request(group_id, || self.send(protocol::join_group_link(group_id)))
            .await
    }

    /// Internal group code used by the legacy refresh paths.
    pub fn group_code(&self, group_id: &str) -> Result<u64> {
        Ok(group_uin_to_code(parse_uin(group_id)?))
    }
}
