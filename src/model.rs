//! Group and member records as reported by the directory subsystem.
//!
//! The bridge never creates these; it reads them from the subsystem's cache and
//! derives a few facts (administrators, owner, freshness) from them.

use serde::{Deserialize, Serialize};

/// A group as cached by the directory subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Public group number.
    pub group_id: u64,
    /// Internal group code. Blank until the subsystem has populated the record.
    pub group_code: String,
    pub name: String,
    /// Owner uin as the subsystem stores it (decimal text, may be blank).
    pub owner_uin: String,
    /// Administrator uins, `|` or `,` delimited.
    pub administrators: String,
    /// Whether the logged-in account administers this group.
    pub self_is_admin: bool,
    pub whole_mute: bool,
    pub member_count: u32,
}

impl GroupRecord {
    /// Internal code and owner are both present.
    ///
    /// Callers additionally need the subsystem's cache-initialized flag before
    /// trusting the record; see `GroupDirectory::get_group_info`.
    pub fn is_populated(&self) -> bool {
        !self.group_code.trim().is_empty() && !self.owner_uin.trim().is_empty()
    }

    pub fn owner(&self) -> Option<u64> {
        self.owner_uin.trim().parse().ok().filter(|uin| *uin != 0)
    }

    /// Administrator uins, optionally with the owner first.
    ///
    /// Blank and unparsable entries are skipped.
    pub fn admin_uins(&self, with_owner: bool) -> Vec<u64> {
        let owner = if with_owner { self.owner() } else { None };
        owner
            .into_iter()
            .chain(
                self.administrators
                    .split(['|', ','])
                    .filter_map(|s| s.trim().parse::<u64>().ok()),
            )
            .filter(|uin| *uin != 0)
            .collect()
    }

    pub fn is_owned_by(&self, uin: u64) -> bool {
        self.owner() == Some(uin)
    }

    /// `uin` is the logged-in account: it administers the group if the subsystem
    /// says so or if it owns it.
    pub fn is_administered_by(&self, uin: u64) -> bool {
        self.self_is_admin || self.is_owned_by(uin)
    }
}

/// A group member as cached by the directory subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub group_id: u64,
    pub member_id: u64,
    /// Group nickname. `None` until the subsystem has fetched the member card.
    pub nickname: Option<String>,
    /// Remark / card name.
    pub remark: String,
    pub friend_nick: String,
    pub special_title: String,
    /// Honor ids, `|` delimited.
    pub honor: String,
    pub in_cache: bool,
}

impl MemberRecord {
    /// Display name used as the "uin name" of a title change: nickname, or the
    /// remark when the nickname is blank.
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(nick) if !nick.trim().is_empty() => nick,
            _ => &self.remark,
        }
    }
}

/// A member as returned by the session service snapshot, keyed by uid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMember {
    pub uid: String,
    pub uin: u64,
    pub nick: String,
    pub card_name: String,
}

impl SessionMember {
    /// Partial member record: the snapshot carries names only.
    pub fn into_member_record(self, group_id: u64) -> MemberRecord {
        MemberRecord {
            group_id,
            member_id: self.uin,
            nickname: Some(self.card_name),
            friend_nick: self.nick,
            ..Default::default()
        }
    }
}

/// Parse a `|` delimited honor list. Blank and malformed entries are dropped.
pub fn parse_honor(honor: Option<&str>) -> Vec<i32> {
    honor
        .unwrap_or_default()
        .split('|')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}
