//! Outbound command encoder.
//!
//! Each mutating group operation becomes a [`Command`]: a service name, a
//! command code, a sub-command code and an encoded body. Encoding is pure; the
//! transport takes it from there.
//!
//! Fixed binary layouts (all big-endian):
//! ```text
//! set admin:  [group_id: 4][member_id: 4][flag: 1]
//! ban member: [group_id: 4][tag 0x20: 1][count 0x0001: 2][member_id: 4][duration_secs: 4]
//! ```
use bytes::{BufMut, Bytes, BytesMut};
use prost::Message;

use super::messages::{
    GroupSetting, GroupSettingReq, JoinGroupLinkReq, KickMemberInfo, KickMemberReq,
    MemberLevelInfo, SpecialTitleReq,
};
use crate::error::{BridgeError, Result};

// ─── Service names and codes ─────────────────────────────────────────────────

pub const SVC_SPECIAL_TITLE: &str = "OidbSvc.0x8fc_2";
pub const SVC_SET_ADMIN: &str = "OidbSvc.0x55c_1";
pub const SVC_GROUP_SETTING: &str = "OidbSvc.0x89a_0";
pub const SVC_BAN_MEMBER: &str = "OidbSvc.0x570_8";
pub const SVC_KICK_MEMBER: &str = "OidbSvc.0x8a0_0";
pub const SVC_JOIN_GROUP_LINK: &str = "GroupSvc.JoinGroupLink";

/// Whole-group mute duration meaning "until lifted".
pub const WHOLE_MUTE_FOREVER: u32 = 268_435_455;
/// Special title expiry meaning "never" (-1 as int32).
pub const TITLE_NEVER_EXPIRES: u32 = u32::MAX;
/// Operate code of a kick entry.
pub const KICK_OPERATE: u32 = 5;

const BAN_TAG: u8 = 32;
const BAN_COUNT: u16 = 1;
/// Ban layout: group(4) + tag(1) + count(2) + member(4) + duration(4)
pub const BAN_PAYLOAD_LEN: usize = 15;
/// Admin layout: group(4) + member(4) + flag(1)
pub const ADMIN_PAYLOAD_LEN: usize = 9;

/// An encoded outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub service: &'static str,
    /// OIDB command code; `0` for plain packets.
    pub command: u32,
    pub sub_command: u32,
    pub payload: Bytes,
}

impl Command {
    fn oidb(service: &'static str, command: u32, sub_command: u32, payload: Bytes) -> Self {
        Self {
            service,
            command,
            sub_command,
            payload,
        }
    }

    /// A packet sent under its service name with no OIDB wrapping.
    fn packet(service: &'static str, payload: Bytes) -> Self {
        Self::oidb(service, 0, 0, payload)
    }

    pub fn is_oidb(&self) -> bool {
        self.command != 0
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (0x{:x}_{}, {} bytes)",
            self.service,
            self.command,
            self.sub_command,
            self.payload.len()
        )
    }
}

/// Parse a decimal uin / group number as received from callers.
pub fn parse_uin(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| BridgeError::InvalidArgument(format!("'{}' is not a valid uin: {}", raw, e)))
}

fn encode_pb<M: Message>(msg: &M) -> Bytes {
    Bytes::from(msg.encode_to_vec())
}

/// Set (or clear, with an empty title) a member's special title.
pub fn set_unique_title(group_id: u64, member_uin: u64, uin_name: &str, title: &str) -> Command {
    let req = SpecialTitleReq {
        group_code: Some(group_id),
        member_level_info: vec![MemberLevelInfo {
            uin: Some(member_uin),
            uin_name: Some(uin_name.as_bytes().to_vec()),
            special_title: Some(title.as_bytes().to_vec()),
            special_title_expire_time: Some(TITLE_NEVER_EXPIRES),
        }],
    };
    Command::oidb(SVC_SPECIAL_TITLE, 0x8fc, 2, encode_pb(&req))
}

/// Grant or revoke administrator. Identifiers are truncated to 32 bits.
pub fn set_admin(group_id: u64, member_uin: u64, enable: bool) -> Command {
    let mut buf = BytesMut::with_capacity(ADMIN_PAYLOAD_LEN);
    buf.put_u32(group_id as u32);
    buf.put_u32(member_uin as u32);
    buf.put_u8(u8::from(enable));
    Command::oidb(SVC_SET_ADMIN, 0x55c, 1, buf.freeze())
}

pub fn set_whole_mute(group_id: u64, enable: bool) -> Command {
    let req = GroupSettingReq {
        group_code: Some(group_id),
        group_info: Some(GroupSetting {
            shutup_time: Some(if enable { WHOLE_MUTE_FOREVER } else { 0 }),
        }),
    };
    Command::oidb(SVC_GROUP_SETTING, 0x89a, 0, encode_pb(&req))
}

/// Mute one member for `duration_secs`; `0` lifts the mute.
pub fn ban_member(group_id: u64, member_uin: u64, duration_secs: u32) -> Command {
    let mut buf = BytesMut::with_capacity(BAN_PAYLOAD_LEN);
    buf.put_u32(group_id as u32);
    buf.put_u8(BAN_TAG);
    buf.put_u16(BAN_COUNT);
    buf.put_u32(member_uin as u32);
    buf.put_u32(duration_secs);
    Command::oidb(SVC_BAN_MEMBER, 0x570, 8, buf.freeze())
}

/// Remove members; `reject_add_request` also blocks their future join requests.
pub fn kick_members(group_id: u64, reject_add_request: bool, members: &[u64]) -> Result<Command> {
    if members.is_empty() {
        return Err(BridgeError::InvalidArgument(
            "kick requires at least one member".into(),
        ));
    }
    let req = KickMemberReq {
        group_code: Some(group_id),
        kick_list: members
            .iter()
            .map(|uin| KickMemberInfo {
                operate: Some(KICK_OPERATE),
                member_uin: Some(*uin),
                flag: Some(u32::from(reject_add_request)),
            })
            .collect(),
    };
    Ok(Command::oidb(SVC_KICK_MEMBER, 0x8a0, 0, encode_pb(&req)))
}

/// Ask for the group's share-link ark; the answer arrives as an inbound event.
pub fn join_group_link(group_id: u64) -> Command {
    let req = JoinGroupLinkReq {
        get_ark: Some(true),
        link_type: Some(1),
        group_code: Some(group_id),
    };
    Command::packet(SVC_JOIN_GROUP_LINK, encode_pb(&req))
}
