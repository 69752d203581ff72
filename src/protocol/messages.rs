//! Structured (protobuf) bodies of the group-management commands.
//!
//! Only the fields this bridge writes or reads are declared; unknown fields in
//! inbound bodies are skipped by the decoder.

/// `OidbSvc.0x8fc` request: set member special titles.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SpecialTitleReq {
    #[prost(uint64, optional, tag = "1")]
    pub group_code: Option<u64>,
    #[prost(message, repeated, tag = "3")]
    pub member_level_info: Vec<MemberLevelInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MemberLevelInfo {
    #[prost(uint64, optional, tag = "1")]
    pub uin: Option<u64>,
    #[prost(bytes = "vec", optional, tag = "5")]
    pub special_title: Option<Vec<u8>>,
    /// Seconds since epoch; `u32::MAX` (-1 as int32) never expires.
    #[prost(uint32, optional, tag = "6")]
    pub special_title_expire_time: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub uin_name: Option<Vec<u8>>,
}

/// `OidbSvc.0x89a` request: modify group settings.
#[derive(Clone, PartialEq, prost::Message)]
pub struct GroupSettingReq {
    #[prost(uint64, optional, tag = "1")]
    pub group_code: Option<u64>,
    #[prost(message, optional, tag = "2")]
    pub group_info: Option<GroupSetting>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GroupSetting {
    /// Whole-group mute end; `0` lifts the mute.
    #[prost(uint32, optional, tag = "17")]
    pub shutup_time: Option<u32>,
}

/// `OidbSvc.0x8a0` request: remove members.
#[derive(Clone, PartialEq, prost::Message)]
pub struct KickMemberReq {
    #[prost(uint64, optional, tag = "1")]
    pub group_code: Option<u64>,
    #[prost(message, repeated, tag = "2")]
    pub kick_list: Vec<KickMemberInfo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct KickMemberInfo {
    #[prost(uint32, optional, tag = "1")]
    pub operate: Option<u32>,
    #[prost(uint64, optional, tag = "2")]
    pub member_uin: Option<u64>,
    /// `1` rejects future join requests from the member.
    #[prost(uint32, optional, tag = "3")]
    pub flag: Option<u32>,
}

/// `GroupSvc.JoinGroupLink` request.
#[derive(Clone, PartialEq, prost::Message)]
pub struct JoinGroupLinkReq {
    #[prost(bool, optional, tag = "1")]
    pub get_ark: Option<bool>,
    #[prost(uint32, optional, tag = "2")]
    pub link_type: Option<u32>,
    #[prost(uint64, optional, tag = "3")]
    pub group_code: Option<u64>,
}

/// `GroupSvc.JoinGroupLink` response, delivered as an inbound event.
#[derive(Clone, PartialEq, prost::Message)]
pub struct JoinGroupLinkRsp {
    #[prost(uint64, optional, tag = "1")]
    pub group_code: Option<u64>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub signed_ark: Option<Vec<u8>>,
}
