pub mod command;
pub mod legacy;
pub mod messages;

pub use command::{
    ban_member, join_group_link, kick_members, parse_uin, set_admin, set_unique_title,
    set_whole_mute, Command, SVC_JOIN_GROUP_LINK, TITLE_NEVER_EXPIRES, WHOLE_MUTE_FOREVER,
};
pub use legacy::{CardUinInfo, GroupManagementRequest, ModifyCardRequest};
pub use messages::JoinGroupLinkRsp;
