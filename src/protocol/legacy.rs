//! Argument shapes of the pass-through calls on the legacy directory service.
//!
//! These operations are not binary-encoded here; the legacy service builds its
//! own messages. The bridge only pins the fixed values it must carry.

/// Gender sentinel meaning "unchanged".
pub const GENDER_UNCHANGED: i8 = -1;
/// Card flag: only the name is being modified.
pub const CARD_FLAG_NAME: u32 = 1;
/// Group management request type for leaving a group.
pub const GROUP_MNG_QUIT: i32 = 2;

/// One entry of a member card modification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardUinInfo {
    pub uin: u64,
    pub gender: i8,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub remark: String,
    pub flag: u32,
}

/// `friendlist.ModifyGroupCardReq`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModifyCardRequest {
    pub zero: u64,
    pub group_code: u64,
    pub uin_info: Vec<CardUinInfo>,
    pub new_seq: u64,
}

impl ModifyCardRequest {
    /// Rename one member's card; every other card field is left untouched.
    pub fn rename(group_code: u64, uin: u64, name: &str) -> Self {
        Self {
            zero: 0,
            group_code,
            uin_info: vec![CardUinInfo {
                uin,
                gender: GENDER_UNCHANGED,
                name: name.to_string(),
                email: String::new(),
                phone: String::new(),
                remark: String::new(),
                flag: CARD_FLAG_NAME,
            }],
            new_seq: 0,
        }
    }
}

/// `ProfileService.GroupMngReq`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupManagementRequest {
    pub req_type: i32,
    pub group_id: u64,
    pub self_uin: u64,
}

impl GroupManagementRequest {
    pub fn quit(group_id: u64, self_uin: u64) -> Self {
        Self {
            req_type: GROUP_MNG_QUIT,
            group_id,
            self_uin,
        }
    }
}
