#![no_main]
use arbitrary::Arbitrary;
use groupbridge::protocol;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    group_id: u64,
    member_id: u64,
    duration: u32,
    enable: bool,
    title: String,
    members: Vec<u64>,
}

fuzz_target!(|input: Input| {
    let ban = protocol::ban_member(input.group_id, input.member_id, input.duration);
    assert_eq!(ban.payload.len(), protocol::command::BAN_PAYLOAD_LEN);

    let admin = protocol::set_admin(input.group_id, input.member_id, input.enable);
    assert_eq!(admin.payload.len(), protocol::command::ADMIN_PAYLOAD_LEN);

    let _ = protocol::set_unique_title(input.group_id, input.member_id, &input.title, &input.title);
    let _ = protocol::set_whole_mute(input.group_id, input.enable);

    // Only an empty kick list is rejected
    let kick = protocol::kick_members(input.group_id, input.enable, &input.members);
    assert_eq!(kick.is_err(), input.members.is_empty());

    let _ = protocol::parse_uin(&input.title);
});
