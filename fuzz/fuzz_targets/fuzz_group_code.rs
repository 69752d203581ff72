#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|group_uin: u64| {
    // Must terminate for every input and be stable once reduced.
    let code = groupbridge::group_uin_to_code(group_uin);
    assert_eq!(groupbridge::group_uin_to_code(code), code);
    assert_eq!(code % 1_000_000, group_uin % 1_000_000);
    assert!(code <= group_uin);
});
