//! Public group number → internal group code.
//!
//! Older refresh paths of the directory subsystem address groups by an internal
//! "group code" rather than the public group number. The mapping works on the
//! millions band of the number: while the band falls inside one of the fixed
//! ranges below it is shifted down, re-testing from the top of the table after
//! every shift. The lower six digits are carried through untouched.

const BAND: u64 = 1_000_000;

/// `(low, high, base)`: band range is `[base + low, base + high]`, shift is `base - low`.
const BAND_TABLE: [(u64, u64, u64); 7] = [
    (0, 10, 202),
    (11, 19, 480),
    (20, 66, 2100),
    (67, 156, 2010),
    (157, 209, 2147),
    (210, 309, 4100),
    (310, 499, 3800),
];

/// Coarse band of a public group number.
pub fn band_of(group_uin: u64) -> u64 {
    group_uin / BAND
}

/// Shift applicable to `band`, if any row of the table matches.
fn band_shift(band: u64) -> Option<u64> {
    BAND_TABLE
        .iter()
        .find(|(low, high, base)| band >= base + low && band <= base + high)
        .map(|(low, _, base)| base - low)
}

/// Convert a public group number into the internal group code.
pub fn group_uin_to_code(group_uin: u64) -> u64 {
    let mut band = band_of(group_uin);
    // Every shift is positive, so the loop terminates.
    while let Some(shift) = band_shift(band) {
        band -= shift;
    }
    band * BAND + group_uin % BAND
}
