//! Stable short hashes of precise symbol identifiers.

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1 hash of `precise_identifier`, XOR-folded to 24 bits and base-36 encoded.
///
/// The result is what authors write after the `-` in a hash disambiguation
/// suffix, so it must never change for a given identifier.
pub fn stable_hash_string(precise_identifier: &str) -> String {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in precise_identifier.bytes() {
        hash = hash.wrapping_mul(FNV_PRIME);
        hash ^= u32::from(byte);
    }
    let folded = (hash >> 24) ^ (hash & 0x00FF_FFFF);
    to_base36(folded)
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
