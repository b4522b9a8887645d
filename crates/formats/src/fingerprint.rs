/// Content fingerprint of a data blob (blake3).
pub fn fingerprint(bytes: &[u8]) -> [u8; 32] {
    *blake3::hash(bytes).as_bytes()
}

pub fn fingerprint_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
