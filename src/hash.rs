//! Hierarchical namehash (EIP-137) and keccak-derived token identifiers.

use alloy::primitives::{keccak256, B256, U256};

/// Suffix appended to every handle by the namehash converter.
pub const DEFAULT_SUFFIX: &str = "base.eth";

/// Hash of a single label: `keccak256(utf8(label))`.
pub fn label_hash(label: &str) -> B256 {
    keccak256(label.as_bytes())
}

/// Compute the namehash of a dotted name.
///
/// The name is lower-cased and split on `.`; labels are folded from the
/// top-level one down: `node = keccak256(node || keccak256(label))`,
/// starting from 32 zero bytes. No other normalisation is applied, so
/// non-ASCII input is hashed exactly as given (after case folding).
/// The empty string maps to the zero node.
pub fn namehash(name: &str) -> B256 {
    if name.is_empty() {
        return B256::ZERO;
    }

    let lowered = name.to_lowercase();
    let mut node = B256::ZERO;
    let mut buf = [0u8; 64];
    for label in lowered.rsplit('.') {
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash(label).as_slice());
        node = keccak256(buf);
    }
    node
}

/// Join a handle with its parent name: `john` + `base.eth` = `john.base.eth`.
pub fn full_name(handle: &str, suffix: &str) -> String {
    format!("{}.{}", handle, suffix)
}

/// Format a node as `0x` followed by 64 lowercase hex digits.
pub fn node_hex(node: &B256) -> String {
    format!("0x{}", hex::encode(node))
}

/// Token identifier of a name: keccak256 of its exact UTF-8 bytes read as
/// a big-endian unsigned integer. Case-sensitive.
pub fn token_id(name: &str) -> U256 {
    U256::from_be_bytes(keccak256(name.as_bytes()).0)
}
