//! Stable block and span keys.
//!
//! Keys combine the wall-clock millisecond with a process-wide counter and a
//! random suffix, so two keys minted in the same millisecond still differ.

use std::sync::atomic::{AtomicU64, Ordering};

use smol_str::{SmolStr, format_smolstr};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Mint a fresh key.
pub fn new_key() -> SmolStr {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0xff_ffff;
    let suffix: u16 = rand::random();
    format_smolstr!("{millis:x}{count:06x}{suffix:04x}")
}

/// Mint a key for which `taken` returns false.
pub fn new_key_excluding(taken: impl Fn(&str) -> bool) -> SmolStr {
    loop {
        let key = new_key();
        if !taken(&key) {
            return key;
        }
    }
}
