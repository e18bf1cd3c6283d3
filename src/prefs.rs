//! Persistent preference storage interface.

use core::fmt::Write;
use heapless::String;

/// Longest key the store is asked to handle.
pub const MAX_KEY_LEN: usize = 16;

/// Preference key buffer.
pub type PrefKey = String<MAX_KEY_LEN>;

/// Keyed scalar storage that survives power loss.
///
/// Implement this over your flash/NVS driver. A missing key yields the
/// supplied default. Write failures are the implementation's concern; the
/// core treats every `put` as fire-and-forget.
pub trait PreferenceStore {
    /// Reads a signed byte.
    fn get_i8(&mut self, key: &str, default: i8) -> i8;
    /// Writes a signed byte.
    fn put_i8(&mut self, key: &str, value: i8);

    /// Reads an unsigned byte.
    fn get_u8(&mut self, key: &str, default: u8) -> u8;
    /// Writes an unsigned byte.
    fn put_u8(&mut self, key: &str, value: u8);

    /// Reads a float.
    fn get_f32(&mut self, key: &str, default: f32) -> f32;
    /// Writes a float.
    fn put_f32(&mut self, key: &str, value: f32);

    /// Reads a boolean.
    fn get_bool(&mut self, key: &str, default: bool) -> bool;
    /// Writes a boolean.
    fn put_bool(&mut self, key: &str, value: bool);
}

/// Joins a prefix and suffix into a key, e.g. `"alarm1"` + `"Hour"`.
///
/// Returns `None` when the result does not fit in [`MAX_KEY_LEN`].
pub fn compose_key(prefix: &str, suffix: &str) -> Option<PrefKey> {
    let mut key = PrefKey::new();
    write!(key, "{}{}", prefix, suffix).ok()?;
    Some(key)
}

/// Writes `value` only when it differs from what is stored under `key`.
///
/// Returns true if a write happened.
pub(crate) fn sync_f32<S: PreferenceStore>(store: &mut S, key: &str, value: f32) -> bool {
    // NaN never equals anything, so a missing key always counts as changed.
    if store.get_f32(key, f32::NAN) != value {
        store.put_f32(key, value);
        true
    } else {
        false
    }
}
