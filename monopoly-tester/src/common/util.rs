use std::hash::Hasher;

use serde::Serialize;
use twox_hash::XxHash64;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Stable hash of a value's JSON form, for comparing runs.
///
/// # Errors
///
/// Fails if the value cannot be serialized.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<u64> {
    let bytes = serde_json::to_vec(value)?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    Ok(hasher.finish())
}
