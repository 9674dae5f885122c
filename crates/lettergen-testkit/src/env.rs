//! Environment isolation utilities for testing

use std::sync::Mutex;

/// Static mutex to serialize tests that modify environment variables
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with `key` set to `value` (or unset for `None`), then restore it
pub fn with_env_var<F, R>(key: &str, value: Option<&str>, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let original = std::env::var_os(key);

    // SAFETY: ENV_LOCK is held, so no other test touches the environment
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }

    let result = f();

    // SAFETY: still holding ENV_LOCK
    unsafe {
        match original {
            Some(original) => std::env::set_var(key, original),
            None => std::env::remove_var(key),
        }
    }

    result
}
