//! Poison-aware locking
//!
//! A panic while a guard is held leaves the lock poisoned. Callers get an
//! [`Error::Internal`] naming the guarded state instead of a second panic.

use crate::error::{Error, Result};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn poisoned(context: &str, access: &str) -> Error {
    Error::internal(format!("{context} unavailable: {access} after a panicked holder"))
}

/// Acquire `lock`, mapping poisoning to an internal error
pub fn lock_mutex<'a, T>(lock: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
    lock.lock().map_err(|_| poisoned(context, "mutex"))
}

/// Shared access to `lock`
pub fn lock_rwlock_read<'a, T>(
    lock: &'a RwLock<T>,
    context: &str,
) -> Result<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| poisoned(context, "shared read"))
}

/// Exclusive access to `lock`
pub fn lock_rwlock_write<'a, T>(
    lock: &'a RwLock<T>,
    context: &str,
) -> Result<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| poisoned(context, "exclusive write"))
}
