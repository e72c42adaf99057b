//! Per-user mutual exclusion
//!
//! Every read-modify-write of a user's streak document runs while holding
//! that user's lock. Different users never wait on each other.

use kindle_domain::UserId;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

/// Set of users whose streak document is being rewritten
#[derive(Debug, Default)]
pub(crate) struct UserLocks {
    held: Mutex<HashSet<UserId>>,
    released: Condvar,
}

/// Holds one user's lock until dropped
pub(crate) struct UserGuard<'a> {
    locks: &'a UserLocks,
    user: UserId,
}

impl UserLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Block until `user` is free, then take it
    pub(crate) fn lock(&self, user: UserId) -> UserGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&user) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(user);
        UserGuard { locks: self, user }
    }

    #[cfg(test)]
    fn is_held(&self, user: UserId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user)
    }
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.user);
        self.locks.released.notify_all();
    }
}
