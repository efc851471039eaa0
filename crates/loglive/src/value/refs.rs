//! Shared, interior-mutable storage for arrays and objects

use std::mem::ManuallyDrop;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::stack::ensure_sufficient_stack;

/// A reference-counted, lock-protected cell.
///
/// JS containers have reference semantics: cloning a `Shared` clones the
/// handle, not the contents. Poisoned locks are recovered rather than
/// propagated, since a panicking reader cannot leave a `Vec` or map in an
/// unsound state.
///
/// Containers can nest arbitrarily deep, so releasing the last handle grows
/// the stack as needed.
pub struct Shared<T>(ManuallyDrop<Arc<RwLock<T>>>);

impl<T> Shared<T> {
    /// Wrap a value in a new cell.
    pub fn new(value: T) -> Self {
        Self(ManuallyDrop::new(Arc::new(RwLock::new(value))))
    }

    /// Acquire a read guard.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Acquire a write guard.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&*self.0, &*other.0)
    }

    /// Identity of the cell, for cycle detection.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&*self.0) as *const () as usize
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(ManuallyDrop::new(Arc::clone(&*self.0)))
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        // SAFETY: the handle is never touched again after this call
        let cell = unsafe { ManuallyDrop::take(&mut self.0) };
        ensure_sufficient_stack(move || drop(cell));
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_contents() {
        let a = Shared::new(vec![1]);
        let b = a.clone();
        b.write().push(2);
        assert_eq!(*a.read(), vec![1, 2]);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_distinct_cells() {
        let a = Shared::new(0);
        let b = Shared::new(0);
        assert!(!a.ptr_eq(&b));
    }

    struct Nest(Option<Shared<Nest>>);

    #[test]
    fn test_deep_nesting_drops() {
        let mut outer = Shared::new(Nest(None));
        for _ in 0..500_000 {
            outer = Shared::new(Nest(Some(outer)));
        }
        drop(outer);
    }

    #[test]
    fn test_last_handle_releases_contents() {
        let inner = Arc::new(());
        let a = Shared::new(Arc::clone(&inner));
        let b = a.clone();
        drop(a);
        assert_eq!(Arc::strong_count(&inner), 2);
        drop(b);
        assert_eq!(Arc::strong_count(&inner), 1);
    }
}
