//! Ports (interfaces) for the application layer.
//!
//! Ports define the interfaces the application layer needs; infrastructure
//! adapters implement them. This keeps the admission logic independent of
//! the concrete clock and map implementations.

use std::fmt::Debug;
use std::hash::Hash;

/// Port for obtaining current time.
///
/// Lets the admission path work with time without depending on the system
/// clock. Infrastructure provides `SystemClock` for production and
/// `MockClock` for deterministic tests.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> std::time::Instant;
}

/// Port for concurrent key-value storage.
///
/// Backs the per-logger bucket map. The entry accessor hands out exclusive
/// mutable access, which is what serializes consults of a single bucket.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Iterate over all entries, providing access to both key and value.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);
}
