//! The trait events implement to be stored in a history.

/// An immutable event that can be stored in an [`EventMemoryManager`].
///
/// Ids must be unique per history; they are used to de-duplicate events that
/// live in both the ring buffer and the critical store. Timestamps order the
/// merged view returned by [`EventMemoryManager::all_events`].
///
/// [`EventMemoryManager`]: crate::EventMemoryManager
/// [`EventMemoryManager::all_events`]: crate::EventMemoryManager::all_events
pub trait Recordable: Clone {
    /// Unique id of the event.
    fn id(&self) -> u64;

    /// Creation time in Unix milliseconds.
    fn timestamp(&self) -> u64;

    /// Whether the event is exempt from ordinary eviction.
    fn is_critical(&self) -> bool;

    /// Heap bytes owned by the event, on top of its inline size.
    ///
    /// Used only for the memory estimate in [`MemoryStats`]. Defaults to 0.
    ///
    /// [`MemoryStats`]: crate::MemoryStats
    fn heap_size(&self) -> usize {
        0
    }
}
