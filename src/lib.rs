#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(elided_lifetimes_in_paths)]

mod error;
pub mod replacer;
pub mod table;
mod util;

use std::error::Error;

pub use {
    error::{EvictError, EvictResult},
    replacer::{LruKConfig, LruKReplacer, LruReplacer},
    table::ExtendibleHashTable,
};

/// Frame identifier type.
///
/// Conceptually, a replacement policy watches over a fixed-size array of
/// frames, where each frame is a container holding some page of data. The
/// frame identifier is an index into this array: a replacer of capacity `n`
/// accepts identifiers `0..n` and rejects anything beyond.
pub type FrameId = usize;

/// Page eviction policy.
///
/// Defines an interface for interacting with different page replacement
/// strategies. At its core, it provides methods for logging page accesses,
/// managing per-frame pin state, and eventually locating the next frame to
/// evict.
///
/// Only non-pinned frames are eviction candidates. The pin state a frame
/// starts out in is policy-specific: [`LruKReplacer`] registers frames
/// pinned until explicitly unpinned, while [`LruReplacer`] only ever
/// tracks evictable frames.
pub trait EvictionPolicy {
    /// Error type for the eviction policy.
    type Error: Error;

    /// Finds the next frame to be evicted and evicts it.
    ///
    /// Only non-pinned frames are candidates for eviction. A successful
    /// eviction removes the frame and its access history from the policy
    /// and decreases [`size`](EvictionPolicy::size) by one. Returns `None`
    /// when no evictable frame exists.
    fn evict(&self) -> Option<FrameId>;

    /// Peeks into the next frame to be evicted.
    ///
    /// Selects with the same rules as [`evict`](EvictionPolicy::evict) but
    /// removes nothing.
    fn peek(&self) -> Option<FrameId>;

    /// Notifies the policy that the page held by the frame has been
    /// referenced, updating the frame's access history with the current
    /// timestamp.
    ///
    /// A first `touch` registers the frame with the policy.
    fn touch(&self, id: FrameId) -> Result<(), Self::Error>;

    /// Pins a frame, marking it as non-evictable.
    ///
    /// Pinning an already pinned or unregistered frame has no effect.
    fn pin(&self, id: FrameId) -> Result<(), Self::Error>;

    /// Unpins a frame, marking it as evictable.
    ///
    /// Unpinning an already evictable frame has no effect.
    fn unpin(&self, id: FrameId) -> Result<(), Self::Error>;

    /// Removes an evictable frame.
    ///
    /// In contrast to [`evict`](EvictionPolicy::evict), this removes an
    /// arbitrary non-pinned frame, not necessarily the one with the highest
    /// eviction priority. Removing a pinned frame is an error.
    fn remove(&self, id: FrameId) -> Result<(), Self::Error>;

    /// Returns the number of frames the policy watches over, i.e. the
    /// exclusive upper bound on accepted frame identifiers.
    fn capacity(&self) -> usize;

    /// The number of frames that can be evicted right now, i.e. the number
    /// of non-pinned frames.
    fn size(&self) -> usize;
}
