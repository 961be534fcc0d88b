use {
    crate::{EvictError, EvictResult, EvictionPolicy, FrameId, util::LogicalClock},
    parking_lot::RwLock,
    priority_queue::PriorityQueue,
    std::{cmp::Reverse, sync::Arc},
};

type Priority = Reverse<u64>;
type Frames = PriorityQueue<FrameId, Priority>;

/// Least Recently Used (LRU) frame replacer.
///
/// Keeps the evictable frames in a priority queue ordered by their last
/// access time; `evict` pops the least recently used one. Unlike
/// [`LruKReplacer`](crate::LruKReplacer), this policy tracks evictable
/// frames only: pinning a frame forgets its access history, and unpinning
/// re-enters the frame as the most recently used one.
pub struct LruReplacer {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    /// Number of frames the replacer watches over.
    capacity: usize,

    /// Evictable frames, ordered by last access.
    frames: Frames,

    /// Source of access timestamps.
    clock: LogicalClock,
}

impl Inner {
    /// Registers an access to `id`, inserting the frame into the queue or
    /// refreshing its position when already present. Both cases are
    /// handled by `PriorityQueue::push`.
    fn push(&mut self, id: FrameId) -> EvictResult<()> {
        if id >= self.capacity {
            return Err(EvictError::InvalidFrameId(id));
        }

        let timestamp = self.clock.tick();
        self.frames.push(id, Reverse(timestamp));
        Ok(())
    }
}

impl LruReplacer {
    /// Creates a new LRU replacer watching over frames `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                capacity,
                frames: PriorityQueue::with_capacity(capacity),
                clock: LogicalClock::new(),
            })),
        }
    }
}

impl EvictionPolicy for LruReplacer {
    type Error = EvictError;

    fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.write();
        inner.frames.pop().map(|(frame_id, _)| frame_id)
    }

    fn peek(&self) -> Option<FrameId> {
        let inner = self.inner.read();
        inner.frames.peek().map(|(frame_id, _)| *frame_id)
    }

    fn touch(&self, id: FrameId) -> EvictResult<()> {
        self.inner.write().push(id)
    }

    fn pin(&self, id: FrameId) -> EvictResult<()> {
        // A pinned frame simply leaves the queue; pinning a frame that is
        // not in the queue has no effect.
        let mut inner = self.inner.write();
        inner.frames.remove(&id);

        Ok(())
    }

    fn unpin(&self, id: FrameId) -> EvictResult<()> {
        let mut inner = self.inner.write();

        // Only insert if the frame is not already in the queue: unpinning
        // an already evictable frame must not refresh its position.
        if inner.frames.get(&id).is_none() {
            inner.push(id)?;
        }
        Ok(())
    }

    fn remove(&self, id: FrameId) -> EvictResult<()> {
        let removed = self.inner.write().frames.remove(&id);
        if removed.is_none() {
            return Err(EvictError::PinnedFrameRemoval(id));
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.inner.read().capacity
    }

    fn size(&self) -> usize {
        self.inner.read().frames.len()
    }
}
