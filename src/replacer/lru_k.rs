//! LRU-K page replacement algorithm.
//!
//! The algorithm implemented here is based on the [LRU-K paper](https://dl.acm.org/doi/10.1145/170036.170081),
//! restricted to a logical clock: accesses are timestamped by a counter
//! that advances once per recorded access, so the backward k-distance of a
//! frame is measured in elapsed accesses rather than wall time.

use {
    crate::{EvictError, EvictResult, EvictionPolicy, FrameId, util::LogicalClock},
    parking_lot::RwLock,
    std::{
        collections::{HashMap, VecDeque},
        sync::Arc,
    },
};

/// Configuration of the LRU-K replacer.
#[derive(Debug, Clone)]
pub struct LruKConfig {
    /// Number of frames the replacer watches over. Valid frame ids are
    /// `0..num_frames`.
    pub num_frames: usize,

    /// Number of most recent page accesses to keep track of per frame.
    pub k: usize,
}

impl Default for LruKConfig {
    fn default() -> Self {
        Self {
            num_frames: 4096,
            k: 2,
        }
    }
}

/// Access bookkeeping for a single frame.
#[derive(Debug)]
struct FrameInfo {
    /// Timestamps of up to the `k` most recent accesses, oldest in front.
    ///
    /// Never empty: a frame record is only created by the access that
    /// registers it.
    history: VecDeque<u64>,

    /// Whether the frame may be selected for eviction. Frames start out
    /// pinned; the owner unpins them once no task uses the frame.
    evictable: bool,
}

impl FrameInfo {
    fn new(k: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(k),
            evictable: false,
        }
    }

    /// Appends an access timestamp, keeping only the `k` most recent.
    ///
    /// With the history capped at `k` entries, the front of the queue is
    /// the k-th most recent access whenever the frame has at least `k` of
    /// them.
    fn record(&mut self, timestamp: u64, k: usize) {
        self.history.push_back(timestamp);
        if self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Oldest retained access timestamp.
    fn oldest(&self) -> u64 {
        self.history.front().copied().unwrap_or_default()
    }
}

/// Implements the LRU-K page replacement algorithm.
///
/// The replacer evicts the evictable frame with the largest backward
/// k-distance: the number of accesses elapsed since the frame's k-th most
/// recent access, or infinity for frames referenced fewer than `k` times.
/// Ties, which arise among the infinitely distant frames, are broken
/// towards the earliest retained access, so frames lacking full history
/// degrade to plain LRU on their first reference.
pub struct LruKReplacer {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    /// Configuration of the replacer.
    config: LruKConfig,

    /// Number of evictable frames in the replacer.
    size: usize,

    /// Mapping of frame ids to per-frame access bookkeeping. An entry
    /// exists for every frame touched since its last removal.
    frames: HashMap<FrameId, FrameInfo>,

    /// Monotonically increasing sequence of access timestamps.
    clock: LogicalClock,
}

impl Default for LruKReplacer {
    fn default() -> Self {
        Self::with_config(LruKConfig::default())
    }
}

impl LruKReplacer {
    /// Creates a new LRU-K replacer watching over frames `0..num_frames`,
    /// with a per-frame history of the `k` most recent accesses.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(num_frames: usize, k: usize) -> Self {
        Self::with_config(LruKConfig { num_frames, k })
    }

    /// Creates a new LRU-K replacer with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.k` is zero.
    pub fn with_config(config: LruKConfig) -> Self {
        assert!(config.k >= 1, "k must be at least 1");
        Self {
            inner: Arc::new(RwLock::new(Inner {
                size: 0,
                frames: HashMap::with_capacity(config.num_frames),
                clock: LogicalClock::new(),
                config,
            })),
        }
    }

    fn check_frame_id(inner: &Inner, id: FrameId) -> EvictResult<()> {
        if id >= inner.config.num_frames {
            return Err(EvictError::InvalidFrameId(id));
        }
        Ok(())
    }

    /// Flips the pin state of a frame, adjusting the evictable count on an
    /// actual transition only.
    ///
    /// Pinning or unpinning a frame that has no record is allowed and does
    /// nothing: the frame will register as pinned on its first touch.
    fn set_evictable(inner: &mut Inner, id: FrameId, evictable: bool) -> EvictResult<()> {
        Self::check_frame_id(inner, id)?;

        if let Some(frame) = inner.frames.get_mut(&id) {
            if frame.evictable != evictable {
                frame.evictable = evictable;
                if evictable {
                    inner.size += 1;
                } else {
                    inner.size -= 1;
                }
            }
        }
        Ok(())
    }

    /// Selects the eviction victim among the evictable frames.
    fn victim(inner: &Inner) -> Option<FrameId> {
        let now = inner.clock.now();
        let mut best: Option<(u64, u64, FrameId)> = None;

        for (&id, frame) in &inner.frames {
            if !frame.evictable {
                continue;
            }

            // Backward k-distance of the frame. Frames with fewer than `k`
            // recorded accesses are infinitely distant.
            let oldest = frame.oldest();
            let k_distance = if frame.history.len() < inner.config.k {
                u64::MAX
            } else {
                now - oldest
            };

            let better = match best {
                None => true,
                Some((best_distance, best_oldest, _)) => {
                    k_distance > best_distance
                        || (k_distance == best_distance && oldest < best_oldest)
                }
            };
            if better {
                best = Some((k_distance, oldest, id));
            }
        }

        best.map(|(_, _, id)| id)
    }
}

impl EvictionPolicy for LruKReplacer {
    type Error = EvictError;

    fn evict(&self) -> Option<FrameId> {
        let mut inner = self.inner.write();
        let id = Self::victim(&inner)?;
        inner.frames.remove(&id);
        inner.size -= 1;
        Some(id)
    }

    fn peek(&self) -> Option<FrameId> {
        Self::victim(&self.inner.read())
    }

    fn touch(&self, id: FrameId) -> EvictResult<()> {
        let mut inner = self.inner.write();
        Self::check_frame_id(&inner, id)?;

        let timestamp = inner.clock.tick();
        let k = inner.config.k;
        inner
            .frames
            .entry(id)
            .or_insert_with(|| FrameInfo::new(k))
            .record(timestamp, k);
        Ok(())
    }

    fn pin(&self, id: FrameId) -> EvictResult<()> {
        Self::set_evictable(&mut self.inner.write(), id, false)
    }

    fn unpin(&self, id: FrameId) -> EvictResult<()> {
        Self::set_evictable(&mut self.inner.write(), id, true)
    }

    fn remove(&self, id: FrameId) -> EvictResult<()> {
        let mut inner = self.inner.write();

        if let Some(frame) = inner.frames.get(&id) {
            if !frame.evictable {
                return Err(EvictError::PinnedFrameRemoval(id));
            }
            inner.frames.remove(&id);
            inner.size -= 1;
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.inner.read().config.num_frames
    }

    fn size(&self) -> usize {
        self.inner.read().size
    }
}
