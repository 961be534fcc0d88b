//! Page replacement policies.

mod lru;
mod lru_k;

pub use {
    lru::LruReplacer,
    lru_k::{LruKConfig, LruKReplacer},
};
