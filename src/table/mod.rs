//! Key/value indexing structures.

mod extendible;

pub use extendible::ExtendibleHashTable;
