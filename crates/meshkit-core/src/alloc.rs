//! Hash collections backed by AHash.
//!
//! Geometry caches are keyed by small float bit patterns, where AHash is
//! noticeably faster than SipHash.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};
