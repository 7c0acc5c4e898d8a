//! Map types for per-instance side tables. Construct them with `default()`.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub type HashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
    pub type HashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;
}
