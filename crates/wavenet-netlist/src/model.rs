use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A set of known compact-model keys, queried by membership only.
pub trait ModelRegistry {
    fn contains_model(&self, key: &str) -> bool;
}

impl ModelRegistry for HashSet<String> {
    fn contains_model(&self, key: &str) -> bool {
        self.contains(key)
    }
}

/// Compact models known to the circuit simulator, stored as lower-case
/// `library::component` or `design kits::technology::component` keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompactModelRegistry {
    keys: HashSet<String>,
}

impl CompactModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn insert(&mut self, key: &str) {
        self.keys.insert(key.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ModelRegistry for CompactModelRegistry {
    fn contains_model(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Registry key for a component's compact model.
///
/// With a library: `library::component`, where `/` in the library path
/// becomes `::`. Without one the component is looked up in the technology's
/// design kit: `design kits::technology::component`. Always lower-case.
pub fn model_key(library: Option<&str>, component: &str, technology: &str) -> String {
    match library.filter(|l| !l.is_empty()) {
        Some(library) => format!(
            "{}::{}",
            library.to_lowercase().replace('/', "::"),
            component.to_lowercase()
        ),
        None => format!(
            "design kits::{}::{}",
            technology.to_lowercase(),
            component.to_lowercase()
        ),
    }
}
