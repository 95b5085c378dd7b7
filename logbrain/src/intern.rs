use ahash::AHashSet;
use std::sync::Arc;

/// Content-addressed string pool. Token values repeat across the whole
/// batch, so interning collapses them to shared allocations and lets
/// equality take the pointer fast-path.
#[derive(Debug, Default)]
pub struct Interner {
    pool: AHashSet<Arc<str>>,
}

impl Interner {
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.pool.get(s) {
            return Arc::clone(existing);
        }
        let handle: Arc<str> = Arc::from(s);
        self.pool.insert(Arc::clone(&handle));
        handle
    }
}
