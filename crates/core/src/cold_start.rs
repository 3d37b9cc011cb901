use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static PROCESS_COLD_START: OnceLock<ColdStart> = OnceLock::new();

/// A cold-start flag that is `true` until first consumed.
///
/// Clones share the same flag. `process()` hands out the flag that lives for
/// the whole execution environment; `new()` creates an independent one.
#[derive(Debug, Clone)]
pub struct ColdStart(Arc<AtomicBool>);

impl ColdStart {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn process() -> Self {
        PROCESS_COLD_START.get_or_init(ColdStart::new).clone()
    }

    /// Returns whether this is the cold start and flips the flag off.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    pub fn is_cold(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for ColdStart {
    fn default() -> Self {
        Self::new()
    }
}
