//! Debug-build registry of live native allocations.
//!
//! Release builds compile every function here down to nothing. Debug builds keep an
//! address-ordered map of live blocks so that byte access outside a live block and
//! frees of unknown addresses fail loudly instead of corrupting memory.

#[cfg(debug_assertions)]
mod live {
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn blocks() -> MutexGuard<'static, BTreeMap<u64, u64>> {
        static BLOCKS: OnceLock<Mutex<BTreeMap<u64, u64>>> = OnceLock::new();
        BLOCKS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(address: u64, size: u64) {
        let prev = blocks().insert(address, size);
        assert!(
            prev.is_none(),
            "native allocator returned live address {address:#x} twice"
        );
    }

    pub fn remove(address: u64) {
        let removed = blocks().remove(&address);
        assert!(
            removed.is_some(),
            "free of {address:#x}: not a live native allocation (double free?)"
        );
    }

    pub fn contains_byte(address: u64) -> bool {
        let blocks = blocks();
        match blocks.range(..=address).next_back() {
            Some((&start, &size)) => address - start < size,
            None => false,
        }
    }
}

#[inline]
pub fn insert(address: u64, size: u64) {
    #[cfg(debug_assertions)]
    live::insert(address, size);
    #[cfg(not(debug_assertions))]
    let _ = (address, size);
}

#[inline]
pub fn remove(address: u64) {
    #[cfg(debug_assertions)]
    live::remove(address);
    #[cfg(not(debug_assertions))]
    let _ = address;
}

#[inline]
pub fn contains_byte(address: u64) -> bool {
    #[cfg(debug_assertions)]
    return live::contains_byte(address);
    #[cfg(not(debug_assertions))]
    {
        let _ = address;
        true
    }
}
