//! Fatal growth of long-lived buffers.

/// Grows `v` to at least `len` elements filled with `fill`; never shrinks.
pub fn ensure_len<T: Clone>(v: &mut Vec<T>, len: usize, fill: T, what: &str) {
    ensure_len_with(v, len, || fill.clone(), what);
}

/// Like [`ensure_len`], producing new elements with `f`.
///
/// Capacity at least doubles on each reallocation. Allocation failure is fatal: it is
/// logged with `what` and then panics.
pub fn ensure_len_with<T>(v: &mut Vec<T>, len: usize, f: impl FnMut() -> T, what: &str) {
    if v.len() >= len {
        return;
    }
    let extra = len - v.len();
    let reserve = if len > v.capacity() { extra.max(v.capacity()) } else { extra };
    if let Err(e) = v.try_reserve_exact(reserve) {
        log::error!(
            target: "mesh",
            "failed to allocate {} ({} elements of {} bytes): {}",
            what,
            len,
            std::mem::size_of::<T>(),
            e
        );
        panic!("out of memory allocating {what} ({len} elements)");
    }
    v.resize_with(len, f);
}
