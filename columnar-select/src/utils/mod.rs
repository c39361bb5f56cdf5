//! Utils

/// Computing the largest value that is multiple of `base` and less than
/// or equal to size.
///
/// Note that `base` must be power of two. Otherwise, the returned value is incorrect!
#[inline]
pub fn rounddown_to_multiple_of_pow_of_two_base(size: usize, base: usize) -> usize {
    size & !(base - 1)
}

/// Calculate the number of loops
#[inline]
pub fn roundup_loops(len: usize, batch: usize) -> usize {
    len / batch + (len % batch != 0) as usize
}

/// Read a little-endian `u64` from the first 8 bytes of the slice
///
/// # Safety
///
/// `bytes.len() >= 8`
#[inline]
pub(crate) unsafe fn load_u64_le_unchecked(bytes: &[u8]) -> u64 {
    #[cfg(feature = "verify")]
    assert!(bytes.len() >= 8);

    // SAFETY: caller guarantees the slice has at least 8 bytes, the load is unaligned
    u64::from_le(unsafe { std::ptr::read_unaligned(bytes.as_ptr() as *const u64) })
}
