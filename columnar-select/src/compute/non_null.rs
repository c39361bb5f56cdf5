//! Compact the non-null bitmap with the selection bitmap

use super::pext::{Pext, PextMethod, pext_method};
use crate::bit_writer::BitWriter;
use crate::bitmap::num_bytes;
use crate::utils::load_u64_le_unchecked;

/// Copy the bits of the selected rows from `non_null_bitmap` into `dst_non_null_bitmap`.
///
/// Row `i` in `[0, n_rows)` is selected if bit `i` of `sel_bitmap` is set. The validity
/// bits of the selected rows are written contiguously, in the original order, starting at
/// bit `dst_idx` of the destination. Bits before `dst_idx` are preserved, exactly
/// `count_ones(sel_bitmap, n_rows)` bits are written.
///
/// Bits are extracted with the [`pext_method`] of this process.
///
/// Panic if the source bitmaps can not hold `n_rows` bits or the destination can not hold
/// the written bits
pub fn copy_non_null_bitmap(
    non_null_bitmap: &[u8],
    sel_bitmap: &[u8],
    dst_idx: usize,
    n_rows: usize,
    dst_non_null_bitmap: &mut [u8],
) {
    let method = pext_method();
    check_source_bitmaps(non_null_bitmap, sel_bitmap, n_rows);

    // SAFETY: the method is detected on this cpu, the sources are checked above
    unsafe {
        copy_non_null_bitmap_impl_with(
            method,
            non_null_bitmap,
            sel_bitmap,
            dst_idx,
            n_rows,
            dst_non_null_bitmap,
        )
    }
}

/// Same as [`copy_non_null_bitmap`], but the bits are extracted with the given `method`.
///
/// Panic if the method is not supported by the cpu
pub fn copy_non_null_bitmap_with(
    method: PextMethod,
    non_null_bitmap: &[u8],
    sel_bitmap: &[u8],
    dst_idx: usize,
    n_rows: usize,
    dst_non_null_bitmap: &mut [u8],
) {
    assert!(
        method.is_supported(),
        "pext method `{method}` is not supported by the cpu"
    );
    check_source_bitmaps(non_null_bitmap, sel_bitmap, n_rows);

    // SAFETY: the method is supported, the sources are checked above
    unsafe {
        copy_non_null_bitmap_impl_with(
            method,
            non_null_bitmap,
            sel_bitmap,
            dst_idx,
            n_rows,
            dst_non_null_bitmap,
        )
    }
}

#[inline]
fn check_source_bitmaps(non_null_bitmap: &[u8], sel_bitmap: &[u8], n_rows: usize) {
    let required = num_bytes(n_rows);
    assert!(
        non_null_bitmap.len() >= required && sel_bitmap.len() >= required,
        "source bitmaps with {} and {} bytes can not hold {} rows",
        non_null_bitmap.len(),
        sel_bitmap.len(),
        n_rows
    );
}

/// # Safety
///
/// - The cpu must support the target features required by `P`
///
/// - `non_null_bitmap` and `sel_bitmap` have at least `num_bytes(n_rows)` bytes
#[inline(always)]
unsafe fn copy_non_null_bitmap_impl<P: Pext>(
    non_null_bitmap: &[u8],
    sel_bitmap: &[u8],
    dst_idx: usize,
    n_rows: usize,
    dst_non_null_bitmap: &mut [u8],
) {
    #[cfg(feature = "verify")]
    assert!(non_null_bitmap.len() >= num_bytes(n_rows) && sel_bitmap.len() >= num_bytes(n_rows));

    let mut writer = BitWriter::new(dst_non_null_bitmap, dst_idx);

    let num_64bit_words = n_rows / 64;
    for i in 0..num_64bit_words {
        // SAFETY: the bitmaps have at least `num_64bit_words * 8` bytes
        let (sel_mask, non_nulls) = unsafe {
            (
                load_u64_le_unchecked(sel_bitmap.get_unchecked(i * 8..)),
                load_u64_le_unchecked(non_null_bitmap.get_unchecked(i * 8..)),
            )
        };
        // SAFETY: caller guarantees the target features
        let extracted = unsafe { P::pext(non_nulls, sel_mask) };
        writer.put(extracted, sel_mask.count_ones() as usize);
    }

    // Remaining rows are processed one byte at a time. The selection bits of the last byte
    // that exceed `n_rows` are ignored
    let mut rem_rows = n_rows % 64;
    let mut byte_index = num_64bit_words * 8;
    while rem_rows > 0 {
        // SAFETY: `byte_index < num_bytes(n_rows)`
        let (mut sel_mask, non_nulls) = unsafe {
            (
                *sel_bitmap.get_unchecked(byte_index) as u64,
                *non_null_bitmap.get_unchecked(byte_index) as u64,
            )
        };
        if rem_rows < 8 {
            sel_mask &= (1 << rem_rows) - 1;
        }

        // SAFETY: caller guarantees the target features
        let extracted = unsafe { P::pext(non_nulls, sel_mask) };
        writer.put(extracted, sel_mask.count_ones() as usize);

        byte_index += 1;
        rem_rows = rem_rows.saturating_sub(8);
    }
    writer.flush();
}

crate::macros::pext_func!(
    copy_non_null_bitmap_impl,
    (
        non_null_bitmap: &[u8],
        sel_bitmap: &[u8],
        dst_idx: usize,
        n_rows: usize,
        dst_non_null_bitmap: &mut [u8]
    )
);
