//! Convert the selection bitmap into the selection index list

use crate::RowIndex;
use crate::bitmap::iter_ones;

/// Maximum number of rows a block can have, such that every row index fits in [`RowIndex`]
pub const MAX_BLOCK_ROWS: usize = RowIndex::MAX as usize + 1;

/// Append the index of every selected row in `[0, n_rows)` to `out`, in ascending order.
/// Returns the number of appended indices
///
/// Panic if `n_rows > MAX_BLOCK_ROWS` or `sel_bitmap` can not hold `n_rows` bits
pub fn selected_rows(sel_bitmap: &[u8], n_rows: usize, out: &mut Vec<RowIndex>) -> usize {
    assert!(
        n_rows <= MAX_BLOCK_ROWS,
        "block with {n_rows} rows exceeds the maximum: {MAX_BLOCK_ROWS}"
    );

    let old_len = out.len();
    out.extend(iter_ones(sel_bitmap, n_rows).map(|index| index as RowIndex));
    out.len() - old_len
}
