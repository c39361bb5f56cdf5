//! Gather the cells of the selected rows

use crate::RowIndex;
use crate::types::CellWidth;

/// Copy the cells of `sel_rows` from `src_buf` to the front of `dst_buf`, contiguously and
/// in the order of `sel_rows`. Duplicated and non-ascending indices are allowed.
///
/// `cell_width` indicates the size of each cell in bytes, it must be one of 1, 2, 4, 8
/// and 16. Otherwise, panic.
///
/// It is a pure gather: the validity is not referenced, zero the null values with
/// [`zero_null_values`] afterward if it is required
///
/// Panic if `dst_buf` can not hold `sel_rows.len()` cells or an index is out of `src_buf`
///
/// [`zero_null_values`]: crate::compute::null::zero_null_values
pub fn copy_selected_rows(
    sel_rows: &[RowIndex],
    cell_width: usize,
    src_buf: &[u8],
    dst_buf: &mut [u8],
) {
    let cell_width = CellWidth::from_raw_or_die(cell_width);
    assert!(
        dst_buf.len() >= sel_rows.len() * cell_width.bytes(),
        "destination with {} bytes can not hold {} cells of {}",
        dst_buf.len(),
        sel_rows.len(),
        cell_width
    );

    macro_rules! dispatch {
        ($({$variant:ident, $bytes:expr}),+) => {
            match cell_width {
                $(
                    CellWidth::$variant => {
                        copy_selected_rows_impl::<{ $bytes }>(sel_rows, src_buf, dst_buf)
                    }
                )+
            }
        };
    }

    crate::macros::for_all_cell_widths!(dispatch);
}

#[inline(never)]
fn copy_selected_rows_impl<const WIDTH: usize>(
    sel_rows: &[RowIndex],
    src_buf: &[u8],
    dst_buf: &mut [u8],
) {
    dst_buf
        .chunks_exact_mut(WIDTH)
        .zip(sel_rows)
        .for_each(|(dst, &index)| {
            let start = index as usize * WIDTH;
            dst.copy_from_slice(&src_buf[start..start + WIDTH]);
        });
}
