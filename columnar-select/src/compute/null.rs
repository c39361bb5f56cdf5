//! Zero the values under the null rows

use crate::bitmap::{for_each_unset_bit, num_bytes};
use crate::types::CellWidth;
use crate::utils::rounddown_to_multiple_of_pow_of_two_base;

/// Zero out any values in `dst_values_buf` which are indicated as null in `non_null_bitmap`.
///
/// `n_rows` cells are processed, starting at index `dst_idx` within the buffers.
/// `cell_width` indicates the size of each cell in bytes, it must be one of 1, 2, 4, 8
/// and 16. Otherwise, panic.
///
/// NOTE: the buffers must be valid for the full range of indices `[0, dst_idx + n_rows)`,
/// otherwise panic. The implementation may redundantly re-zero cells at indexes less than
/// `dst_idx`, it never touches the cells at or beyond `dst_idx + n_rows`
pub fn zero_null_values(
    cell_width: usize,
    dst_idx: usize,
    n_rows: usize,
    dst_values_buf: &mut [u8],
    non_null_bitmap: &[u8],
) {
    let cell_width = CellWidth::from_raw_or_die(cell_width);
    let end = dst_idx + n_rows;
    assert!(
        dst_values_buf.len() >= end * cell_width.bytes(),
        "values buffer with {} bytes can not hold {} cells of {}",
        dst_values_buf.len(),
        end,
        cell_width
    );
    assert!(
        non_null_bitmap.len() >= num_bytes(end),
        "non-null bitmap with {} bytes can not hold {} rows",
        non_null_bitmap.len(),
        end
    );

    // Delegate to specialized implementations for each cell width. This changes
    // variable-length memsets into single stores
    macro_rules! dispatch {
        ($({$variant:ident, $bytes:expr}),+) => {
            match cell_width {
                $(
                    CellWidth::$variant => zero_null_values_impl::<{ $bytes }>(
                        dst_idx,
                        n_rows,
                        dst_values_buf,
                        non_null_bitmap,
                    ),
                )+
            }
        };
    }

    crate::macros::for_all_cell_widths!(dispatch);
}

#[inline(never)]
fn zero_null_values_impl<const WIDTH: usize>(
    dst_idx: usize,
    n_rows: usize,
    dst_values_buf: &mut [u8],
    non_null_bitmap: &[u8],
) {
    // Start from a byte boundary of the bitmap
    let aligned_dst_idx = rounddown_to_multiple_of_pow_of_two_base(dst_idx, 8);
    let aligned_n_rows = n_rows + (dst_idx - aligned_dst_idx);

    let aligned_values = &mut dst_values_buf[aligned_dst_idx * WIDTH..];
    for_each_unset_bit(
        &non_null_bitmap[aligned_dst_idx / 8..],
        aligned_n_rows,
        |position| {
            // The position here is relative to our aligned bitmap
            aligned_values[position * WIDTH..(position + 1) * WIDTH].fill(0);
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{get_bit, parse};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_zero_null_values_all_widths() {
        let non_null = parse("1011 0110 1100 1");
        let n_rows = 13;
        for width in CellWidth::ALL {
            let width = width.bytes();
            let original = (0..n_rows * width)
                .map(|i| (i % 251) as u8 + 1)
                .collect::<Vec<_>>();
            let mut values = original.clone();
            zero_null_values(width, 0, n_rows, &mut values, &non_null);

            for row in 0..n_rows {
                let cell = &values[row * width..(row + 1) * width];
                if get_bit(&non_null, row) {
                    assert_eq!(cell, &original[row * width..(row + 1) * width]);
                } else {
                    assert!(cell.iter().all(|&b| b == 0), "width: {width}, row: {row}");
                }
            }
        }
    }

    #[test]
    fn test_zero_null_values_with_offset() {
        // Rows [0, 10) are written by previous calls, they are all valid
        let non_null = parse("1111 1111 11 01 0111 1110 1");
        let mut values = (1..=21_u32).flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        // Garbage after the range must be kept
        values.extend_from_slice(&[0xff; 8]);
        zero_null_values(4, 10, 11, &mut values, &non_null);

        let cells = values
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect::<Vec<_>>();
        assert_eq!(
            cells,
            [
                1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0, 12, 0, 14, 15, 16, 17, 18, 19, 0, 21,
                u32::MAX,
                u32::MAX
            ]
        );
    }

    #[test]
    fn test_zero_null_values_never_touch_rows_after_the_range() {
        let non_null = vec![0_u8; 4];
        let mut values = vec![0xab_u8; 32 * 2];
        zero_null_values(2, 3, 9, &mut values, &non_null);
        // Rows before the range may be re-zeroed(same byte of the bitmap)
        assert!(values[..2 * 12].iter().all(|&b| b == 0));
        assert!(values[2 * 12..].iter().all(|&b| b == 0xab));
    }

    #[test]
    fn test_zero_null_values_empty() {
        let non_null = vec![0_u8; 1];
        let mut values = vec![7_u8; 32];
        zero_null_values(16, 1, 0, &mut values, &non_null);
        // Row 0 is in the same aligned group and may be re-zeroed, rows at or after
        // `dst_idx` are untouched
        assert!(values[16..].iter().all(|&b| b == 7));
    }

    #[test]
    fn test_zero_null_values_random() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let width = CellWidth::ALL[rng.gen_range(0..5)].bytes();
            let dst_idx = rng.gen_range(0..100);
            let n_rows = rng.gen_range(0..300);
            let total = dst_idx + n_rows + 5;
            let non_null = (0..num_bytes(total)).map(|_| rng.r#gen()).collect::<Vec<u8>>();
            let original = (0..total * width).map(|_| rng.r#gen()).collect::<Vec<u8>>();
            let mut values = original.clone();
            zero_null_values(width, dst_idx, n_rows, &mut values, &non_null);

            let aligned = dst_idx / 8 * 8;
            for row in 0..total {
                let cell = &values[row * width..(row + 1) * width];
                let expected_zero =
                    row >= aligned && row < dst_idx + n_rows && !get_bit(&non_null, row);
                if expected_zero {
                    assert!(cell.iter().all(|&b| b == 0));
                } else {
                    assert_eq!(cell, &original[row * width..(row + 1) * width]);
                }
            }
        }
    }

    #[test]
    #[should_panic(expected = "bad size: 3")]
    fn test_zero_null_values_bad_width() {
        zero_null_values(3, 0, 1, &mut [0; 3], &[0]);
    }

    #[test]
    #[should_panic(expected = "can not hold")]
    fn test_zero_null_values_short_values() {
        zero_null_values(8, 0, 2, &mut [0; 15], &[0]);
    }
}
