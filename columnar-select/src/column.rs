//! Materialize the selected rows of the column blocks into a caller-owned destination
//!
//! The column decoder produces [`ColumnBlock`]s: the raw values and the validity of the
//! rows in a block. [`ColumnSink`] borrows the destination buffers of the output batch and
//! appends the selected rows of each block to them.

use crate::RowIndex;
use crate::bit_writer::BitWriter;
use crate::bitmap::num_bytes;
use crate::compute::gather::copy_selected_rows;
use crate::compute::non_null::copy_non_null_bitmap;
use crate::compute::null::zero_null_values;
use crate::selection::selected_rows;
use crate::types::CellWidth;

/// A decoded block of a fixed-width column
#[derive(Debug, Clone, Copy)]
pub struct ColumnBlock<'a> {
    cell_width: CellWidth,
    n_rows: usize,
    values: &'a [u8],
    /// None if the column is not nullable
    non_null_bitmap: Option<&'a [u8]>,
}

impl<'a> ColumnBlock<'a> {
    /// Create a new [`ColumnBlock`] with `n_rows` rows
    ///
    /// Panic if the buffers can not hold `n_rows` rows
    pub fn new(
        cell_width: CellWidth,
        n_rows: usize,
        values: &'a [u8],
        non_null_bitmap: Option<&'a [u8]>,
    ) -> Self {
        assert!(
            values.len() >= n_rows * cell_width.bytes(),
            "values with {} bytes can not hold {} cells of {}",
            values.len(),
            n_rows,
            cell_width
        );
        if let Some(bitmap) = non_null_bitmap {
            assert!(
                bitmap.len() >= num_bytes(n_rows),
                "non-null bitmap with {} bytes can not hold {} rows",
                bitmap.len(),
                n_rows
            );
        }

        Self {
            cell_width,
            n_rows,
            values,
            non_null_bitmap,
        }
    }

    /// Width of the cells
    #[inline]
    pub fn cell_width(&self) -> CellWidth {
        self.cell_width
    }

    /// Number of rows in the block
    #[inline]
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Returns true if the block has no rows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Returns true if the column is nullable
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.non_null_bitmap.is_some()
    }
}

/// Destination of the selected rows of a fixed-width column
///
/// Rows are appended to the buffers. The rows that have been appended are never modified by
/// the following appends, except that the cells of null rows may be zeroed again
#[derive(Debug)]
pub struct ColumnSink<'a> {
    cell_width: CellWidth,
    values: &'a mut [u8],
    /// None if the column is not nullable
    non_null_bitmap: Option<&'a mut [u8]>,
    num_rows: usize,
}

impl<'a> ColumnSink<'a> {
    /// Create an empty [`ColumnSink`] that writes to the given buffers
    #[inline]
    pub fn new(
        cell_width: CellWidth,
        values: &'a mut [u8],
        non_null_bitmap: Option<&'a mut [u8]>,
    ) -> Self {
        Self::with_num_rows(cell_width, values, non_null_bitmap, 0)
    }

    /// Create a [`ColumnSink`] whose buffers already hold `num_rows` rows, the new rows are
    /// appended after them
    ///
    /// Panic if the buffers can not hold `num_rows` rows
    pub fn with_num_rows(
        cell_width: CellWidth,
        values: &'a mut [u8],
        non_null_bitmap: Option<&'a mut [u8]>,
        num_rows: usize,
    ) -> Self {
        let sink = Self {
            cell_width,
            values,
            non_null_bitmap,
            num_rows,
        };
        assert!(
            num_rows <= sink.capacity(),
            "sink with capacity {} can not hold {} rows",
            sink.capacity(),
            num_rows
        );
        sink
    }

    /// Number of rows that have been written to the buffers
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Maximum number of rows the buffers can hold
    #[inline]
    pub fn capacity(&self) -> usize {
        let values_capacity = self.values.len() / self.cell_width.bytes();
        match &self.non_null_bitmap {
            Some(bitmap) => values_capacity.min(bitmap.len() * 8),
            None => values_capacity,
        }
    }

    /// Append the rows of `block` that are selected in `sel_bitmap` to the sink. Returns the
    /// number of appended rows.
    ///
    /// The validity bitmap is compacted first, then the cells are gathered, the cells of the
    /// appended null rows are zeroed at last. `scratch` is used to hold the selected row
    /// indices, it is cleared before use.
    ///
    /// Panic if:
    ///
    /// - the block and the sink have different cell widths
    ///
    /// - the block is nullable but the sink is not
    ///
    /// - the sink does not have enough capacity for the selected rows
    pub fn append_selected(
        &mut self,
        block: &ColumnBlock<'_>,
        sel_bitmap: &[u8],
        scratch: &mut Vec<RowIndex>,
    ) -> usize {
        assert_eq!(
            block.cell_width, self.cell_width,
            "can not append block of {} cells to sink of {} cells",
            block.cell_width, self.cell_width
        );
        assert!(
            !block.is_nullable() || self.non_null_bitmap.is_some(),
            "can not append nullable block to non-nullable sink"
        );

        scratch.clear();
        let num_selected = selected_rows(sel_bitmap, block.n_rows, scratch);
        assert!(
            self.num_rows + num_selected <= self.capacity(),
            "sink with {} rows and capacity {} can not append {} rows",
            self.num_rows,
            self.capacity(),
            num_selected
        );

        let dst_idx = self.num_rows;
        let width = self.cell_width.bytes();

        if let Some(dst_bitmap) = self.non_null_bitmap.as_deref_mut() {
            match block.non_null_bitmap {
                Some(src_bitmap) => copy_non_null_bitmap(
                    src_bitmap,
                    sel_bitmap,
                    dst_idx,
                    block.n_rows,
                    dst_bitmap,
                ),
                None => set_valid(dst_bitmap, dst_idx, num_selected),
            }
        }

        copy_selected_rows(scratch, width, block.values, &mut self.values[dst_idx * width..]);

        // Only the nullable block could produce null rows
        if let Some(dst_bitmap) = self
            .non_null_bitmap
            .as_deref()
            .filter(|_| block.is_nullable())
        {
            zero_null_values(width, dst_idx, num_selected, self.values, dst_bitmap);
        }

        self.num_rows += num_selected;

        tracing::trace!(
            "Append {}/{} rows of block with {} cells, sink has {} rows",
            num_selected,
            block.n_rows,
            self.cell_width,
            self.num_rows
        );

        num_selected
    }
}

/// Mark rows `[dst_idx, dst_idx + len)` of the bitmap as valid
fn set_valid(bitmap: &mut [u8], dst_idx: usize, len: usize) {
    let mut writer = BitWriter::new(bitmap, dst_idx);
    let mut remain = len;
    while remain > 0 {
        let num_bits = remain.min(64);
        writer.put(u64::MAX, num_bits);
        remain -= num_bits;
    }
    writer.flush();
}
