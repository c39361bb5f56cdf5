//! # ColumnarSelect
//!
//! `ColumnarSelect` compacts the rows of a fixed-width column. Given the values of a column,
//! its validity(non-null) bitmap and a description of the rows to keep, it writes the kept
//! rows contiguously into caller-owned destination buffers:
//!
//! - [`copy_non_null_bitmap`] compacts the validity bitmap with a selection bitmap
//!
//! - [`copy_selected_rows`] gathers the cells of the selected rows
//!
//! - [`zero_null_values`] clears the cells that are null, such that the garbage under the
//!   null rows never leaks to the consumer
//!
//! All of the bitmaps in this crate are byte slices, bits are packed LSB-first within each
//! byte. The crate never allocates buffers for the caller, destinations are always provided
//! by the caller and may already contain rows written by previous calls.
//!
//! # Run
//!
//! Compacting the bitmap needs to extract the bits selected by a mask from a word, the
//! `pext` operation. The implementation is chosen once per process based on the features of
//! the cpu, see [`pext_method`]. All of the implementations produce identical results.
//!
//! [`copy_non_null_bitmap`]: crate::compute::non_null::copy_non_null_bitmap
//! [`copy_selected_rows`]: crate::compute::gather::copy_selected_rows
//! [`zero_null_values`]: crate::compute::null::zero_null_values
//! [`pext_method`]: crate::compute::pext::pext_method

pub mod bit_writer;
pub mod bitmap;
pub mod column;
pub mod compute;
mod macros;
pub mod selection;
pub mod types;
pub mod utils;

pub use self::compute::gather::copy_selected_rows;
pub use self::compute::non_null::{copy_non_null_bitmap, copy_non_null_bitmap_with};
pub use self::compute::null::zero_null_values;
pub use self::compute::pext::{PextMethod, available_pext_methods, pext_method};
pub use self::types::CellWidth;

/// Index of the row in a block, it belongs to the range [0..65535(u16::MAX)]. Blocks
/// produced by the column decoder never exceed this length
pub type RowIndex = u16;
