//! Types of the cells stored in the value buffer

use std::fmt::Display;

use snafu::{Snafu, ensure};

/// Error returned when converting an unsupported number of bytes into [`CellWidth`]
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[snafu(display("bad size: {width}. Cell width must be one of 1, 2, 4, 8 or 16 bytes"))]
pub struct UnsupportedCellWidthError {
    width: usize,
}

impl UnsupportedCellWidthError {
    /// The rejected width
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }
}

/// Width of a single cell in the value buffer, in bytes
///
/// The value buffer only stores fixed-width cells: `i8` to `i128`, floats, intervals, etc.
/// Cell `i` occupies bytes `[i * width, (i + 1) * width)` of the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellWidth {
    /// 1 byte: `i8`, `u8`, `bool`
    W1 = 1,
    /// 2 bytes: `i16`, `u16`
    W2 = 2,
    /// 4 bytes: `i32`, `u32`, `f32`
    W4 = 4,
    /// 8 bytes: `i64`, `u64`, `f64`
    W8 = 8,
    /// 16 bytes: `i128`, decimals, intervals
    W16 = 16,
}

impl CellWidth {
    /// All of the supported widths, in ascending order
    pub const ALL: [CellWidth; 5] = [Self::W1, Self::W2, Self::W4, Self::W8, Self::W16];

    /// Number of bytes of the cell
    #[inline]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Convert the raw width into [`CellWidth`]. Unsupported width is a programming error
    /// upstream(schema validation should reject it), therefore it panics
    #[inline]
    pub(crate) fn from_raw_or_die(width: usize) -> Self {
        match Self::try_from(width) {
            Ok(width) => width,
            Err(err) => panic!("{err}"),
        }
    }
}

impl TryFrom<usize> for CellWidth {
    type Error = UnsupportedCellWidthError;

    #[inline]
    fn try_from(width: usize) -> Result<Self, Self::Error> {
        ensure!(width.is_power_of_two() && width <= 16, UnsupportedCellWidthSnafu { width });
        Ok(match width {
            1 => Self::W1,
            2 => Self::W2,
            4 => Self::W4,
            8 => Self::W8,
            _ => Self::W16,
        })
    }
}

impl Display for CellWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes", self.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_width_try_from() {
        for width in CellWidth::ALL {
            assert_eq!(CellWidth::try_from(width.bytes()).unwrap(), width);
        }

        for width in [0, 3, 5, 6, 7, 12, 32, 64] {
            let err = CellWidth::try_from(width).unwrap_err();
            assert_eq!(err.width(), width);
        }
    }

    #[test]
    fn test_unsupported_width_display() {
        let err = CellWidth::try_from(3).unwrap_err();
        expect_test::expect!["bad size: 3. Cell width must be one of 1, 2, 4, 8 or 16 bytes"]
            .assert_eq(&err.to_string());
    }

    #[test]
    #[should_panic(expected = "bad size: 32")]
    fn test_from_raw_or_die() {
        CellWidth::from_raw_or_die(32);
    }
}
