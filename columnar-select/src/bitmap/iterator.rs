//! Iterator of the bitmap

use std::iter::FusedIterator;

use super::{BIT_STORE_BITS, BitStore, get_bit, load_bit_store_unchecked, num_bytes};
use crate::utils::roundup_loops;

#[derive(Debug)]
/// Iterator of the bitmap
pub struct BitmapIter<'a> {
    bitmap: &'a [u8],
    bit_index: usize,
    end: usize,
}

impl<'a> BitmapIter<'a> {
    /// Create a new iterator of the first `num_bits` bits of the bitmap
    pub fn new(bitmap: &'a [u8], num_bits: usize) -> Self {
        assert!(bitmap.len() >= num_bytes(num_bits));
        Self {
            bitmap,
            bit_index: 0,
            end: num_bits,
        }
    }
}

impl Iterator for BitmapIter<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.bit_index == self.end {
            return None;
        }

        let old = self.bit_index;
        self.bit_index += 1;
        Some(get_bit(self.bitmap, old))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.end - self.bit_index;
        (size, Some(size))
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        let new_index = self.bit_index + n;
        if new_index >= self.end {
            self.bit_index = self.end;
            None
        } else {
            self.bit_index = new_index;
            self.next()
        }
    }
}

impl ExactSizeIterator for BitmapIter<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.end - self.bit_index
    }
}

impl FusedIterator for BitmapIter<'_> {}

/// Iterator of the index that is set in the bitmap
#[derive(Debug)]
pub struct BitmapOnesIter<'a> {
    bitmap: &'a [u8],
    num_bits: usize,
    current: BitStore,
    bit_store_index: usize,
    num_bit_stores: usize,
}

impl<'a> BitmapOnesIter<'a> {
    /// Create a new [`BitmapOnesIter`] of the first `num_bits` bits of the bitmap
    pub fn new(bitmap: &'a [u8], num_bits: usize) -> Self {
        assert!(bitmap.len() >= num_bytes(num_bits));
        let num_bit_stores = roundup_loops(num_bits, BIT_STORE_BITS);
        let current = if num_bit_stores == 0 {
            0
        } else {
            // SAFETY: this branch guarantees the bitmap at least have one BitStore
            unsafe { load_bit_store_unchecked(bitmap, 0, num_bits) }
        };
        Self {
            bitmap,
            num_bits,
            current,
            bit_store_index: 0,
            num_bit_stores,
        }
    }
}

impl Iterator for BitmapOnesIter<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while self.current == 0 {
            if self.bit_store_index + 1 >= self.num_bit_stores {
                self.bit_store_index = self.num_bit_stores;
                return None;
            }
            self.bit_store_index += 1;

            // SAFETY: bit_store_index < num_bit_stores, length checked in constructor
            self.current = unsafe {
                load_bit_store_unchecked(self.bitmap, self.bit_store_index, self.num_bits)
            };
        }

        let index =
            (self.bit_store_index * BIT_STORE_BITS) + self.current.trailing_zeros() as usize;

        self.current &= self.current - 1;
        Some(index)
    }
}

impl FusedIterator for BitmapOnesIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::parse;

    #[test]
    fn test_bitmap_iter() {
        let bitmap = parse("1101 0001 1");
        let bits = BitmapIter::new(&bitmap, 9).collect::<Vec<_>>();
        assert_eq!(
            bits,
            [true, true, false, true, false, false, false, true, true]
        );

        let mut iter = BitmapIter::new(&bitmap, 9);
        assert_eq!(iter.nth(7), Some(true));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.nth(3), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_ones_iter() {
        let bitmap = [0xff_u8; 20];
        assert!(BitmapOnesIter::new(&bitmap, 0).next().is_none());
        // Bits beyond the length are ignored, even in the first BitStore
        assert_eq!(BitmapOnesIter::new(&bitmap, 3).collect::<Vec<_>>(), [0, 1, 2]);

        let mut bitmap = vec![0_u8; 20];
        [1, 63, 64, 65, 130, 150, 159]
            .into_iter()
            .for_each(|index| crate::bitmap::set_bit(&mut bitmap, index, true));
        assert_eq!(
            BitmapOnesIter::new(&bitmap, 159).collect::<Vec<_>>(),
            [1, 63, 64, 65, 130, 150]
        );
        assert_eq!(
            BitmapOnesIter::new(&bitmap, 160).collect::<Vec<_>>(),
            [1, 63, 64, 65, 130, 150, 159]
        );
    }

    #[test]
    fn test_ones_iter_skips_empty_bit_stores() {
        let mut bitmap = vec![0_u8; 40];
        crate::bitmap::set_bit(&mut bitmap, 300, true);
        let mut iter = BitmapOnesIter::new(&bitmap, 320);
        assert_eq!(iter.next(), Some(300));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }
}
