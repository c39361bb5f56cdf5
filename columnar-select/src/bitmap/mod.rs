//! Bitmap
//!
//! Bitmaps in this crate are plain byte slices with a separate length in bits. Bit `i` is
//! stored in byte `i / 8` at bit position `i % 8`(LSB-first). It is the layout used by the
//! validity bitmap and the selection bitmap of the column blocks

use crate::utils::{load_u64_le_unchecked, roundup_loops};

mod iterator;

pub use self::iterator::{BitmapIter, BitmapOnesIter};

/// Word that bitmaps are scanned with
pub type BitStore = u64;
/// Number of bits the bit store contains
pub const BIT_STORE_BITS: usize = std::mem::size_of::<BitStore>() * 8;

/// Compute the number of bytes to store the required number of bits
#[inline]
pub fn num_bytes(num_bits: usize) -> usize {
    roundup_loops(num_bits, 8)
}

/// Get the given bit, panic if the index is out of the bitmap
#[inline]
pub fn get_bit(bitmap: &[u8], index: usize) -> bool {
    bitmap[index / 8] & (1 << (index % 8)) != 0
}

/// Set the given bit, panic if the index is out of the bitmap
#[inline]
pub fn set_bit(bitmap: &mut [u8], index: usize, val: bool) {
    let byte = &mut bitmap[index / 8];
    let mask = 1 << (index % 8);
    if val {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
}

/// Load the `word_index`th [`BitStore`] of the bitmap that has `num_bits` live bits. Bits
/// that do not belong to the bitmap are cleared
///
/// # Safety
///
/// - `word_index * BIT_STORE_BITS < num_bits`
///
/// - `bitmap.len() >= num_bytes(num_bits)`
#[inline]
pub(crate) unsafe fn load_bit_store_unchecked(
    bitmap: &[u8],
    word_index: usize,
    num_bits: usize,
) -> BitStore {
    #[cfg(feature = "verify")]
    assert!(word_index * BIT_STORE_BITS < num_bits && bitmap.len() >= num_bytes(num_bits));

    let start = word_index * 8;
    let live = num_bits - word_index * BIT_STORE_BITS;
    if live >= BIT_STORE_BITS {
        // SAFETY: the bitmap has 8 bytes starting at `start`
        unsafe { load_u64_le_unchecked(bitmap.get_unchecked(start..)) }
    } else {
        // Last BitStore, only remain the valid data
        let len = num_bytes(live);
        let mut bytes = [0_u8; 8];
        // SAFETY: `start + len <= num_bytes(num_bits) <= bitmap.len()`
        bytes[..len].copy_from_slice(unsafe { bitmap.get_unchecked(start..start + len) });
        BitStore::from_le_bytes(bytes) & ((1 << live) - 1)
    }
}

/// Mask of the live bits in the `word_index`th [`BitStore`]
#[inline]
fn live_mask(word_index: usize, num_bits: usize) -> BitStore {
    let live = num_bits - word_index * BIT_STORE_BITS;
    if live >= BIT_STORE_BITS {
        BitStore::MAX
    } else {
        (1 << live) - 1
    }
}

/// Count the number of ones in the first `num_bits` bits of the bitmap
pub fn count_ones(bitmap: &[u8], num_bits: usize) -> usize {
    assert!(
        bitmap.len() >= num_bytes(num_bits),
        "bitmap with {} bytes can not hold {} bits",
        bitmap.len(),
        num_bits
    );

    (0..roundup_loops(num_bits, BIT_STORE_BITS))
        // SAFETY: length is checked above
        .map(|word_index| unsafe { load_bit_store_unchecked(bitmap, word_index, num_bits) })
        .map(|word| word.count_ones() as usize)
        .sum()
}

/// Invoke the `func` with the index of each unset bit in the first `num_bits` bits of the
/// bitmap, in ascending order
pub fn for_each_unset_bit(bitmap: &[u8], num_bits: usize, mut func: impl FnMut(usize)) {
    assert!(
        bitmap.len() >= num_bytes(num_bits),
        "bitmap with {} bytes can not hold {} bits",
        bitmap.len(),
        num_bits
    );

    for word_index in 0..roundup_loops(num_bits, BIT_STORE_BITS) {
        // SAFETY: length is checked above
        let word = unsafe { load_bit_store_unchecked(bitmap, word_index, num_bits) };
        let mut unset = !word & live_mask(word_index, num_bits);
        let base = word_index * BIT_STORE_BITS;
        while unset != 0 {
            func(base + unset.trailing_zeros() as usize);
            unset &= unset - 1;
        }
    }
}

/// Get the iterator that produce bool
#[inline]
pub fn iter(bitmap: &[u8], num_bits: usize) -> BitmapIter<'_> {
    BitmapIter::new(bitmap, num_bits)
}

/// Get the iterator that produce the index that is set
#[inline]
pub fn iter_ones(bitmap: &[u8], num_bits: usize) -> BitmapOnesIter<'_> {
    BitmapOnesIter::new(bitmap, num_bits)
}

/// Render the bitmap as `0`/`1` characters, row 0 first
#[cfg(test)]
pub(crate) fn render(bitmap: &[u8], num_bits: usize) -> String {
    iter(bitmap, num_bits)
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}

/// Build a bitmap from `0`/`1` characters, row 0 first. Other characters are ignored
#[cfg(test)]
pub(crate) fn parse(bits: &str) -> Vec<u8> {
    let bits = bits
        .chars()
        .filter(|c| matches!(c, '0' | '1'))
        .collect::<Vec<_>>();
    let mut bitmap = vec![0; num_bytes(bits.len())];
    bits.iter()
        .enumerate()
        .for_each(|(index, &c)| set_bit(&mut bitmap, index, c == '1'));
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set_bit() {
        let mut bitmap = vec![0_u8; 2];
        set_bit(&mut bitmap, 0, true);
        set_bit(&mut bitmap, 9, true);
        set_bit(&mut bitmap, 15, true);
        assert_eq!(bitmap, [0x01, 0x82]);
        assert!(get_bit(&bitmap, 9));
        assert!(!get_bit(&bitmap, 10));

        set_bit(&mut bitmap, 9, false);
        assert_eq!(bitmap, [0x01, 0x80]);
    }

    #[test]
    fn test_count_ones() {
        assert_eq!(count_ones(&[], 0), 0);

        let bitmap = [0xff_u8; 17];
        assert_eq!(count_ones(&bitmap, 136), 136);
        assert_eq!(count_ones(&bitmap, 65), 65);
        assert_eq!(count_ones(&bitmap, 13), 13);

        // Bits beyond `num_bits` are ignored
        let bitmap = [0b1010_1010_u8, 0xff];
        assert_eq!(count_ones(&bitmap, 5), 2);
        assert_eq!(count_ones(&bitmap, 9), 5);
    }

    #[test]
    #[should_panic(expected = "can not hold")]
    fn test_count_ones_out_of_bounds() {
        count_ones(&[0; 1], 9);
    }

    #[test]
    fn test_for_each_unset_bit() {
        let mut bitmap = vec![0xff_u8; 10];
        set_bit(&mut bitmap, 3, false);
        set_bit(&mut bitmap, 64, false);
        set_bit(&mut bitmap, 70, false);
        set_bit(&mut bitmap, 77, false);

        let mut unset = Vec::new();
        for_each_unset_bit(&bitmap, 75, |index| unset.push(index));
        assert_eq!(unset, [3, 64, 70]);

        let mut unset = Vec::new();
        for_each_unset_bit(&bitmap, 0, |index| unset.push(index));
        assert!(unset.is_empty());
    }

    #[test]
    fn test_render_and_parse() {
        let bitmap = parse("1011 0000 1");
        assert_eq!(bitmap, [0b0000_1101, 0b1]);
        expect_test::expect!["101100001"].assert_eq(&render(&bitmap, 9));
    }
}
