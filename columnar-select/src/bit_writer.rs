//! Write variable bit-length values to a pre-allocated byte buffer

/// Writer that appends the low bits of `u64` values to an existing byte buffer, LSB-first.
///
/// Bits are accumulated in a [`u64`] and written to the buffer 8 bytes at a time. The
/// writer can start in the middle of a byte: the bits before the start position are read
/// back from the buffer and kept, therefore rows written by previous calls are preserved.
///
/// The writer must be [flushed](BitWriter::flush) exactly once after the last
/// [`put`](BitWriter::put), otherwise it panics.
#[derive(Debug)]
pub struct BitWriter<'a> {
    dst: &'a mut [u8],
    /// Offset of the byte that the buffered bits will be written to
    byte_offset: usize,
    /// Accumulated bits that haven't been flushed to the destination buffer yet
    buffered_values: u64,
    /// The number of accumulated bits in buffered_values, always less than 64
    num_buffered_bits: usize,
    flushed: bool,
}

impl<'a> BitWriter<'a> {
    /// Start writing data to `dst`, but skip over the first `skip_initial_bits` bits.
    ///
    /// The skip may place us in the middle of a byte. The writer is positioned at the start
    /// of that byte and the pre-existing bits are buffered, such that the following bits
    /// are merged with them.
    pub fn new(dst: &'a mut [u8], skip_initial_bits: usize) -> Self {
        let byte_offset = skip_initial_bits / 8;
        let preexisting_bits = skip_initial_bits % 8;
        let mut writer = Self {
            dst,
            byte_offset,
            buffered_values: 0,
            num_buffered_bits: 0,
            flushed: false,
        };
        if preexisting_bits != 0 {
            let preexisting_val = writer.dst[byte_offset] & ((1 << preexisting_bits) - 1);
            writer.put(preexisting_val as u64, preexisting_bits);
        }
        writer
    }

    /// Append the low `num_bits` bits of `value`. Bits above `num_bits` are ignored
    ///
    /// Panic if `num_bits > 64` or the writer is flushed
    #[inline]
    pub fn put(&mut self, value: u64, num_bits: usize) {
        assert!(!self.flushed, "put after flush");
        assert!(num_bits <= 64, "can not put {num_bits} bits at once");

        let value = if num_bits == 64 {
            value
        } else {
            value & ((1 << num_bits) - 1)
        };

        self.buffered_values |= value << self.num_buffered_bits;
        self.num_buffered_bits += num_bits;

        if self.num_buffered_bits >= 64 {
            self.dst[self.byte_offset..self.byte_offset + 8]
                .copy_from_slice(&self.buffered_values.to_le_bytes());
            self.byte_offset += 8;
            self.num_buffered_bits -= 64;
            // Bits of value that did not fit into the flushed word. If the whole value is
            // flushed, the shift amount is 64
            let shift = (num_bits - self.num_buffered_bits) as u32;
            self.buffered_values = value.checked_shr(shift).unwrap_or(0);
        }

        #[cfg(feature = "verify")]
        assert!(self.num_buffered_bits < 64);
    }

    /// Write the remaining buffered bits to the destination in whole bytes. Only the bits
    /// that have been put are defined, the unused high bits of the last byte are cleared.
    ///
    /// Panic if the writer has been flushed before
    pub fn flush(&mut self) {
        assert!(!self.flushed, "must only flush once");
        let num_bytes = crate::bitmap::num_bytes(self.num_buffered_bits);
        self.dst[self.byte_offset..self.byte_offset + num_bytes]
            .copy_from_slice(&self.buffered_values.to_le_bytes()[..num_bytes]);
        self.byte_offset += num_bytes;
        self.buffered_values = 0;
        self.num_buffered_bits = 0;
        self.flushed = true;
    }
}

impl Drop for BitWriter<'_> {
    fn drop(&mut self) {
        if !self.flushed && !std::thread::panicking() {
            panic!("must flush");
        }
    }
}
