//! Extract the bits of a word selected by a mask, the `pext`(parallel bits extract)
//! operation
//!
//! Three implementations are provided, from fast to slow:
//!
//! - [`PextMethod::Instruction`]: the `pext` instruction of `bmi2`, x86_64 only
//!
//! - [`PextMethod::Clmul`]: the compress algorithm of Hacker's Delight(7-4), the parallel
//!   prefix is computed with a single carry-less multiplication
//!
//! - [`PextMethod::Simple`]: the same compress algorithm, the parallel prefix is computed
//!   with shifts. It is portable
//!
//! The method used by the computations is chosen when it is first required and cached for
//! the life of the process, see [`pext_method`].

use std::fmt::Display;
use std::sync::OnceLock;

/// Method used to extract the bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PextMethod {
    /// Native `pext` instruction
    Instruction,
    /// Software emulation with carry-less multiplication
    Clmul,
    /// Portable software emulation
    Simple,
}

impl PextMethod {
    /// All of the methods, in priority order
    pub const ALL: [PextMethod; 3] = [Self::Instruction, Self::Clmul, Self::Simple];

    /// Returns true if the cpu can execute this method. Note that a supported method may not
    /// be available: the `pext` instruction is extremely slow on AMD chips
    pub fn is_supported(self) -> bool {
        match self {
            Self::Instruction => has_bmi2(),
            Self::Clmul => has_clmul(),
            Self::Simple => true,
        }
    }

    /// Returns true if the method is in the [`available_pext_methods`]
    #[inline]
    pub fn is_available(self) -> bool {
        available_pext_methods().contains(&self)
    }

    /// Extract the bits of `value` at the positions where `mask` has a 1 bit, and pack them
    /// contiguously from bit 0 in ascending position order. The number of valid bits in the
    /// result is `mask.count_ones()`, the higher bits are zero
    ///
    /// Panic if the method is not supported by the cpu
    pub fn pext(self, value: u64, mask: u64) -> u64 {
        assert!(
            self.is_supported(),
            "pext method `{self}` is not supported by the cpu"
        );

        // SAFETY: the method is supported, checked above
        unsafe { pext_word_with(self, value, mask) }
    }
}

impl Display for PextMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instruction => write!(f, "Instruction"),
            Self::Clmul => write!(f, "Clmul"),
            Self::Simple => write!(f, "Simple"),
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn has_bmi2() -> bool {
    std::arch::is_x86_feature_detected!("bmi2")
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
fn has_bmi2() -> bool {
    false
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn has_clmul() -> bool {
    std::arch::is_x86_feature_detected!("pclmulqdq")
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn has_clmul() -> bool {
    std::arch::is_aarch64_feature_detected!("aes")
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
fn has_clmul() -> bool {
    false
}

/// Implementation of the `pext`
pub(crate) trait Pext {
    /// Extract the bits of `value` selected by `mask`
    ///
    /// # Safety
    ///
    /// The cpu must support the target features required by the implementation
    unsafe fn pext(value: u64, mask: u64) -> u64;
}

/// `pext` instruction of `bmi2`
#[cfg(target_arch = "x86_64")]
#[derive(Debug)]
pub(crate) struct PextInstruction;

#[cfg(target_arch = "x86_64")]
impl Pext for PextInstruction {
    #[inline]
    unsafe fn pext(value: u64, mask: u64) -> u64 {
        // SAFETY: caller guarantees bmi2 is supported
        unsafe { std::arch::x86_64::_pext_u64(value, mask) }
    }
}

/// Compress with carry-less multiplication
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
#[derive(Debug)]
pub(crate) struct PextClmul;

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
impl Pext for PextClmul {
    #[inline]
    unsafe fn pext(value: u64, mask: u64) -> u64 {
        // SAFETY: caller guarantees carry-less multiplication is supported
        compress(value, mask, |x| unsafe { prefix_xor_clmul(x) })
    }
}

/// Compress with shifts
#[derive(Debug)]
pub(crate) struct PextSimple;

impl Pext for PextSimple {
    #[inline]
    unsafe fn pext(value: u64, mask: u64) -> u64 {
        compress(value, mask, prefix_xor_simple)
    }
}

/// Compress algorithm: in round `i`, every selected bit whose number of unselected bits to
/// its right has bit `i` set is moved right by `2^i` positions. The `prefix_xor` computes
/// bit `k` of its result as the xor of the bits `[0..=k]` of its input
#[inline(always)]
fn compress(value: u64, mask: u64, prefix_xor: impl Fn(u64) -> u64) -> u64 {
    let mut value = value & mask;
    let mut mask = mask;
    // Count the unselected bits to the right
    let mut mk = !mask << 1;
    for i in 0..6 {
        let mp = prefix_xor(mk);
        // Bits to move
        let mv = mp & mask;
        mask = (mask ^ mv) | (mv >> (1 << i));
        let t = value & mv;
        value = (value ^ t) | (t >> (1 << i));
        mk &= !mp;
    }
    value
}

#[inline(always)]
fn prefix_xor_simple(mut x: u64) -> u64 {
    x ^= x << 1;
    x ^= x << 2;
    x ^= x << 4;
    x ^= x << 8;
    x ^= x << 16;
    x ^= x << 32;
    x
}

/// Carry-less multiplication with all ones is the prefix xor
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "pclmulqdq")]
#[inline]
#[allow(unused_unsafe)]
unsafe fn prefix_xor_clmul(x: u64) -> u64 {
    use std::arch::x86_64::{
        _mm_clmulepi64_si128, _mm_cvtsi64_si128, _mm_cvtsi128_si64, _mm_set1_epi64x,
    };

    // SAFETY: pclmulqdq is enabled, sse2 is always available on x86_64
    unsafe {
        let product =
            _mm_clmulepi64_si128(_mm_cvtsi64_si128(x as i64), _mm_set1_epi64x(-1), 0x00);
        _mm_cvtsi128_si64(product) as u64
    }
}

/// Carry-less multiplication with all ones is the prefix xor
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon,aes")]
#[inline]
#[allow(unused_unsafe)]
unsafe fn prefix_xor_clmul(x: u64) -> u64 {
    // SAFETY: neon and aes are enabled
    unsafe { std::arch::aarch64::vmull_p64(x, u64::MAX) as u64 }
}

/// # Safety
///
/// The cpu must support the target features required by `P`
#[inline(always)]
unsafe fn pext_word<P: Pext>(value: u64, mask: u64) -> u64 {
    unsafe { P::pext(value, mask) }
}

crate::macros::pext_func!(pext_word, (value: u64, mask: u64) -> u64);

/// Methods available on this cpu, in priority order
static PEXT_METHODS: OnceLock<Vec<PextMethod>> = OnceLock::new();

/// Return a prioritized list of methods that can be used for extracting bits on this cpu.
/// [`PextMethod::Simple`] is always the last one.
///
/// The cpu is probed only once, the result is cached for the life of the process
pub fn available_pext_methods() -> &'static [PextMethod] {
    PEXT_METHODS.get_or_init(detect_pext_methods)
}

/// The method used by the computations: the first one of [`available_pext_methods`]
#[inline]
pub fn pext_method() -> PextMethod {
    available_pext_methods()
        .first()
        .copied()
        .unwrap_or(PextMethod::Simple)
}

fn detect_pext_methods() -> Vec<PextMethod> {
    let mut methods = Vec::with_capacity(PextMethod::ALL.len());

    #[cfg(target_arch = "x86_64")]
    let vendor = cpu_vendor();
    #[cfg(not(target_arch = "x86_64"))]
    let vendor = String::from("unknown");

    // Even though recent AMD chips support pext, it's extremely slow, so only use bmi2 on
    // Intel and use the software implementation on AMD
    if PextMethod::Instruction.is_supported() && vendor == "GenuineIntel" {
        methods.push(PextMethod::Instruction);
    }
    if PextMethod::Clmul.is_supported() {
        methods.push(PextMethod::Clmul);
    }
    methods.push(PextMethod::Simple);

    tracing::debug!(
        "Detected cpu vendor: `{}`, available pext methods: {:?}, use `{}`",
        vendor,
        methods,
        methods[0]
    );

    methods
}

/// Vendor identification string of the cpu, for example `GenuineIntel` and `AuthenticAMD`
#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn cpu_vendor() -> String {
    // SAFETY: cpuid is always available on x86_64
    let leaf = unsafe { std::arch::x86_64::__cpuid(0) };
    let mut vendor = [0_u8; 12];
    vendor[..4].copy_from_slice(&leaf.ebx.to_le_bytes());
    vendor[4..8].copy_from_slice(&leaf.edx.to_le_bytes());
    vendor[8..].copy_from_slice(&leaf.ecx.to_le_bytes());
    String::from_utf8_lossy(&vendor).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Bit by bit model of the pext
    fn naive_pext(value: u64, mask: u64) -> u64 {
        let mut result = 0;
        let mut num_bits = 0;
        for i in 0..64 {
            if mask & (1 << i) != 0 {
                result |= ((value >> i) & 1) << num_bits;
                num_bits += 1;
            }
        }
        result
    }

    fn supported_methods() -> impl Iterator<Item = PextMethod> {
        PextMethod::ALL.into_iter().filter(|m| m.is_supported())
    }

    #[test]
    fn test_pext_examples() {
        for method in supported_methods() {
            assert_eq!(method.pext(0b1101, 0b0101), 0b11, "{method}");
            assert_eq!(method.pext(0b1101, 0b1010), 0b10, "{method}");
            assert_eq!(method.pext(u64::MAX, 0), 0, "{method}");
            assert_eq!(method.pext(0, u64::MAX), 0, "{method}");
            assert_eq!(method.pext(0x1234_5678_9abc_def0, u64::MAX), 0x1234_5678_9abc_def0);
            assert_eq!(method.pext(u64::MAX, 1 << 63), 1, "{method}");
            assert_eq!(method.pext(1 << 63, 0xf000_0000_0000_0001), 0b1_0000, "{method}");
        }
    }

    #[test]
    fn test_pext_exhaustive_small_masks() {
        let values = [0_u64, u64::MAX, 0xaaaa_aaaa_aaaa_aaaa, 0x0123_4567_89ab_cdef, 0xfff];
        for method in supported_methods() {
            for value in values {
                for mask in 0..(1_u64 << 12) {
                    assert_eq!(
                        method.pext(value, mask),
                        naive_pext(value, mask),
                        "method: {method}, value: {value:#x}, mask: {mask:#x}"
                    );
                    // Same mask placed on the high bits
                    let high_mask = mask << 52;
                    assert_eq!(
                        method.pext(value, high_mask),
                        naive_pext(value, high_mask),
                        "method: {method}, value: {value:#x}, mask: {high_mask:#x}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_pext_random_cross_backend() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20_000 {
            let value: u64 = rng.r#gen();
            // Mix dense and sparse masks
            let mask: u64 = match rng.gen_range(0..3) {
                0 => rng.r#gen(),
                1 => rng.r#gen::<u64>() & rng.r#gen::<u64>() & rng.r#gen::<u64>(),
                _ => rng.r#gen::<u64>() | rng.r#gen::<u64>(),
            };
            let expected = naive_pext(value, mask);
            for method in supported_methods() {
                let extracted = method.pext(value, mask);
                assert_eq!(
                    extracted, expected,
                    "method: {method}, value: {value:#x}, mask: {mask:#x}"
                );
                assert!(mask.count_ones() == 64 || extracted >> mask.count_ones() == 0);
            }
        }
    }

    #[test]
    fn test_available_pext_methods() {
        let methods = available_pext_methods();
        assert_eq!(methods.last(), Some(&PextMethod::Simple));
        assert_eq!(methods[0], pext_method());
        assert!(methods.iter().all(|method| method.is_supported()));
        // Priority order is kept
        let positions = methods
            .iter()
            .map(|m| PextMethod::ALL.iter().position(|all| all == m).unwrap())
            .collect::<Vec<_>>();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        // Cached
        assert!(std::ptr::eq(methods, available_pext_methods()));
    }

    #[test]
    fn test_simple_is_always_available() {
        assert!(PextMethod::Simple.is_supported());
        assert!(PextMethod::Simple.is_available());
    }
}
