use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Number of rows in a block, rule of thumb
pub const BLOCK_ROWS: usize = 8192;

/// Install the subscriber, such that `RUST_LOG=debug` prints the detected pext method
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

/// Creates a new bitmap with `num_bits` bits, each bit is set with probability `density`
pub fn create_bitmap_with_seed(num_bits: usize, density: f64, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bitmap = vec![0_u8; num_bits.div_ceil(8)];
    (0..num_bits).for_each(|index| {
        if rng.gen_bool(density) {
            bitmap[index / 8] |= 1 << (index % 8);
        }
    });
    bitmap
}

/// Creates a new value buffer that holds `num_rows` cells of `cell_width` bytes
pub fn create_values_with_seed(num_rows: usize, cell_width: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_rows * cell_width).map(|_| rng.r#gen()).collect()
}

/// Creates `len` random pairs of (value, mask)
pub fn create_pext_pairs_with_seed(len: usize, seed: u64) -> Vec<(u64, u64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| (rng.r#gen(), rng.r#gen())).collect()
}
