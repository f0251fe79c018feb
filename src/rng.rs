use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

/// Source of randomness for the simulation engine.
///
/// Only `random_range` is required; shuffling is derived from it so a
/// scripted source in tests drives the exact same card order logic.
pub trait RandomSource {
    /// Generate a random integer in range [0, max)
    fn random_range(&mut self, max: usize) -> usize;

    /// Fisher-Yates shuffle for a mutable slice
    fn shuffle<T>(&mut self, array: &mut [T]) {
        for i in (1..array.len()).rev() {
            let j = self.random_range(i + 1);
            array.swap(i, j);
        }
    }
}

/// Seeded random number generator for reproducible simulations
#[derive(Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new GameRng with an optional seed
    /// If seed is None, generates a random seed
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            use rand::thread_rng;
            thread_rng().gen()
        });

        let rng = ChaCha8Rng::seed_from_u64(seed);
        GameRng { rng, seed }
    }

    /// Get the seed used for this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for GameRng {
    fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always picks the lowest index, which leaves the slice in a fixed order.
    struct FirstIndex;

    impl RandomSource for FirstIndex {
        fn random_range(&mut self, _max: usize) -> usize {
            0
        }
    }

    #[test]
    fn test_same_seed_produces_same_sequence() {
        let mut rng1 = GameRng::new(Some(12345));
        let mut rng2 = GameRng::new(Some(12345));

        for _ in 0..100 {
            assert_eq!(
                rng1.random_range(1000),
                rng2.random_range(1000),
                "Same seed should produce same random sequence"
            );
        }
    }

    #[test]
    fn test_shuffle_reproducibility() {
        let mut arr1: Vec<u32> = (1..=40).collect();
        let mut arr2: Vec<u32> = (1..=40).collect();

        let mut rng1 = GameRng::new(Some(42));
        let mut rng2 = GameRng::new(Some(42));

        rng1.shuffle(&mut arr1);
        rng2.shuffle(&mut arr2);

        assert_eq!(arr1, arr2, "Same seed should produce same shuffle");
    }

    #[test]
    fn test_shuffle_keeps_multiset() {
        let mut arr: Vec<u32> = vec![0, 0, 1, 2, 2, 2, 3];
        GameRng::new(Some(7)).shuffle(&mut arr);
        arr.sort_unstable();
        assert_eq!(arr, vec![0, 0, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn test_scripted_source_shuffle() {
        // j == 0 at every step rotates the first element to the back
        let mut arr = vec![1, 2, 3, 4];
        FirstIndex.shuffle(&mut arr);
        assert_eq!(arr, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_seed_getter() {
        let seed = 999;
        let rng = GameRng::new(Some(seed));
        assert_eq!(rng.seed(), seed);
    }

    #[test]
    fn test_random_range() {
        let mut rng = GameRng::new(Some(123));
        for _ in 0..1000 {
            let val = rng.random_range(10);
            assert!(val < 10, "random_range should be in [0, max)");
        }
    }
}
