//! Fixed-length bit-vector used for culture tags, immune systems, and diseases
//!
//! Kept independent of agent logic: agents store `BitVec` values and the
//! rules call the subsequence/Hamming utilities here. Lengths are fixed at
//! construction; culture tags additionally share one odd global length,
//! enforced by the registry.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fixed-length vector of bits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitVec {
    bits: Vec<bool>,
}

impl BitVec {
    /// All-zero vector of the given length
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Uniformly random vector of the given length
    pub fn random<R: Rng>(len: usize, rng: &mut R) -> Self {
        Self {
            bits: (0..len).map(|_| rng.gen_bool(0.5)).collect(),
        }
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit at `index`; out-of-range reads as false
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = value;
        }
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// True when ones outnumber zeros
    ///
    /// Callers that need an unambiguous answer (tribe classification) must
    /// use odd lengths; on even lengths a tie reads as false.
    pub fn majority_one(&self) -> bool {
        self.count_ones() * 2 > self.len()
    }

    /// Hamming distance to an equal-length vector
    ///
    /// Compares up to the shorter length; length mismatches are a caller bug
    /// caught at registry insertion, not here.
    pub fn hamming(&self, other: &Self) -> usize {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Hamming distance between `needle` and the window starting at `start`
    fn window_hamming(&self, needle: &Self, start: usize) -> usize {
        needle
            .bits
            .iter()
            .enumerate()
            .filter(|(i, b)| self.get(start + i) != **b)
            .count()
    }

    /// Whether `needle` appears as a contiguous subsequence
    pub fn contains_window(&self, needle: &Self) -> bool {
        self.best_window(needle)
            .map(|(_, distance)| distance == 0)
            .unwrap_or(false)
    }

    /// Start index and Hamming distance of the window closest to `needle`
    ///
    /// Ties resolve to the earliest window. Returns None when `needle` is
    /// longer than self.
    pub fn best_window(&self, needle: &Self) -> Option<(usize, usize)> {
        if needle.len() > self.len() {
            return None;
        }
        let mut best: Option<(usize, usize)> = None;
        for start in 0..=(self.len() - needle.len()) {
            let distance = self.window_hamming(needle, start);
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((start, distance)),
            }
            if distance == 0 {
                break;
            }
        }
        best
    }

    /// Per-bit uniform crossover of two equal-length parents
    pub fn crossover<R: Rng>(a: &Self, b: &Self, rng: &mut R) -> Self {
        let bits = a
            .bits
            .iter()
            .zip(b.bits.iter())
            .map(|(&x, &y)| if rng.gen_bool(0.5) { x } else { y })
            .collect();
        Self { bits }
    }
}
