//! Digest algorithms and the small fixed sets of them that drive hashing work.

use derive_more::Display;
use std::fmt;

/// A cryptographic digest algorithm that a hash database may index.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    #[display("sha1")]
    Sha1,
    #[display("md5")]
    Md5,
}
impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Sha1, Algorithm::Md5];

    /// Length of the raw (not hex) digest in bytes.
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Md5 => 16,
        }
    }

    const fn bit(&self) -> u8 {
        match self {
            Self::Sha1 => 0b01,
            Self::Md5 => 0b10,
        }
    }
}

/// A set of [`Algorithm`]s.
///
/// There are only two algorithms, so this is a bitmask rather than a
/// collection; it's `Copy` and cheap to pass around per query.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AlgorithmSet(u8);
impl AlgorithmSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Algorithm::Sha1.bit() | Algorithm::Md5.bit())
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, algorithm: Algorithm) -> bool {
        self.0 & algorithm.bit() != 0
    }

    pub fn insert(&mut self, algorithm: Algorithm) {
        self.0 |= algorithm.bit();
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_subset(&self, other: &Self) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Algorithm> + '_ {
        Algorithm::ALL.into_iter().filter(|a| self.contains(*a))
    }
}
impl FromIterator<Algorithm> for AlgorithmSet {
    fn from_iter<T: IntoIterator<Item = Algorithm>>(iter: T) -> Self {
        let mut set = Self::empty();
        for algorithm in iter {
            set.insert(algorithm);
        }
        set
    }
}
impl<const N: usize> From<[Algorithm; N]> for AlgorithmSet {
    fn from(value: [Algorithm; N]) -> Self {
        value.into_iter().collect()
    }
}
impl fmt::Debug for AlgorithmSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
impl fmt::Display for AlgorithmSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}
