use crate::AlgorithmSet;
use crate::digest::{Digests, MultiHasher};
use crate::error::Result;
use crate::source::DigestSource;
use async_trait::async_trait;

/// File contents that are already in memory.
#[derive(Clone, Debug)]
pub struct BytesSource {
    data: Vec<u8>,
}
impl BytesSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl DigestSource for BytesSource {
    async fn compute(&self, expected_size: u64, algorithms: AlgorithmSet) -> Result<Digests> {
        let mut hasher = MultiHasher::new(algorithms);
        hasher.update(&self.data);
        hasher.finish(expected_size)
    }
}
