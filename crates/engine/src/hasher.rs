//! Stream hashing: two independent 32-bit hash functions combined into a
//! 64-bit [`StreamHash`], per §2(1). Numeric stream ids (format B) use an
//! identity hasher instead, since they are already small dense integers
//! and hashing them would only introduce needless collisions.

use logindex_core::stream_id::{NumericStreamId, StreamHash, StringStreamId};

pub trait StreamHasher<Id>: Send + Sync {
    fn hash(&self, id: &Id) -> StreamHash;
}

/// Two independent FNV-1a variants (different offset basis/prime choices
/// would also work; what matters is that the two halves are
/// uncorrelated) combined as `(high << 32) | low`.
pub struct TwoHashStreamHasher;

impl TwoHashStreamHasher {
    fn fnv1a(bytes: &[u8], offset_basis: u32, prime: u32) -> u32 {
        let mut hash = offset_basis;
        for &byte in bytes {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(prime);
        }
        hash
    }

    fn high(bytes: &[u8]) -> u32 {
        Self::fnv1a(bytes, 0x811C_9DC5, 0x0100_0193)
    }

    fn low(bytes: &[u8]) -> u32 {
        Self::fnv1a(bytes, 0xC59D_1C81, 0x1934_0001)
    }
}

impl StreamHasher<StringStreamId> for TwoHashStreamHasher {
    fn hash(&self, id: &StringStreamId) -> StreamHash {
        let bytes = id.0.as_bytes();
        StreamHash::new(Self::high(bytes), Self::low(bytes))
    }
}

/// Identity hasher for format B: the numeric stream id is its own hash,
/// zero-extended into the low 32 bits.
pub struct IdentityStreamHasher;

impl StreamHasher<NumericStreamId> for IdentityStreamHasher {
    fn hash(&self, id: &NumericStreamId) -> StreamHash {
        StreamHash::new(0, id.0)
    }
}
