use xxhash_rust::xxh3::Xxh3;

use crate::render::batch::Batch;

const XXH3_SEED: u64 = 0x8b5ad4a0c7d8e9f1;

/// Stable 128-bit digest of a batch, used to skip re-uploading identical geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct BatchFingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl Batch {
    /// Digest of every vertex attribute and index, in order.
    pub fn fingerprint(&self) -> BatchFingerprint {
        let mut h = StableHasher::new();
        h.write_u64(self.positions.len() as u64);
        for p in &self.positions {
            h.write_f32s(p);
        }
        h.write_u64(self.indices.len() as u64);
        for i in &self.indices {
            h.write_u32(*i);
        }
        for c in &self.colors {
            h.write_f32s(c);
        }
        for uv in &self.uvs {
            h.write_f32s(uv);
        }
        h.finish()
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f32s(&mut self, vs: &[f32]) {
        for v in vs {
            // Fold -0.0 into 0.0 so equal geometry hashes equally.
            let v = if *v == 0.0 { 0.0f32 } else { *v };
            self.write_u32(v.to_bits());
        }
    }

    fn finish(self) -> BatchFingerprint {
        let v = self.inner.digest128();
        BatchFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fingerprint.rs"]
mod tests;
