use std::hash::Hasher;

/// A deterministic FNV-1a 32-bit hasher.
///
/// State hashes travel inside summaries between peers, so they must not
/// depend on `DefaultHasher`'s per-process keys or on the toolchain version.
#[derive(Debug)]
pub struct FnvHasher {
    state: u32,
}

impl FnvHasher {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }

    pub fn finish_u32(&self) -> u32 {
        self.state
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state as u64
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u32;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Hash a name with FNV-1a
pub fn fnv1a_32(name: &str) -> u32 {
    let mut hasher = FnvHasher::new();
    hasher.write(name.as_bytes());
    hasher.finish_u32()
}
