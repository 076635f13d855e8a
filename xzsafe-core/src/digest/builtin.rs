//! Digest strategies shipped with the default registry.

use sha2::Digest as _;

use super::{DigestHasher, DigestStrategy};

/// 64-bit XXH3. Fast, not collision resistant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3;

impl Xxh3 {
    pub const NAME: &'static str = "xxh3";
}

impl DigestStrategy for Xxh3 {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hasher(&self) -> Box<dyn DigestHasher> {
        Box::new(xxhash_rust::xxh3::Xxh3::new())
    }
}

impl DigestHasher for xxhash_rust::xxh3::Xxh3 {
    fn update(&mut self, data: &[u8]) {
        xxhash_rust::xxh3::Xxh3::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.digest().to_be_bytes().to_vec()
    }
}

/// CRC32 (IEEE polynomial).
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl Crc32 {
    pub const NAME: &'static str = "crc32";
}

impl DigestStrategy for Crc32 {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hasher(&self) -> Box<dyn DigestHasher> {
        Box::new(crc32fast::Hasher::new())
    }
}

impl DigestHasher for crc32fast::Hasher {
    fn update(&mut self, data: &[u8]) {
        crc32fast::Hasher::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        (*self).finalize().to_be_bytes().to_vec()
    }
}

/// SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl Sha256 {
    pub const NAME: &'static str = "sha256";
}

impl DigestStrategy for Sha256 {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hasher(&self) -> Box<dyn DigestHasher> {
        Box::new(sha2::Sha256::new())
    }
}

impl DigestHasher for sha2::Sha256 {
    fn update(&mut self, data: &[u8]) {
        sha2::Digest::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        sha2::Digest::finalize(*self).to_vec()
    }
}

/// MD5. Only for comparing against checksums produced elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5;

impl Md5 {
    pub const NAME: &'static str = "md5";
}

impl DigestStrategy for Md5 {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hasher(&self) -> Box<dyn DigestHasher> {
        Box::new(md5::Md5::new())
    }
}

impl DigestHasher for md5::Md5 {
    fn update(&mut self, data: &[u8]) {
        md5::Digest::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        md5::Digest::finalize(*self).to_vec()
    }
}

/// BLAKE3 with the default 32-byte output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3;

impl Blake3 {
    pub const NAME: &'static str = "blake3";
}

impl DigestStrategy for Blake3 {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hasher(&self) -> Box<dyn DigestHasher> {
        Box::new(blake3::Hasher::new())
    }
}

impl DigestHasher for blake3::Hasher {
    fn update(&mut self, data: &[u8]) {
        blake3::Hasher::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        blake3::Hasher::finalize(&self).as_bytes().to_vec()
    }
}
