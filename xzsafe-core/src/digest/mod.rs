//! Pluggable content digests used to verify archive round trips.
//!
//! Algorithms are looked up by name in a [`DigestRegistry`]. The default
//! registry carries two fast hashes (`xxh3`, `crc32`) and two cryptographic
//! ones (`sha256`, `blake3`), plus the symbolic aliases `fast-hash` and
//! `crypto-hash`. Additional strategies can be registered at runtime.
//!
//! A [`Digest`] remembers the algorithm that produced it. Comparing digests of
//! different algorithms is an error rather than a plain "not equal".

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::DigestError;

mod builtin;


pub use builtin::{Blake3, Crc32, Md5, Sha256, Xxh3};

/// Alias resolving to the default fast, non-cryptographic algorithm
pub const FAST_ALIAS: &str = "fast-hash";

/// Alias resolving to the default cryptographic algorithm
pub const CRYPTO_ALIAS: &str = "crypto-hash";

/// Incremental state of one digest computation.
pub trait DigestHasher: Send {
    /// Feeds more input.
    fn update(&mut self, data: &[u8]);

    /// Consumes the state and returns the digest value.
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// A named digest algorithm.
pub trait DigestStrategy: Send + Sync {
    /// Canonical name, used as the tag of every digest it produces.
    fn name(&self) -> &str;

    /// Starts a fresh computation.
    fn hasher(&self) -> Box<dyn DigestHasher>;
}

/// Fingerprint of some bytes under a named algorithm.
#[derive(Clone)]
pub struct Digest {
    algorithm: Arc<str>,
    value: Vec<u8>,
}

impl Digest {
    pub fn new(algorithm: impl Into<Arc<str>>, value: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            value,
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.value
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }

    /// Compares two digests of the same algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::AlgorithmMismatch`] when the algorithms differ.
    pub fn matches(&self, other: &Digest) -> Result<bool, DigestError> {
        if self.algorithm != other.algorithm {
            return Err(DigestError::AlgorithmMismatch {
                left: self.algorithm.to_string(),
                right: other.algorithm.to_string(),
            });
        }
        Ok(self.value == other.value)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

/// A resolved algorithm, ready to digest input.
#[derive(Clone)]
pub struct Algorithm {
    strategy: Arc<dyn DigestStrategy>,
}

impl Algorithm {
    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    /// Digests an in-memory buffer.
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        let mut hasher = self.strategy.hasher();
        hasher.update(data);
        self.seal(hasher)
    }

    /// Digests everything `reader` yields until end of input.
    ///
    /// Input is hashed chunk by chunk, so memory use does not grow with the
    /// length of the stream.
    ///
    /// # Errors
    ///
    /// Returns the first read error. Errors from engine streams keep their
    /// [`TranscodeError`](crate::TranscodeError) payload.
    pub async fn digest_reader<R>(&self, mut reader: R) -> std::io::Result<Digest>
    where
        R: AsyncRead + Unpin,
    {
        let mut hasher = self.strategy.hasher();
        let mut chunk = vec![0u8; DEFAULT_CHUNK_SIZE];
        loop {
            let read = reader.read(&mut chunk).await?;
            if read == 0 {
                return Ok(self.seal(hasher));
            }
            hasher.update(&chunk[..read]);
        }
    }

    /// Digests the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::ReadFile`] if the file cannot be opened or read.
    pub async fn digest_file(&self, path: &Path) -> Result<Digest, DigestError> {
        let read_error = |source| DigestError::ReadFile {
            path: path.to_path_buf(),
            source,
        };
        let file = tokio::fs::File::open(path).await.map_err(read_error)?;
        self.digest_reader(file).await.map_err(read_error)
    }

    fn seal(&self, hasher: Box<dyn DigestHasher>) -> Digest {
        Digest::new(self.strategy.name(), hasher.finalize())
    }
}

impl fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Algorithm").field(&self.name()).finish()
    }
}

/// Name to strategy mapping.
///
/// Lookups are case-insensitive.
#[derive(Clone)]
pub struct DigestRegistry {
    strategies: BTreeMap<String, Arc<dyn DigestStrategy>>,
}

impl Default for DigestRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Xxh3);
        registry.register(Crc32);
        registry.register(Sha256);
        registry.register(Md5);
        registry.register(Blake3);
        registry.alias(FAST_ALIAS, Xxh3::NAME);
        registry.alias(CRYPTO_ALIAS, Sha256::NAME);
        registry
    }
}

impl DigestRegistry {
    /// Creates a registry without any algorithm.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Registers `strategy` under its own name, replacing any previous entry.
    pub fn register(&mut self, strategy: impl DigestStrategy + 'static) -> &mut Self {
        let strategy: Arc<dyn DigestStrategy> = Arc::new(strategy);
        self.strategies
            .insert(strategy.name().to_ascii_lowercase(), strategy);
        self
    }

    /// Makes `alias` resolve to the strategy registered as `target`.
    ///
    /// Does nothing when `target` is unknown.
    pub fn alias(&mut self, alias: &str, target: &str) -> &mut Self {
        if let Some(strategy) = self.strategies.get(&target.to_ascii_lowercase()).cloned() {
            self.strategies.insert(alias.to_ascii_lowercase(), strategy);
        }
        self
    }

    /// Looks up an algorithm by name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::UnsupportedAlgorithm`] for unknown names.
    pub fn resolve(&self, name: &str) -> Result<Algorithm, DigestError> {
        self.strategies
            .get(&name.trim().to_ascii_lowercase())
            .map(|strategy| Algorithm {
                strategy: Arc::clone(strategy),
            })
            .ok_or_else(|| DigestError::UnsupportedAlgorithm {
                name: name.to_string(),
            })
    }

    /// Every accepted name, aliases included, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }
}

impl fmt::Debug for DigestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
