//! Content digests in the self-describing `algorithm:hexdigest` form.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, WaczError};

/// Digest algorithms accepted for archive members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    /// Legacy fast option kept for older tooling.
    Md5,
}

impl HashAlgorithm {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Md5 => "md5",
        }
    }

    /// Hex digest of `bytes` without the algorithm prefix.
    #[must_use]
    pub fn hex_digest(self, bytes: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(bytes)),
            Self::Md5 => hex::encode(Md5::digest(bytes)),
        }
    }

    /// Expected hex length, used to reject truncated digests.
    #[must_use]
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Md5 => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HashAlgorithm {
    type Err = WaczError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "md5" => Ok(Self::Md5),
            other => Err(WaczError::UnsupportedHash {
                name: other.to_string(),
            }),
        }
    }
}

/// Hash `bytes` and prefix the algorithm name: `sha256:9f86…`.
#[must_use]
pub fn hash(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    format!("{}:{}", algorithm.label(), algorithm.hex_digest(bytes))
}

/// Split a prefixed digest back into algorithm and hex part.
///
/// Returns `Ok(None)` for a bare hex digest (older packages omit the prefix), so
/// the caller can fall back to the resource's `hashing` field.
pub fn parse_digest(value: &str) -> Result<Option<(HashAlgorithm, &str)>> {
    let Some((name, hex_part)) = value.split_once(':') else {
        if is_hex(value) {
            return Ok(None);
        }
        return Err(WaczError::InvalidDigest {
            value: value.to_string(),
        });
    };
    let algorithm: HashAlgorithm = name.parse()?;
    if hex_part.len() != algorithm.hex_len() || !is_hex(hex_part) {
        return Err(WaczError::InvalidDigest {
            value: value.to_string(),
        });
    }
    Ok(Some((algorithm, hex_part)))
}

fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_digest_is_prefixed() {
        assert_eq!(
            hash(HashAlgorithm::Sha256, b"test"),
            "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn md5_digest_is_prefixed() {
        assert_eq!(
            hash(HashAlgorithm::Md5, b"test"),
            "md5:098f6bcd4621d373cade4e832627b4f6"
        );
    }

    #[test]
    fn unsupported_algorithm_is_configuration_error() {
        let err = "sha1".parse::<HashAlgorithm>().expect_err("sha1 rejected");
        assert!(matches!(err, WaczError::UnsupportedHash { ref name } if name == "sha1"));
    }

    #[test]
    fn parse_digest_recovers_algorithm() {
        let digest = hash(HashAlgorithm::Md5, b"abc");
        let (algorithm, hex_part) = parse_digest(&digest).expect("parse").expect("prefixed");
        assert_eq!(algorithm, HashAlgorithm::Md5);
        assert_eq!(hex_part, "900150983cd24fb0d6963f7d28e17f72");

        assert!(parse_digest("900150983cd24fb0d6963f7d28e17f72").expect("bare").is_none());
        assert!(parse_digest("sha256:abc").is_err());
        assert!(parse_digest("not a digest").is_err());
    }
}
