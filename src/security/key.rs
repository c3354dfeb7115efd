// Network Manager - Key Material
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Raw wireless key bytes, zeroed on drop.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw key bytes, zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial([REDACTED; {}])", self.0.len())
    }
}

impl From<&[u8]> for KeyMaterial {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let key = KeyMaterial::new(b"secret".to_vec());
        let shown = format!("{:?}", key);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("REDACTED"));
    }

    #[test]
    fn test_zeroize_clears_bytes() {
        let mut key = KeyMaterial::new(vec![0xAA; 16]);
        key.zeroize();
        assert!(key.is_empty());
    }
}
