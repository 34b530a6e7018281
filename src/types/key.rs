// SPDX-License-Identifier: GPL-3.0-or-later

// 64-bit Zobrist-style hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Key(pub u64);

impl Key {
    // Upper half, used to verify transposition table hits.
    pub fn high32(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl std::ops::BitXor<Key> for Key {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self {
        Key(self.0 ^ rhs.0)
    }
}

impl std::ops::BitXorAssign<Key> for Key {
    fn bitxor_assign(&mut self, rhs: Key) {
        *self = *self ^ rhs;
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "{:016X}", self.0)
    }
}

#[cfg(test)]
mod key_tests {
    use super::Key;

    #[test]
    fn test_xor_is_involution() {
        let mut k = Key(0x1234_5678_9abc_def0);
        let z = Key(0x0f0f_0f0f_0f0f_0f0f);
        k ^= z;
        assert_ne!(k, Key(0x1234_5678_9abc_def0));
        k ^= z;
        assert_eq!(k, Key(0x1234_5678_9abc_def0));
    }

    #[test]
    fn test_high32() {
        assert_eq!(Key(0xdead_beef_0000_0001).high32(), 0xdead_beef);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Key(0x1234)), "0000000000001234");
    }
}
