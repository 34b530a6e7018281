// SPDX-License-Identifier: GPL-3.0-or-later

// Relation of a stored search value to the true minimax value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound(pub u32);

impl Bound {
    pub const NONE: Bound = Bound(0);
    pub const UPPER: Bound = Bound(1);
    pub const LOWER: Bound = Bound(2);
    pub const EXACT: Bound = Bound(3);
}

impl std::ops::BitAnd<Bound> for Bound {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Bound(self.0 & rhs.0)
    }
}

impl std::ops::BitOr<Bound> for Bound {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Bound(self.0 | rhs.0)
    }
}

impl std::cmp::PartialEq<u32> for Bound {
    fn eq(&self, rhs: &u32) -> bool {
        debug_assert!(*rhs == 0);
        self.0 == *rhs
    }
}

#[cfg(test)]
mod bound_tests {
    use super::*;

    #[test]
    fn test_exact_contains_both_bounds() {
        assert_eq!(Bound::EXACT & Bound::LOWER, Bound::LOWER);
        assert_eq!(Bound::EXACT & Bound::UPPER, Bound::UPPER);
        assert_eq!(Bound::UPPER | Bound::LOWER, Bound::EXACT);
    }

    #[test]
    fn test_disjoint_bounds() {
        assert!(Bound::UPPER & Bound::LOWER == 0);
        assert!(Bound::NONE & Bound::EXACT == 0);
        assert!(Bound::LOWER & Bound::LOWER != 0);
    }
}
