// SPDX-License-Identifier: GPL-3.0-or-later

use super::MAX_PLY;

// Search depth in fractional plies. ONE_PLY is two units so that half-ply
// extensions can be expressed.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq)]
pub struct Depth(pub i32);

impl std::ops::Add<Depth> for Depth {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Depth(self.0 + rhs.0)
    }
}

impl std::ops::Sub<Depth> for Depth {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Depth(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign<Depth> for Depth {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign<Depth> for Depth {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<i32> for Depth {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Depth(self.0 * rhs)
    }
}

impl std::ops::Mul<Depth> for i32 {
    type Output = Depth;
    fn mul(self, rhs: Depth) -> Depth {
        Depth(self * rhs.0)
    }
}

impl std::ops::Div<i32> for Depth {
    type Output = Self;
    fn div(self, rhs: i32) -> Self {
        Depth(self.0 / rhs)
    }
}

impl std::ops::Div<Depth> for Depth {
    type Output = i32;
    fn div(self, rhs: Depth) -> i32 {
        self.0 / rhs.0
    }
}

pub const ONE_PLY: Depth = Depth(2);

impl Depth {
    pub const ZERO: Depth = Depth(0);
    pub const QS_CHECKS: Depth = Depth(0);
    pub const QS_NO_CHECKS: Depth = Depth(-ONE_PLY.0);
    pub const QS_RECAPTURES: Depth = Depth(-5 * ONE_PLY.0);

    pub const NONE: Depth = Depth(-6 * ONE_PLY.0);
    pub const MAX: Depth = Depth(MAX_PLY * ONE_PLY.0);

    pub fn plies(self) -> i32 {
        self.0 / ONE_PLY.0
    }
}
