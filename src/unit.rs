//! Length units used in presentation documents.
//!
//! All geometry in a PresentationML document is stored in English Metric
//! Units (EMU). 914,400 EMU make one inch, which gives integral values
//! for inches, centimeters, points and 96-dpi pixels alike.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_CM: i64 = 360_000;
pub const EMUS_PER_MM: i64 = 36_000;
pub const EMUS_PER_PT: i64 = 12_700;

/// Rotation is stored on the wire in 60,000ths of a degree.
pub const ROT_UNITS_PER_DEGREE: i64 = 60_000;

/// A length in English Metric Units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Emu(pub i64);

impl Emu {
    #[inline]
    pub fn from_inches(inches: f64) -> Self {
        Emu((inches * EMUS_PER_INCH as f64) as i64)
    }

    #[inline]
    pub fn from_cm(cm: f64) -> Self {
        Emu((cm * EMUS_PER_CM as f64) as i64)
    }

    #[inline]
    pub fn from_pt(pt: f64) -> Self {
        Emu((pt * EMUS_PER_PT as f64) as i64)
    }

    /// Convert from pixels at the conventional 96 dpi.
    #[inline]
    pub fn from_px_96(px: u32) -> Self {
        Emu(px as i64 * EMUS_PER_INCH / 96)
    }

    #[inline]
    pub fn inches(self) -> f64 {
        self.0 as f64 / EMUS_PER_INCH as f64
    }

    #[inline]
    pub fn pt(self) -> f64 {
        self.0 as f64 / EMUS_PER_PT as f64
    }
}

impl Add for Emu {
    type Output = Emu;

    #[inline]
    fn add(self, rhs: Emu) -> Emu {
        Emu(self.0 + rhs.0)
    }
}

impl Sub for Emu {
    type Output = Emu;

    #[inline]
    fn sub(self, rhs: Emu) -> Emu {
        Emu(self.0 - rhs.0)
    }
}

impl Sum for Emu {
    fn sum<I: Iterator<Item = Emu>>(iter: I) -> Emu {
        Emu(iter.map(|e| e.0).sum())
    }
}

impl fmt::Display for Emu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} EMU", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Emu::from_inches(1.0), Emu(914_400));
        assert_eq!(Emu::from_pt(72.0), Emu(914_400));
        assert_eq!(Emu::from_px_96(96), Emu(914_400));
        assert_eq!(Emu(914_400).inches(), 1.0);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(Emu(100) + Emu(50), Emu(150));
        assert_eq!(Emu(100) - Emu(50), Emu(50));
        let total: Emu = [Emu(1), Emu(2), Emu(3)].into_iter().sum();
        assert_eq!(total, Emu(6));
    }
}
