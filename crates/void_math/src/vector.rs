//! 2D vector and direction types

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0);
    pub const X: Self = Self::new(1.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector of length `power` pointing `degrees` clockwise from "up".
    ///
    /// 0° is up (negative Y in screen space), 90° is right.
    #[inline]
    pub fn from_heading(power: f32, degrees: f32) -> Self {
        let angle = crate::radians(degrees - 90.0);
        Self::new(angle.cos() * power, angle.sin() * power)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Rotate counter-clockwise (in a Y-up frame) by `angle` radians
    #[inline]
    pub fn rotate(self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    #[inline]
    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl From<[f32; 2]> for Vec2 {
    #[inline]
    fn from(v: [f32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<(f32, f32)> for Vec2 {
    #[inline]
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Vec2> for [f32; 2] {
    #[inline]
    fn from(v: Vec2) -> Self {
        v.to_array()
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self { Self::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self { Self::new(self.x - rhs.x, self.y - rhs.y) }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self { Self::new(self.x * rhs, self.y * rhs) }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f32) -> Self { Self::new(self.x / rhs, self.y / rhs) }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self { Self::new(-self.x, -self.y) }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) { self.x += rhs.x; self.y += rhs.y; }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) { self.x -= rhs.x; self.y -= rhs.y; }
}

/// Direction argument accepted by impulse, force and velocity helpers.
///
/// Either a heading in degrees (clockwise from up) or an explicit vector
/// that is scaled by the power.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Degrees(f32),
    Vector(f32, f32),
}

impl Direction {
    /// Resolve this direction and a power into a vector
    #[inline]
    pub fn to_vector(self, power: f32) -> Vec2 {
        match self {
            Self::Degrees(degrees) => Vec2::from_heading(power, degrees),
            Self::Vector(x, y) => Vec2::new(x * power, y * power),
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::Degrees(0.0)
    }
}

impl From<f32> for Direction {
    fn from(degrees: f32) -> Self {
        Self::Degrees(degrees)
    }
}

impl From<(f32, f32)> for Direction {
    fn from((x, y): (f32, f32)) -> Self {
        Self::Vector(x, y)
    }
}

impl From<Vec2> for Direction {
    fn from(v: Vec2) -> Self {
        Self::Vector(v.x, v.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_heading_up_is_negative_y() {
        let v = Direction::Degrees(0.0).to_vector(10.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(v.y, -10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_heading_right_and_down() {
        let right = Direction::Degrees(90.0).to_vector(3.0);
        assert_relative_eq!(right.x, 3.0, epsilon = 1e-4);
        assert_relative_eq!(right.y, 0.0, epsilon = 1e-4);

        let down = Direction::from(180.0_f32).to_vector(2.0);
        assert_relative_eq!(down.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(down.y, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_vector_direction_is_scaled() {
        let v = Direction::from((1.0_f32, -1.0_f32)).to_vector(4.0);
        assert_eq!(v, Vec2::new(4.0, -4.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = Vec2::X.rotate(crate::consts::PI / 2.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_vec2_deserializes_from_object() {
        let v: Vec2 = serde_json::from_str(r#"{"x": 1.5, "y": -2}"#).unwrap();
        assert_eq!(v, Vec2::new(1.5, -2.0));
    }
}
