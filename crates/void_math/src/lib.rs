//! # void_math - 2D Math Primitives
//!
//! Small, copyable math types shared by the physics wrapper, the canvas
//! layer and the world facade. World space is Y-down (positive Y points
//! towards the bottom of the screen), matching canvas pixel space.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod rect;
pub mod vector;

pub use rect::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

/// Clamp value to `[-limit, limit]`
#[inline]
pub fn clamp_symmetric(value: f32, limit: f32) -> f32 {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

pub mod prelude {
    pub use crate::rect::Rect;
    pub use crate::vector::{Direction, Vec2};
    pub use crate::{clamp_symmetric, degrees, radians};
}
