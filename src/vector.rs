use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

/// Slack added before flooring meters to pixels so that values such as
/// `0.69 / 0.01 = 68.99999999999999` land on the intended pixel.
const PIXEL_EPSILON: f64 = 1e-6;

/// Immutable two-component vector used for meters (`f64`) and pixels (`i32`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Serialize, Deserialize)]
pub struct Vector<T> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> Vector<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn with_x(self, x: T) -> Self {
        Self { x, y: self.y }
    }

    pub fn with_y(self, y: T) -> Self {
        Self { x: self.x, y }
    }
}

impl<T: Copy + Add<Output = T>> Vector<T> {
    pub fn add_x(self, dx: T) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
        }
    }

    pub fn add_y(self, dy: T) -> Self {
        Self {
            x: self.x,
            y: self.y + dy,
        }
    }
}

impl<T: Copy + Mul<Output = T>> Vector<T> {
    pub fn scale(self, factor: T) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl<T: Copy + Add<Output = T>> Add for Vector<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T: Copy + Mul<Output = T>> Mul<T> for Vector<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        self.scale(rhs)
    }
}

impl Vector<f64> {
    pub fn to_pixels(self, meters_per_pixel: f64) -> Vector<i32> {
        Vector::new(
            meters_to_pixels(self.x, meters_per_pixel),
            meters_to_pixels(self.y, meters_per_pixel),
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Vector<i32> {
    pub fn to_meters(self, meters_per_pixel: f64) -> Vector<f64> {
        Vector::new(
            f64::from(self.x) * meters_per_pixel,
            f64::from(self.y) * meters_per_pixel,
        )
    }
}

pub fn meters_to_pixels(meters: f64, meters_per_pixel: f64) -> i32 {
    (meters / meters_per_pixel + PIXEL_EPSILON).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_setters_return_new_vectors() {
        let v = Vector::new(1, 2);
        assert_eq!(v.with_x(5), Vector::new(5, 2));
        assert_eq!(v.with_y(7), Vector::new(1, 7));
        assert_eq!(v.add_x(3).add_y(-2), Vector::new(4, 0));
        assert_eq!(v, Vector::new(1, 2));
    }

    #[test]
    fn add_and_scale_work_for_reals() {
        let v = Vector::new(0.5, -1.0) + Vector::new(0.25, 2.0);
        assert_eq!(v, Vector::new(0.75, 1.0));
        assert_eq!(v.scale(2.0), Vector::new(1.5, 2.0));
        assert_eq!(Vector::new(3, -4) * -1, Vector::new(-3, 4));
    }

    #[test]
    fn meter_conversion_survives_float_noise() {
        assert_eq!(meters_to_pixels(0.69, 0.01), 69);
        assert_eq!(meters_to_pixels(0.29, 0.01), 29);
        assert_eq!(meters_to_pixels(0.0, 0.01), 0);
        assert_eq!(Vector::new(1.4, 0.7).to_pixels(0.01), Vector::new(140, 70));
        let back = Vector::new(70, 35).to_meters(0.01);
        assert!((back.x - 0.7).abs() < 1e-12);
        assert!((back.y - 0.35).abs() < 1e-12);
    }
}
