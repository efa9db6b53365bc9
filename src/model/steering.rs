//! Movement-vector blending.
//!
//! All directed movement (seeking food, fleeing predators, avoiding
//! crowding) goes through [`steer`]: every sensed point of interest carries a
//! signed weight, each contribution is scaled by 1/distance so nearer points
//! dominate, and the blended sum is renormalized to the per-tick speed
//! budget. Wandering when nothing is sensed is a separate fallback,
//! [`random_step`].

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance_to(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len == 0.0 {
            None
        } else {
            Some(Vec2::new(self.x / len, self.y / len))
        }
    }

    pub fn scaled(self, factor: f64) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One sensed point of interest. Positive weights attract, negative repel.
#[derive(Debug, Clone, Copy)]
pub struct Interest {
    pub point: Vec2,
    pub weight: f64,
}

impl Interest {
    pub fn new(point: Vec2, weight: f64) -> Self {
        Self { point, weight }
    }
}

/// Blends the interests into one displacement of magnitude `speed`.
///
/// Each interest contributes `unit_direction * weight / distance`, so two
/// equally weighted points pull proportionally harder the nearer they are. A
/// point coincident with `from` is skipped outright (there is no direction
/// to it). A sum that cancels to zero yields no movement rather than an
/// arbitrary direction; the exact-cancellation case is load-bearing for
/// callers that treat "no displacement" as "nothing worth moving for".
pub fn steer(from: Vec2, speed: f64, interests: &[Interest]) -> Vec2 {
    let mut sum = Vec2::ZERO;
    for interest in interests {
        let offset = interest.point - from;
        let distance = offset.length();
        if distance == 0.0 {
            continue;
        }
        let unit = offset.scaled(1.0 / distance);
        sum += unit.scaled(interest.weight / distance);
    }
    match sum.normalized() {
        Some(direction) => direction.scaled(speed),
        None => Vec2::ZERO,
    }
}

/// Fallback wander: one axis-aligned step of length `speed` in a uniformly
/// random cardinal direction. Used only when no point of interest exists.
pub fn random_step<R: Rng>(rng: &mut R, speed: f64) -> Vec2 {
    match rng.gen_range(0..4u8) {
        0 => Vec2::new(0.0, -speed),
        1 => Vec2::new(speed, 0.0),
        2 => Vec2::new(-speed, 0.0),
        _ => Vec2::new(0.0, speed),
    }
}
