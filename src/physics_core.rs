use crate::vector::Vector;

/// Shortest sub-step ever taken, so a frame always terminates.
pub const MIN_SUB_STEP: f64 = 1e-6;

/// Axis-aligned pixel rectangle; `origin` is the bottom-left pixel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PixelRect {
    pub origin: Vector<i32>,
    pub size: Vector<i32>,
}

impl PixelRect {
    pub fn new(origin: Vector<i32>, size: Vector<i32>) -> Self {
        Self { origin, size }
    }

    /// Inclusive top-right pixel.
    pub fn top_right(&self) -> Vector<i32> {
        Vector::new(
            self.origin.x + self.size.x - 1,
            self.origin.y + self.size.y - 1,
        )
    }

    pub fn overlaps(&self, other: &PixelRect) -> bool {
        let a = self.top_right();
        let b = other.top_right();
        !(a.x < other.origin.x || b.x < self.origin.x || a.y < other.origin.y || b.y < self.origin.y)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Kinematics {
    pub position: Vector<f64>,
    pub speed: Vector<f64>,
    pub acceleration: Vector<f64>,
}

/// Signed per-axis overlap of `other` as seen from `own`.
///
/// Per axis: when the obstacle starts at or below the actor's low edge the
/// value is the overlap measured from the low side (positive, capped at the
/// actor's extent); otherwise it is the negated overlap measured from the high
/// side. Disjoint rectangles yield zero on both axes.
pub fn kind_of_overlap(own: PixelRect, other: PixelRect) -> Vector<i32> {
    if !own.overlaps(&other) {
        return Vector::new(0, 0);
    }
    Vector::new(
        axis_overlap(own.origin.x, own.size.x, other.origin.x, other.size.x),
        axis_overlap(own.origin.y, own.size.y, other.origin.y, other.size.y),
    )
}

fn axis_overlap(own_low: i32, own_extent: i32, other_low: i32, other_extent: i32) -> i32 {
    if other_low <= own_low {
        own_extent.min(other_low + other_extent - own_low)
    } else {
        own_extent.min(other_low - own_low - own_extent)
    }
}

/// How a single blocking contact is corrected.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Blocking {
    None,
    /// Shift this many pixels horizontally and stop horizontal motion.
    Horizontal(i32),
    /// Shift this many pixels vertically and stop vertical motion.
    Vertical(i32),
    /// One pixel on both axes; decided after the unambiguous contacts.
    Corner,
}

pub fn classify_blocking(overlap: Vector<i32>) -> Blocking {
    if overlap.x == 0 || overlap.y == 0 {
        return Blocking::None;
    }
    if overlap.x.abs() == 1 && overlap.y.abs() == 1 {
        return Blocking::Corner;
    }
    if overlap.x.abs() == 1 {
        return Blocking::Horizontal(overlap.x);
    }
    if overlap.y.abs() == 1 || overlap.y == 2 {
        return Blocking::Vertical(vertical_shift(overlap.y));
    }
    Blocking::None
}

fn vertical_shift(overlap_y: i32) -> i32 {
    let correction = if overlap_y > 0 { -1 } else { 0 };
    overlap_y + correction
}

/// Corners under an actor that is not rising are treated as floor; any other
/// corner goes to the axis with the larger pre-collision speed, ties vertical.
fn corner_blocking(overlap: Vector<i32>, speed_before: Vector<f64>) -> Blocking {
    if overlap.y > 0 && speed_before.y <= 0.0 {
        return Blocking::Vertical(vertical_shift(overlap.y));
    }
    if speed_before.x.abs() > speed_before.y.abs() {
        Blocking::Horizontal(overlap.x)
    } else {
        Blocking::Vertical(vertical_shift(overlap.y))
    }
}

/// Applies blocking corrections against `obstacles` in order and returns the
/// number of corrections made. Overlaps are recomputed from the current
/// position before each obstacle. Ambiguous corners are only resolved when
/// nothing else was.
pub fn resolve_blocking(
    kinematics: &mut Kinematics,
    size: Vector<i32>,
    obstacles: &[PixelRect],
    meters_per_pixel: f64,
) -> usize {
    let speed_before = kinematics.speed;
    let mut corners = Vec::new();
    let mut resolved = 0;

    for obstacle in obstacles {
        let own = PixelRect::new(kinematics.position.to_pixels(meters_per_pixel), size);
        let blocking = classify_blocking(kind_of_overlap(own, *obstacle));
        if blocking == Blocking::Corner {
            corners.push(*obstacle);
            continue;
        }
        if apply_blocking(kinematics, blocking, meters_per_pixel) {
            resolved += 1;
        }
    }

    if resolved > 0 {
        return resolved;
    }
    for obstacle in corners {
        let own = PixelRect::new(kinematics.position.to_pixels(meters_per_pixel), size);
        let overlap = kind_of_overlap(own, obstacle);
        if classify_blocking(overlap) != Blocking::Corner {
            continue;
        }
        if apply_blocking(kinematics, corner_blocking(overlap, speed_before), meters_per_pixel) {
            resolved += 1;
        }
    }
    resolved
}

fn apply_blocking(kinematics: &mut Kinematics, blocking: Blocking, meters_per_pixel: f64) -> bool {
    match blocking {
        Blocking::Horizontal(px) => {
            kinematics.position = kinematics
                .position
                .add_x(f64::from(px) * meters_per_pixel);
            kinematics.speed = kinematics.speed.with_x(0.0);
            true
        }
        Blocking::Vertical(px) => {
            kinematics.position = kinematics
                .position
                .add_y(f64::from(px) * meters_per_pixel);
            kinematics.speed = kinematics.speed.with_y(0.0);
            true
        }
        Blocking::None | Blocking::Corner => false,
    }
}

/// True when `obstacle` supports `own` from below.
pub fn rests_on(own: PixelRect, obstacle: PixelRect) -> bool {
    kind_of_overlap(own, obstacle).y > 0
}

/// Longest interval over which neither axis moves more than one pixel,
/// capped by `remaining` and floored at [`MIN_SUB_STEP`].
pub fn sub_step_duration(kinematics: &Kinematics, remaining: f64, meters_per_pixel: f64) -> f64 {
    let limit = axis_time_limit(kinematics.speed.x, kinematics.acceleration.x, meters_per_pixel)
        .min(axis_time_limit(
            kinematics.speed.y,
            kinematics.acceleration.y,
            meters_per_pixel,
        ));
    limit.max(MIN_SUB_STEP).min(remaining)
}

/// Solves `|v|·t + ½|a|·t² = d` for `t`.
fn axis_time_limit(speed: f64, acceleration: f64, distance: f64) -> f64 {
    let v = speed.abs();
    let a = acceleration.abs();
    let denom = v + (v * v + 2.0 * a * distance).sqrt();
    if denom <= 0.0 {
        f64::INFINITY
    } else {
        2.0 * distance / denom
    }
}

/// Constant-acceleration update over `dt`.
pub fn integrate(kinematics: &Kinematics, dt: f64) -> Kinematics {
    let Kinematics {
        position,
        speed,
        acceleration,
    } = *kinematics;
    Kinematics {
        position: position + speed.scale(dt) + acceleration.scale(0.5 * dt * dt),
        speed: speed + acceleration.scale(dt),
        acceleration,
    }
}

pub fn clip_horizontal_speed(kinematics: &mut Kinematics, max_speed: f64) {
    kinematics.speed = kinematics
        .speed
        .with_x(kinematics.speed.x.clamp(-max_speed, max_speed));
}

/// Clamps the position to `[0, max]` per axis, cancelling outward speed.
/// Returns true when the actor dropped below the bottom edge.
pub fn clip_to_world(kinematics: &mut Kinematics, max: Vector<f64>) -> bool {
    let Vector { mut x, mut y } = kinematics.position;
    let Vector { x: mut vx, y: mut vy } = kinematics.speed;
    let mut fell_out = false;

    if x < 0.0 {
        x = 0.0;
        vx = vx.max(0.0);
    } else if x > max.x {
        x = max.x;
        vx = vx.min(0.0);
    }
    if y < 0.0 {
        y = 0.0;
        vy = vy.max(0.0);
        fell_out = true;
    } else if y > max.y {
        y = max.y;
        vy = vy.min(0.0);
    }

    kinematics.position = Vector::new(x, y);
    kinematics.speed = Vector::new(vx, vy);
    fell_out
}
