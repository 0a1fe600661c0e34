// Dome projection: pure math mapping flat tracked positions onto the inside
// of the hemispherical projection dome.

use glam::{Vec2, Vec3};

/// Projection config for the playsphere.
#[derive(Debug, Clone, Copy)]
pub struct DomeProjection {
    /// Per-axis normalization bounds for flat input. Both components must be
    /// nonzero; a zero component yields NaN output (config error, not a
    /// runtime state).
    pub max_size: Vec2,

    /// Exponent reshaping radial falloff. Values below 1 push positions
    /// toward the rim of the dome, thinning the crowd at the apex.
    pub push_towards_bottom: f32,

    /// Angular spread of the playfield in degrees of polar angle.
    pub max_degrees: f32,

    /// Radius of the playsphere where players and props live.
    pub sphere_radius: f32,

    /// Floor clamp for projected positions.
    pub min_y: f32,

    /// World position of the dome center.
    pub origin: Vec3,
}

impl Default for DomeProjection {
    fn default() -> Self {
        Self {
            max_size: Vec2::ONE,
            push_towards_bottom: 0.5,
            max_degrees: 210.0,
            sphere_radius: 10.0,
            min_y: 0.0,
            origin: Vec3::ZERO,
        }
    }
}

impl DomeProjection {
    /// Projects a flat position (symmetric tracking range) onto the dome.
    ///
    /// Deterministic: the same input and config always produce the same
    /// point. Before the origin translation and floor clamp the result lies
    /// exactly on the sphere of radius `sphere_radius`; the tracking-range
    /// center lands on the zenith.
    pub fn project(&self, flat: Vec2) -> Vec3 {
        let n = flat / self.max_size;
        let l = n.length().powf(self.push_towards_bottom);
        let azimuth = n.y.atan2(n.x);
        // Polar angle measured down from the zenith (+Y).
        let angle_down = l * (self.max_degrees / 360.0) * std::f32::consts::TAU;

        let mut p = spherical_to_cartesian(self.sphere_radius, azimuth, angle_down) + self.origin;
        p.y = p.y.clamp(self.min_y, self.sphere_radius);
        p
    }
}

/// Converts (radius, azimuth, polar-from-zenith) to Cartesian coordinates.
pub fn spherical_to_cartesian(radius: f32, azimuth: f32, polar: f32) -> Vec3 {
    let a = radius * polar.sin();
    Vec3::new(a * azimuth.cos(), radius * polar.cos(), a * azimuth.sin())
}

/// Remaps camera-pixel coordinates into the symmetric tracking range.
pub fn remap_camera(raw: Vec2, resolution: f32, remap: Vec2) -> Vec2 {
    let t = raw / resolution;
    Vec2::new(lerp(-remap.x, remap.x, t.x), lerp(-remap.y, remap.y, t.y))
}

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
