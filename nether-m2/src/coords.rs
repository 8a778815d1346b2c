//! Axis remap from the file's Z-up convention to the Y-up convention used by
//! decoded documents. Swapping the 2nd and 3rd components is an involution.

use glam::{Quat, Vec3};

/// `(x, y, z)` -> `(x, z, y)`
#[inline]
pub fn remap_vec3(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// `(x, y, z, w)` -> `(x, z, y, w)`, normalized.
///
/// Degenerate (zero-length) rotations decode as identity.
#[inline]
pub fn remap_quat(q: Quat) -> Quat {
    let swapped = Quat::from_xyzw(q.x, q.z, q.y, q.w);
    if swapped.length_squared() > f32::EPSILON {
        swapped.normalize()
    } else {
        Quat::IDENTITY
    }
}
