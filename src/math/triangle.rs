use super::{Point3, Vector3, TOLERANCE};

/// Normal used for triangles whose area vanishes: `(0, 0, 1)`.
#[must_use]
pub fn fallback_normal() -> Vector3 {
    Vector3::z()
}

/// Returns the unit normal of triangle `(a, b, c)` following its winding.
///
/// Zero-area triangles (coincident or collinear points) yield
/// [`fallback_normal`] instead of a NaN vector.
#[must_use]
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Vector3 {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len < TOLERANCE || !len.is_finite() {
        return fallback_normal();
    }
    n / len
}

/// Returns the area of triangle `(a, b, c)`.
#[must_use]
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Returns the lengths of edges `ab`, `bc` and `ca`.
#[must_use]
pub fn edge_lengths(tri: &[Point3; 3]) -> [f64; 3] {
    [
        (tri[1] - tri[0]).norm(),
        (tri[2] - tri[1]).norm(),
        (tri[0] - tri[2]).norm(),
    ]
}
