use nalgebra::{Translation3, Unit};

use super::{Isometry3, Point3, Rotation, Vector3, TOLERANCE};

/// Signed angle from `a` to `b` measured around `axis`.
///
/// Computed as `atan2(axis · (a × b), a · b)`, so the sign follows the
/// right-hand rule about `axis`. Returns `0.0` when either vector vanishes.
#[must_use]
pub fn signed_angle(a: &Vector3, b: &Vector3, axis: &Vector3) -> f64 {
    if a.norm() < TOLERANCE || b.norm() < TOLERANCE {
        return 0.0;
    }
    let angle = axis.dot(&a.cross(b)).atan2(a.dot(b));
    if angle.is_finite() {
        angle
    } else {
        0.0
    }
}

/// Removes the component of `v` along the unit vector `axis`.
#[must_use]
pub fn project_onto_plane(v: &Vector3, axis: &Vector3) -> Vector3 {
    v - axis * v.dot(axis)
}

/// Returns some unit vector perpendicular to the unit vector `v`.
#[must_use]
pub fn any_perpendicular(v: &Vector3) -> Vector3 {
    // Choose a reference vector not parallel to v
    let reference = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&reference).normalize()
}

/// Shortest-arc rotation taking direction `from` onto direction `to`.
///
/// Opposite directions get a half turn about an arbitrary perpendicular
/// axis; zero-length inputs give the identity.
#[must_use]
pub fn shortest_arc(from: &Vector3, to: &Vector3) -> Rotation {
    if from.norm() < TOLERANCE || to.norm() < TOLERANCE {
        return Rotation::identity();
    }
    let from = from.normalize();
    let to = to.normalize();
    if let Some(rot) = Rotation::rotation_between(&from, &to) {
        return rot;
    }
    if from.dot(&to) < 0.0 {
        let axis = Unit::new_unchecked(any_perpendicular(&from));
        Rotation::from_axis_angle(&axis, std::f64::consts::PI)
    } else {
        Rotation::identity()
    }
}

/// Rigid rotation by `angle` radians about the line through `origin`
/// with direction `axis`.
///
/// A zero-length axis yields the identity.
#[must_use]
pub fn rotation_about_axis(origin: &Point3, axis: &Vector3, angle: f64) -> Isometry3 {
    let len = axis.norm();
    if len < TOLERANCE {
        return Isometry3::identity();
    }
    let axis = Unit::new_unchecked(axis / len);
    let rot = Rotation::from_axis_angle(&axis, angle);

    // Translate to origin, rotate, translate back
    Translation3::from(origin.coords) * rot * Translation3::from(-origin.coords)
}
