//! Geometric predicates for ball pivoting
//!
//! All computation is done in double precision. Degenerate configurations
//! (collinear points, obtuse triangles, balls that are too small) are reported
//! as `None`/`false` rather than as errors: they only narrow the search.

use meshbuild_core::{Point3d, Vector3d};
use std::f64::consts::TAU;

/// Angles this close to 0 or 2π are treated as "the same ball".
///
/// Loose enough to absorb the round-off of single precision input.
pub const COSPHERICAL_ANGLE: f64 = 1e-6;

/// Unnormalised normal of the triangle `(a, b, c)`
///
/// Equal to `(b - a) x (c - a)`, so it points to the side from which
/// `a -> b -> c` appears counter-clockwise.
#[inline]
pub fn face_normal(a: &Point3d, b: &Point3d, c: &Point3d) -> Vector3d {
    (b - a).cross(&(c - b))
}

/// Face normal flipped, if needed, to agree with `reference`
///
/// Returns `None` for degenerate (zero area) triangles.
pub fn oriented_normal(a: &Point3d, b: &Point3d, c: &Point3d, reference: &Vector3d) -> Option<Vector3d> {
    let normal = face_normal(a, b, c).try_normalize(f64::EPSILON)?;
    if normal.dot(reference) < 0.0 {
        Some(-normal)
    } else {
        Some(normal)
    }
}

/// Three oriented points are compatible when the normal of the face they form
/// has a positive dot product with each of their normals.
pub fn is_compatible(
    a: &Point3d,
    na: &Vector3d,
    b: &Point3d,
    nb: &Vector3d,
    c: &Point3d,
    nc: &Vector3d,
) -> bool {
    let normal = face_normal(a, b, c);
    normal.dot(na) > 0.0 && normal.dot(nb) > 0.0 && normal.dot(nc) > 0.0
}

/// Circumcenter of the triangle `(a, b, c)` and its squared circumradius
///
/// The barycentric weights are `a²(b²+c²-a²)` etc. over the squared opposite
/// edge lengths. Triangles with a weight outside `[0, 1]` (obtuse) or a zero
/// weight sum (degenerate) are rejected.
pub fn circumcenter(a: &Point3d, b: &Point3d, c: &Point3d) -> Option<(Point3d, f64)> {
    let la = (c - b).norm_squared();
    let lb = (a - c).norm_squared();
    let lc = (b - a).norm_squared();

    let alpha = la * (lb + lc - la);
    let beta = lb * (la + lc - lb);
    let gamma = lc * (la + lb - lc);
    let total = alpha + beta + gamma;
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let (alpha, beta, gamma) = (alpha / total, beta / total, gamma / total);
    let in_range = |w: f64| (0.0..=1.0).contains(&w);
    if !(in_range(alpha) && in_range(beta) && in_range(gamma)) {
        return None;
    }

    let center = Point3d::from(alpha * a.coords + beta * b.coords + gamma * c.coords);
    let sq_radius = (center - a).norm_squared();
    Some((center, sq_radius))
}

/// Center of the ball of `radius` resting on `a`, `b` and `c`
///
/// The circumcenter is lifted along the face normal, oriented to agree with
/// `na` (the normal of the first point), by `sqrt(radius² - circumradius²)`.
pub fn ball_center(a: &Point3d, na: &Vector3d, b: &Point3d, c: &Point3d, radius: f64) -> Option<Point3d> {
    let (circumcenter, sq_circumradius) = circumcenter(a, b, c)?;
    let height_sq = radius * radius - sq_circumradius;
    if height_sq < 0.0 {
        return None;
    }

    let normal = oriented_normal(a, b, c, na)?;
    Some(circumcenter + height_sq.sqrt() * normal)
}

/// Rotation, in `[0, 2π]`, that carries `old_center` onto `new_center` around
/// the line through `midpoint` with direction `axis`
///
/// Positive rotation follows the right-hand rule around `axis`. Both centers
/// are expected to be equidistant from the edge endpoints, i.e. to lie in the
/// plane through `midpoint` orthogonal to `axis`. Returns `None` if either
/// center lies on the axis point itself.
pub fn pivot_angle(
    midpoint: &Point3d,
    axis: &Vector3d,
    old_center: &Point3d,
    new_center: &Point3d,
) -> Option<f64> {
    let axis = axis.try_normalize(f64::EPSILON)?;
    let to_old = (old_center - midpoint).try_normalize(f64::EPSILON)?;
    let to_new = (new_center - midpoint).try_normalize(f64::EPSILON)?;

    let theta = to_old.cross(&to_new).dot(&axis).atan2(to_old.dot(&to_new));
    if theta < 0.0 {
        Some(theta + TAU)
    } else {
        Some(theta)
    }
}

/// Component of `v` orthogonal to the unit vector `axis`
#[inline]
pub fn reject_from(v: &Vector3d, axis: &Vector3d) -> Vector3d {
    v - axis * v.dot(axis)
}

/// Whether a triangle on edge `a-b` with third vertex `new` would lie on the
/// same side as the existing triangle with third vertex `existing`
///
/// Sides are compared in the plane orthogonal to the edge, so this also
/// catches folds sharper than a right angle on curved surfaces.
pub fn folds_onto(a: &Point3d, b: &Point3d, existing: &Point3d, new: &Point3d) -> bool {
    let Some(direction) = (b - a).try_normalize(f64::EPSILON) else {
        return false;
    };
    reject_from(&(existing - a), &direction).dot(&reject_from(&(new - a), &direction)) > 0.0
}

/// Whether `point` lies strictly inside the ball, with `tolerance` as a
/// fraction of the radius
#[inline]
pub fn strictly_inside(point: &Point3d, center: &Point3d, radius: f64, tolerance: f64) -> bool {
    let limit = radius * (1.0 - tolerance);
    (point - center).norm_squared() < limit * limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn up() -> Vector3d {
        Vector3d::z()
    }

    #[test]
    fn test_face_normal_is_ccw() {
        let n = face_normal(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(n, Vector3d::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_compatibility_depends_on_winding() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(0.0, 1.0, 0.0);
        assert!(is_compatible(&a, &up(), &b, &up(), &c, &up()));
        assert!(!is_compatible(&a, &up(), &c, &up(), &b, &up()));
    }

    #[test]
    fn test_compatibility_requires_every_normal() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(0.0, 1.0, 0.0);
        assert!(!is_compatible(&a, &up(), &b, &up(), &c, &-up()));
    }

    #[test]
    fn test_circumcenter_of_right_triangle() {
        let (center, sq_radius) = circumcenter(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(center, Point3d::new(0.5, 0.5, 0.0));
        assert_relative_eq!(sq_radius, 0.5);
    }

    #[test]
    fn test_circumcenter_rejects_obtuse_and_degenerate() {
        let obtuse = circumcenter(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(2.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.1, 0.0),
        );
        assert!(obtuse.is_none());

        let collinear = circumcenter(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(2.0, 0.0, 0.0),
        );
        assert!(collinear.is_none());

        let repeated = circumcenter(
            &Point3d::new(1.0, 1.0, 1.0),
            &Point3d::new(1.0, 1.0, 1.0),
            &Point3d::new(1.0, 1.0, 1.0),
        );
        assert!(repeated.is_none());
    }

    #[test]
    fn test_ball_center_is_lifted_along_reference_normal() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(0.0, 1.0, 0.0);

        let center = ball_center(&a, &up(), &b, &c, 0.8).unwrap();
        assert_relative_eq!(center.x, 0.5);
        assert_relative_eq!(center.y, 0.5);
        assert_relative_eq!(center.z, (0.64f64 - 0.5).sqrt(), epsilon = 1e-12);

        // Same points, reversed winding: the ball still sits on the normal side.
        let flipped = ball_center(&a, &up(), &c, &b, 0.8).unwrap();
        assert_relative_eq!(flipped, center, epsilon = 1e-12);

        let below = ball_center(&a, &-up(), &b, &c, 0.8).unwrap();
        assert!(below.z < 0.0);

        for p in [a, b, c] {
            assert_relative_eq!((center - p).norm(), 0.8, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ball_center_rejects_small_radius() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let c = Point3d::new(0.0, 1.0, 0.0);
        assert!(ball_center(&a, &up(), &b, &c, 0.5).is_none());
    }

    #[test]
    fn test_pivot_angle_half_rotations() {
        let m = Point3d::origin();
        let axis = Vector3d::x();
        let old = Point3d::new(0.0, 0.0, 1.0);

        // +90° around +x carries +z onto -y.
        let quarter = pivot_angle(&m, &axis, &old, &Point3d::new(0.0, -1.0, 0.0)).unwrap();
        assert_relative_eq!(quarter, FRAC_PI_2, epsilon = 1e-12);

        let three_quarters = pivot_angle(&m, &axis, &old, &Point3d::new(0.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(three_quarters, 3.0 * FRAC_PI_2, epsilon = 1e-12);

        let reversed = pivot_angle(&m, &-axis, &old, &Point3d::new(0.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(reversed, FRAC_PI_2, epsilon = 1e-12);

        let half = pivot_angle(&m, &axis, &old, &Point3d::new(0.0, 0.0, -2.0)).unwrap();
        assert_relative_eq!(half, PI, epsilon = 1e-12);

        assert!(pivot_angle(&m, &axis, &m, &old).is_none());
    }

    #[test]
    fn test_strictly_inside_uses_tolerance() {
        let center = Point3d::origin();
        assert!(strictly_inside(&Point3d::new(0.5, 0.0, 0.0), &center, 1.0, 1e-7));
        assert!(!strictly_inside(&Point3d::new(1.0, 0.0, 0.0), &center, 1.0, 1e-7));
        assert!(!strictly_inside(&Point3d::new(1.0 - 1e-12, 0.0, 0.0), &center, 1.0, 1e-7));
    }

    #[test]
    fn test_folds_onto_compares_sides_of_edge() {
        let a = Point3d::new(0.0, 0.0, 0.0);
        let b = Point3d::new(1.0, 0.0, 0.0);
        let existing = Point3d::new(0.5, 1.0, 0.0);
        assert!(folds_onto(&a, &b, &existing, &Point3d::new(0.2, 0.5, 0.0)));
        assert!(!folds_onto(&a, &b, &existing, &Point3d::new(0.5, -1.0, 0.0)));
        // A gentle bend across the edge is not a fold.
        assert!(!folds_onto(&a, &b, &existing, &Point3d::new(0.5, -1.0, 0.5)));
    }

    #[test]
    fn test_reject_from_removes_axis_component() {
        let v = Vector3d::new(1.0, 2.0, 3.0);
        let r = reject_from(&v, &Vector3d::y());
        assert_relative_eq!(r, Vector3d::new(1.0, 0.0, 3.0));
    }
}
