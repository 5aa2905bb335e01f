//! Rays and the sphere intersection test used by hitscan queries

use crate::vector::Vec3;

/// 3D ray for intersection testing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Create a ray from two points
    #[inline]
    pub fn from_points(start: Vec3, end: Vec3) -> Self {
        Self::new(start, end - start)
    }

    /// Get a point at distance t along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Get the closest point on the ray to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let t = (point - self.origin).dot(self.direction);
        if t <= 0.0 {
            self.origin
        } else {
            self.at(t)
        }
    }
}

/// Ray-Sphere intersection with center and radius.
///
/// Returns the nearest positive distance along the ray.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let a = ray.direction.dot(ray.direction);
    if a <= 0.0 {
        return None;
    }
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = (-b - sqrt_d) / (2.0 * a);
    let t2 = (-b + sqrt_d) / (2.0 * a);

    if t1 > 0.0 {
        Some(t1)
    } else if t2 > 0.0 {
        Some(t2)
    } else {
        None
    }
}

/// Ray-Sphere intersection returning distance and surface normal
pub fn ray_sphere_with_normal(ray: &Ray, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let t = ray_sphere(ray, center, radius)?;
    let normal = (ray.at(t) - center).normalize_or_zero();
    Some((t, normal))
}

/// Ray-plane intersection
pub fn ray_plane(ray: &Ray, plane_point: Vec3, plane_normal: Vec3) -> Option<f32> {
    let denom = plane_normal.dot(ray.direction);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(ray.at(2.0), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_ray_sphere_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let (t, normal) = ray_sphere_with_normal(&ray, Vec3::new(0.0, 0.0, 10.0), 1.0).unwrap();
        assert_relative_eq!(t, 9.0, epsilon = 1e-5);
        assert_relative_eq!(normal.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_sphere_behind() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(ray_sphere(&ray, Vec3::new(0.0, 0.0, -10.0), 1.0).is_none());
    }

    #[test]
    fn test_ray_plane() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let t = ray_plane(&ray, Vec3::ZERO, Vec3::UP).unwrap();
        assert_relative_eq!(t, 5.0);
    }
}
