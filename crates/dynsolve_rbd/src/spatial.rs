//! Spatial (6D) vector algebra in Featherstone's convention.
//!
//! Motion vectors are laid out `[angular; linear]`, force vectors `[moment; force]`.
//! A [`Transform`] `X` maps motion from a parent frame into a child frame:
//! `rotation` is the coordinate rotation `E` (parent → child) and `translation`
//! is the child origin expressed in parent coordinates.

use crate::traits::Scalar;
use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};
use std::ops::{Add, Sub};

/// Cross-product matrix `[v]x` such that `[v]x * w == v x w`.
pub fn skew<T: Scalar>(v: &Vector3<T>) -> Matrix3<T> {
    let z = T::zero();
    Matrix3::new(z, -v[2], v[1], v[2], z, -v[0], -v[1], v[0], z)
}

/// Rotation matrix about a unit `axis` given the cosine and sine of the angle.
pub fn axis_rotation<T: Scalar>(axis: &Vector3<T>, cos: T, sin: T) -> Matrix3<T> {
    let k = skew(axis);
    Matrix3::identity() + k * sin + (k * k) * (T::one() - cos)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion<T: Scalar> {
    pub angular: Vector3<T>,
    pub linear: Vector3<T>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force<T: Scalar> {
    pub moment: Vector3<T>,
    pub force: Vector3<T>,
}

impl<T: Scalar> Motion<T> {
    pub fn new(angular: Vector3<T>, linear: Vector3<T>) -> Self {
        Self { angular, linear }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    pub fn scale(&self, s: T) -> Self {
        Self::new(self.angular * s, self.linear * s)
    }

    /// Spatial motion cross product `self x m`.
    pub fn cross_motion(&self, m: &Motion<T>) -> Motion<T> {
        Motion::new(
            self.angular.cross(&m.angular),
            self.angular.cross(&m.linear) + self.linear.cross(&m.angular),
        )
    }

    /// Spatial force cross product `self x* f`.
    pub fn cross_force(&self, f: &Force<T>) -> Force<T> {
        Force::new(
            self.angular.cross(&f.moment) + self.linear.cross(&f.force),
            self.angular.cross(&f.force),
        )
    }

    /// Power pairing `m . f`.
    pub fn dot(&self, f: &Force<T>) -> T {
        self.angular.dot(&f.moment) + self.linear.dot(&f.force)
    }

    pub fn to_vector(&self) -> Vector6<T> {
        let (w, v) = (&self.angular, &self.linear);
        Vector6::new(w[0], w[1], w[2], v[0], v[1], v[2])
    }

    pub fn from_vector(v: &Vector6<T>) -> Self {
        Self::new(
            Vector3::new(v[0], v[1], v[2]),
            Vector3::new(v[3], v[4], v[5]),
        )
    }
}

impl<T: Scalar> Force<T> {
    pub fn new(moment: Vector3<T>, force: Vector3<T>) -> Self {
        Self { moment, force }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    pub fn to_vector(&self) -> Vector6<T> {
        let (n, f) = (&self.moment, &self.force);
        Vector6::new(n[0], n[1], n[2], f[0], f[1], f[2])
    }

    pub fn from_vector(v: &Vector6<T>) -> Self {
        Self::new(
            Vector3::new(v[0], v[1], v[2]),
            Vector3::new(v[3], v[4], v[5]),
        )
    }
}

impl<T: Scalar> Add for Motion<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

impl<T: Scalar> Sub for Motion<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.angular - rhs.angular, self.linear - rhs.linear)
    }
}

impl<T: Scalar> Add for Force<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.moment + rhs.moment, self.force + rhs.force)
    }
}

impl<T: Scalar> Sub for Force<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.moment - rhs.moment, self.force - rhs.force)
    }
}

/// Plücker transform from a parent frame to a child frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform<T: Scalar> {
    pub rotation: Matrix3<T>,
    pub translation: Vector3<T>,
}

impl<T: Scalar> Transform<T> {
    pub fn new(rotation: Matrix3<T>, translation: Vector3<T>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    pub fn from_rotation(rotation: Matrix3<T>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    pub fn from_translation(translation: Vector3<T>) -> Self {
        Self::new(Matrix3::identity(), translation)
    }

    /// `self * inner`: first `inner` (A -> B), then `self` (B -> C).
    pub fn compose(&self, inner: &Transform<T>) -> Transform<T> {
        Transform::new(
            self.rotation * inner.rotation,
            inner.translation + inner.rotation.transpose() * self.translation,
        )
    }

    /// Parent-frame motion expressed in the child frame.
    pub fn apply_motion(&self, m: &Motion<T>) -> Motion<T> {
        Motion::new(
            self.rotation * m.angular,
            self.rotation * (m.linear - self.translation.cross(&m.angular)),
        )
    }

    /// Child-frame force expressed in the parent frame (`X^T f`).
    pub fn inv_apply_force(&self, f: &Force<T>) -> Force<T> {
        let force = self.rotation.transpose() * f.force;
        Force::new(
            self.rotation.transpose() * f.moment + self.translation.cross(&force),
            force,
        )
    }

    /// Dense 6x6 motion transform `[E 0; -E[r]x E]`.
    pub fn motion_matrix(&self) -> Matrix6<T> {
        let e = self.rotation;
        let lower = -(e * skew(&self.translation));
        let mut x = Matrix6::zeros();
        x.fixed_view_mut::<3, 3>(0, 0).copy_from(&e);
        x.fixed_view_mut::<3, 3>(3, 0).copy_from(&lower);
        x.fixed_view_mut::<3, 3>(3, 3).copy_from(&e);
        x
    }

    pub fn cast<U: Scalar>(&self) -> Transform<U>
    where
        T: Into<f64>,
    {
        Transform::new(
            self.rotation.map(|v| U::from_f64(v.into())),
            self.translation.map(|v| U::from_f64(v.into())),
        )
    }
}

/// Rigid-body inertia: mass, centre of mass and rotational inertia about the centre of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inertia<T: Scalar> {
    pub mass: T,
    pub com: Vector3<T>,
    pub rotational: Matrix3<T>,
}

impl<T: Scalar> Inertia<T> {
    pub fn new(mass: T, com: Vector3<T>, rotational: Matrix3<T>) -> Self {
        Self {
            mass,
            com,
            rotational,
        }
    }

    pub fn zero() -> Self {
        Self::new(T::zero(), Vector3::zeros(), Matrix3::zeros())
    }

    /// Momentum `I * m`.
    pub fn mul_motion(&self, m: &Motion<T>) -> Force<T> {
        let v_com = m.linear - self.com.cross(&m.angular);
        Force::new(
            self.rotational * m.angular + self.com.cross(&v_com) * self.mass,
            v_com * self.mass,
        )
    }

    pub fn to_matrix(&self) -> Matrix6<T> {
        let c = skew(&self.com);
        let mc = c * self.mass;
        let upper_left = self.rotational - mc * c;
        let mut out = Matrix6::zeros();
        out.fixed_view_mut::<3, 3>(0, 0).copy_from(&upper_left);
        out.fixed_view_mut::<3, 3>(0, 3).copy_from(&mc);
        out.fixed_view_mut::<3, 3>(3, 0).copy_from(&(-mc));
        out.fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(Matrix3::identity() * self.mass));
        out
    }

    pub fn cast<U: Scalar>(&self) -> Inertia<U>
    where
        T: Into<f64>,
    {
        Inertia::new(
            U::from_f64(self.mass.into()),
            self.com.map(|v| U::from_f64(v.into())),
            self.rotational.map(|v| U::from_f64(v.into())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_transform() -> Transform<f64> {
        let axis = Vector3::new(1.0, 2.0, -0.5).normalize();
        let (s, c) = 0.8_f64.sin_cos();
        Transform::new(
            axis_rotation(&axis, c, s).transpose(),
            Vector3::new(0.3, -0.2, 1.1),
        )
    }

    #[test]
    fn motion_matrix_matches_apply_motion() {
        let x = sample_transform();
        let m = Motion::new(Vector3::new(0.1, -0.4, 0.9), Vector3::new(1.0, 0.5, -2.0));
        let dense = x.motion_matrix() * m.to_vector();
        assert_relative_eq!(dense, x.apply_motion(&m).to_vector(), epsilon = 1e-12);
    }

    #[test]
    fn inverse_force_transform_is_motion_matrix_transpose() {
        let x = sample_transform();
        let f = Force::new(Vector3::new(-0.3, 0.2, 0.7), Vector3::new(2.0, 1.0, 0.25));
        let dense = x.motion_matrix().transpose() * f.to_vector();
        assert_relative_eq!(dense, x.inv_apply_force(&f).to_vector(), epsilon = 1e-12);
    }

    #[test]
    fn compose_matches_matrix_product() {
        let a = sample_transform();
        let b = Transform::new(
            axis_rotation(&Vector3::z(), 0.2_f64.cos(), 0.2_f64.sin()),
            Vector3::new(-1.0, 0.0, 0.4),
        );
        let composed = b.compose(&a).motion_matrix();
        assert_relative_eq!(composed, b.motion_matrix() * a.motion_matrix(), epsilon = 1e-12);
    }

    #[test]
    fn inertia_matrix_matches_mul_motion() {
        let inertia = Inertia::new(
            2.5,
            Vector3::new(0.1, -0.3, 0.2),
            Matrix3::from_diagonal(&Vector3::new(0.4, 0.5, 0.6)),
        );
        let m = Motion::new(Vector3::new(0.3, 0.1, -0.2), Vector3::new(-1.0, 2.0, 0.5));
        assert_relative_eq!(
            inertia.to_matrix() * m.to_vector(),
            inertia.mul_motion(&m).to_vector(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn power_is_invariant_under_transform() {
        let x = sample_transform();
        let m = Motion::new(Vector3::new(0.3, 0.1, -0.2), Vector3::new(-1.0, 2.0, 0.5));
        let f_child = Force::new(Vector3::new(0.5, 0.0, 1.0), Vector3::new(0.0, -3.0, 0.1));
        let child_power = x.apply_motion(&m).dot(&f_child);
        let parent_power = m.dot(&x.inv_apply_force(&f_child));
        assert!((child_power - parent_power).abs() < 1e-12);
    }
}
