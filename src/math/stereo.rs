use glam::{Mat4, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoParameters {
    pub convergence: f32,
    pub eye_separation: f32,
    pub aspect_ratio: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Frustum {
    pub fn for_eye(params: &StereoParameters, eye: Eye) -> Self {
        let top = params.near * (params.fov / 2.0).tan();
        let bottom = -top;

        let a = params.aspect_ratio * (params.fov / 2.0).tan() * params.convergence;
        let b = a - params.eye_separation / 2.0;
        let c = a + params.eye_separation / 2.0;

        let (left, right) = match eye {
            Eye::Left => (
                (-b * params.near) / params.convergence,
                (c * params.near) / params.convergence,
            ),
            Eye::Right => (
                (-c * params.near) / params.convergence,
                (b * params.near) / params.convergence,
            ),
        };

        Self {
            left,
            right,
            bottom,
            top,
            near: params.near,
            far: params.far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        frustum(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}

pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let dx = right - left;
    let dy = top - bottom;
    let dz = far - near;

    Mat4::from_cols(
        Vec4::new(2.0 * near / dx, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / dy, 0.0, 0.0),
        Vec4::new((left + right) / dx, (top + bottom) / dy, -(far + near) / dz, -1.0),
        Vec4::new(0.0, 0.0, -2.0 * near * far / dz, 0.0),
    )
}

#[derive(Debug, Clone)]
pub struct StereoCamera {
    pub params: StereoParameters,
    projection: Mat4,
}

impl StereoCamera {
    pub fn new(params: StereoParameters) -> Self {
        Self {
            params,
            projection: Mat4::IDENTITY,
        }
    }

    pub fn apply_left_frustum(&mut self) {
        self.apply(Eye::Left);
    }

    pub fn apply_right_frustum(&mut self) {
        self.apply(Eye::Right);
    }

    fn apply(&mut self, eye: Eye) {
        self.projection = Frustum::for_eye(&self.params, eye).matrix();
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    // Both eyes displace the world by +separation/2; the mirrored shift for
    // the right eye was never applied upstream and is kept that way. Drawing
    // does not consume this matrix.
    #[cfg(test)]
    pub fn model_view_matrix(&self) -> Mat4 {
        Mat4::from_translation(glam::Vec3::new(self.params.eye_separation / 2.0, 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StereoParameters {
        StereoParameters {
            convergence: 10.0,
            eye_separation: 0.1,
            aspect_ratio: 1.3,
            fov: 0.5,
            near: 5.0,
            far: 20000.0,
        }
    }

    fn mat_close(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn eye_frustums_mirror_around_axis() {
        let left = Frustum::for_eye(&params(), Eye::Left);
        let right = Frustum::for_eye(&params(), Eye::Right);

        assert!((left.left + right.right).abs() < 1e-6);
        assert!((left.right + right.left).abs() < 1e-6);
        assert_eq!(left.top, right.top);
        assert_eq!(left.bottom, -left.top);
        // the shift makes each frustum asymmetric
        assert!(left.right > -left.left);
        assert!(-right.left > right.right);
    }

    #[test]
    fn zero_separation_matches_symmetric_perspective() {
        let p = StereoParameters {
            eye_separation: 0.0,
            ..params()
        };
        let m = Frustum::for_eye(&p, Eye::Left).matrix();
        let expected = Mat4::perspective_rh_gl(p.fov, p.aspect_ratio, p.near, p.far);
        assert!(mat_close(m, expected));
    }

    #[test]
    fn asymmetric_frustum_shifts_third_column() {
        let m = frustum(-1.0, 3.0, -1.0, 1.0, 1.0, 10.0);
        assert_eq!(m.z_axis.x, 0.5);
        assert_eq!(m.z_axis.y, 0.0);
        assert_eq!(m.z_axis.w, -1.0);
        assert_eq!(m.x_axis.x, 0.5);
    }

    #[test]
    fn applying_eyes_overwrites_current_projection() {
        let mut cam = StereoCamera::new(params());

        cam.apply_left_frustum();
        let left = cam.projection_matrix();
        cam.apply_right_frustum();
        let right = cam.projection_matrix();

        assert_ne!(left, right);
        assert!(mat_close(left, Frustum::for_eye(&params(), Eye::Left).matrix()));
        assert!(mat_close(right, Frustum::for_eye(&params(), Eye::Right).matrix()));
        // horizontal skew terms are mirror images
        assert!((left.z_axis.x + right.z_axis.x).abs() < 1e-6);
    }

    #[test]
    fn same_parameters_give_identical_matrices() {
        let mut a = StereoCamera::new(params());
        let mut b = StereoCamera::new(params());
        a.apply_left_frustum();
        a.apply_right_frustum();
        a.apply_left_frustum();
        b.apply_left_frustum();
        assert_eq!(a.projection_matrix(), b.projection_matrix());
    }

    #[test]
    fn both_eyes_translate_by_half_separation() {
        let mut cam = StereoCamera::new(params());
        cam.apply_left_frustum();
        let left = cam.model_view_matrix();
        cam.apply_right_frustum();
        let right = cam.model_view_matrix();

        assert_eq!(left, right);
        assert_eq!(left.w_axis.x, 0.05);
    }
}
