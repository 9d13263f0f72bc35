use cgmath::*;

/// Maps OpenGL clip-space depth (-1..1) onto the 0..1 range wgpu expects
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// A camera looking from `eye` towards `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new(eye: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            eye,
            target,
            up: Vector3::unit_y(),
        }
    }

    /// Right-handed view matrix
    pub fn look_at(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(fovy: Deg<f32>, width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            fovy,
            aspect: aspect_ratio(width, height),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// Perspective matrix with wgpu's depth range
    pub fn matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_moves_target_onto_negative_z() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 5.0), Point3::origin());
        let target = camera.look_at() * Point3::origin().to_homogeneous();
        assert!((target.z + 5.0).abs() < 1e-5);
        assert!(target.x.abs() < 1e-5 && target.y.abs() < 1e-5);
    }

    #[test]
    fn test_depth_range_is_zero_to_one() {
        let projection = Projection::new(Deg(60.0), 800, 600, 0.1, 1000.0);
        let near = projection.matrix() * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = projection.matrix() * Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_height_does_not_divide_by_zero() {
        let mut projection = Projection::new(Deg(60.0), 800, 600, 0.1, 1000.0);
        projection.resize(640, 0);
        assert_eq!(projection.aspect, 640.0);
    }
}
