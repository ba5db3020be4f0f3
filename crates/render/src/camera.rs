use crate::renderer::ProjectionCamera;
use glam::{Mat4, Vec3};

/// Perspective fly camera with a cached projection matrix.
///
/// `aspect` is kept in f64 so it holds exactly what the resize pipeline wrote;
/// it is narrowed to f32 only when the projection is rebuilt.
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
    aspect: f64,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 4.0, 8.0),
            yaw: -90.0_f32.to_radians(),
            pitch: -25.0_f32.to_radians(),
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            speed: 5.0,
            sensitivity: 0.003,
            aspect: 16.0 / 9.0,
            projection: Mat4::IDENTITY,
        };
        camera.recompute_projection();
        camera
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f64, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            ..Self::default()
        };
        camera.recompute_projection();
        camera
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Move along the local axes: `x` right, `y` up, `z` forward.
    pub fn translate_local(&mut self, axes: Vec3, dt: f32) {
        let step = self.speed * dt;
        self.position += self.right() * axes.x * step;
        self.position.y += axes.y * step;
        self.position += self.forward() * axes.z * step;
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    /// Projection as of the last `recompute_projection` call.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

impl ProjectionCamera for PerspectiveCamera {
    fn aspect(&self) -> f64 {
        self.aspect
    }

    fn set_aspect(&mut self, aspect: f64) {
        self.aspect = aspect;
    }

    fn recompute_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov, self.aspect as f32, self.near, self.far);
        tracing::trace!(aspect = self.aspect, "projection recomputed");
    }
}
