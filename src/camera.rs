//! Perspective camera, its GPU uniform and an orbit controller.
//!
//! The camera looks from `position` at `target`. [`Projection`] only depends on
//! the viewport aspect ratio and is updated by the resize path. The
//! [`OrbitController`] collects mouse input between frames and applies it in
//! [`OrbitController::update`]: left-drag orbits, right-drag pans and the wheel
//! dollies towards or away from the target.

use std::f32::consts::PI;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector2, Vector3};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Initial camera placement and lens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 15.0, 35.0),
            target: Point3::new(0.0, 0.0, 0.0),
            fovy: Deg(75.0),
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

impl From<&CameraSettings> for Camera {
    fn from(settings: &CameraSettings) -> Self {
        Camera::new(settings.position, settings.target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(aspect: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        Self::new(aspect, settings.fovy, settings.znear, settings.zfar)
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Mouse driven orbit around the camera target.
#[derive(Debug)]
pub struct OrbitController {
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    drag: Option<Drag>,
    cursor: Option<PhysicalPosition<f64>>,
    rotate: Vector2<f32>,
    pan: Vector2<f32>,
    zoom: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const MIN_POLAR: f32 = 1e-3;

impl OrbitController {
    pub fn new(rotate_speed: f32, pan_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            pan_speed,
            zoom_speed,
            min_distance: 1.0,
            max_distance: 100.0,
            drag: None,
            cursor: None,
            rotate: Vector2::new(0.0, 0.0),
            pan: Vector2::new(0.0, 0.0),
            zoom: 0.0,
        }
    }

    /// Collects input; returns whether the event was used.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let drag = match button {
                    MouseButton::Left => Drag::Rotate,
                    MouseButton::Right => Drag::Pan,
                    _ => return false,
                };
                self.drag = match state {
                    ElementState::Pressed => Some(drag),
                    ElementState::Released => None,
                };
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                match (self.drag, previous) {
                    (Some(drag), Some(previous)) => {
                        let delta = Vector2::new(
                            (position.x - previous.x) as f32,
                            (position.y - previous.y) as f32,
                        );
                        match drag {
                            Drag::Rotate => self.rotate += delta,
                            Drag::Pan => self.pan += delta,
                        }
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.drag = None;
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.zoom += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                true
            }
            _ => false,
        }
    }

    /// Applies the input collected since the last frame.
    ///
    /// `viewport_height` is the surface height in pixels; drags across the full
    /// height turn the camera by one full revolution.
    pub fn update(&mut self, camera: &mut Camera, projection: &Projection, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        if self.rotate != Vector2::new(0.0, 0.0) {
            let d_theta = -2.0 * PI * self.rotate.x / height * self.rotate_speed;
            let d_phi = -2.0 * PI * self.rotate.y / height * self.rotate_speed;
            orbit(camera, d_theta, d_phi);
            self.rotate = Vector2::new(0.0, 0.0);
        }
        if self.pan != Vector2::new(0.0, 0.0) {
            pan(
                camera,
                self.pan * self.pan_speed,
                projection.fovy(),
                height,
            );
            self.pan = Vector2::new(0.0, 0.0);
        }
        if self.zoom != 0.0 {
            let scale = 0.95f32.powf(self.zoom * self.zoom_speed);
            dolly(camera, scale, self.min_distance, self.max_distance);
            self.zoom = 0.0;
        }
    }
}

/// Rotates the camera around its target by azimuth `d_theta` and polar `d_phi`.
pub fn orbit(camera: &mut Camera, d_theta: f32, d_phi: f32) {
    let offset = camera.position - camera.target;
    let radius = offset.magnitude();
    if radius == 0.0 {
        return;
    }
    let theta = offset.x.atan2(offset.z) + d_theta;
    let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + d_phi).clamp(MIN_POLAR, PI - MIN_POLAR);
    camera.position = camera.target
        + Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
}

/// Moves camera and target together in the view plane by a screen delta in pixels.
pub fn pan(camera: &mut Camera, delta: Vector2<f32>, fovy: Rad<f32>, viewport_height: f32) {
    let offset = camera.position - camera.target;
    let forward = -offset.normalize();
    let right = forward.cross(Vector3::unit_y()).normalize();
    let up = right.cross(forward);
    // world units per pixel at the target distance
    let scale = 2.0 * offset.magnitude() * (fovy.0 / 2.0).tan() / viewport_height;
    let shift = -right * delta.x * scale + up * delta.y * scale;
    camera.position += shift;
    camera.target += shift;
}

/// Scales the distance to the target, clamped to `[min, max]`.
pub fn dolly(camera: &mut Camera, scale: f32, min: f32, max: f32) {
    let offset = camera.position - camera.target;
    let radius = offset.magnitude();
    if radius == 0.0 {
        return;
    }
    let new_radius = (radius * scale).clamp(min, max);
    camera.position = camera.target + offset * (new_radius / radius);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn start() -> Camera {
        Camera::from(&CameraSettings::default())
    }

    #[test]
    fn orbit_keeps_distance() {
        let mut camera = start();
        let before = camera.distance();
        orbit(&mut camera, 0.7, -0.3);
        assert_relative_eq!(camera.distance(), before, epsilon = 1e-3);
    }

    #[test]
    fn orbit_never_flips_over_the_pole() {
        let mut camera = start();
        orbit(&mut camera, 0.0, -10.0);
        assert!(camera.position.y < camera.distance());
        assert!(camera.position.y > 0.0);
    }

    #[test]
    fn dolly_is_clamped() {
        let mut camera = start();
        dolly(&mut camera, 100.0, 1.0, 100.0);
        assert_relative_eq!(camera.distance(), 100.0, epsilon = 1e-3);
        dolly(&mut camera, 0.0001, 1.0, 100.0);
        assert_relative_eq!(camera.distance(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn pan_moves_target_with_camera() {
        let mut camera = start();
        let offset = camera.position - camera.target;
        pan(&mut camera, Vector2::new(10.0, 0.0), Deg(75.0).into(), 600.0);
        assert!(camera.target.x < 0.0);
        let moved = camera.position - camera.target;
        assert_relative_eq!(moved.x, offset.x, epsilon = 1e-4);
        assert_relative_eq!(moved.z, offset.z, epsilon = 1e-4);
    }

    #[test]
    fn aspect_only_changes_projection_width() {
        let mut projection = Projection::from_settings(&CameraSettings::default(), 1.0);
        let square = projection.calc_matrix();
        projection.set_aspect(2.0);
        let wide = projection.calc_matrix();
        assert_relative_eq!(wide.x.x * 2.0, square.x.x, epsilon = 1e-5);
        assert_relative_eq!(wide.y.y, square.y.y, epsilon = 1e-5);
    }
}
