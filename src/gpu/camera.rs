//! Damped orbit camera.
//!
//! Mouse input moves the *goal* yaw, pitch and distance; [`Camera::update`]
//! eases the current values toward the goal every frame.

use glam::{Mat4, Vec3};

const PITCH_LIMIT: f32 = 1.5;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 50.0;
const ORBIT_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 0.3;

/// Orbit camera for viewing particle simulations.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    goal_yaw: f32,
    goal_pitch: f32,
    goal_distance: f32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of the remaining gap closed per 60 Hz frame.
    pub damping: f32,
}

impl Camera {
    /// Camera at `(4.5, 4, 11)` looking at the origin.
    pub fn new() -> Self {
        Self::looking_at(Vec3::new(4.5, 4.0, 11.0), Vec3::ZERO)
    }

    /// Camera placed at `position`, orbiting `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length().max(MIN_DISTANCE);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        Self {
            yaw,
            pitch,
            distance,
            target,
            goal_yaw: yaw,
            goal_pitch: pitch,
            goal_distance: distance,
            fov_y: 35.0,
            near: 0.1,
            far: 100.0,
            damping: 0.05,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    /// Rotate the goal by a mouse drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.goal_yaw -= dx * ORBIT_SPEED;
        self.goal_pitch = (self.goal_pitch + dy * ORBIT_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Move the goal distance by `scroll` wheel lines.
    pub fn zoom(&mut self, scroll: f32) {
        self.goal_distance = (self.goal_distance - scroll * ZOOM_SPEED).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Ease toward the goal over `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let t = 1.0 - (1.0 - self.damping).powf(dt * 60.0);
        self.yaw += (self.goal_yaw - self.yaw) * t;
        self.pitch += (self.goal_pitch - self.pitch) * t;
        self.distance += (self.goal_distance - self.distance) * t;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position() {
        let camera = Camera::new();
        let p = camera.position();
        assert!((p - Vec3::new(4.5, 4.0, 11.0)).length() < 1e-4);
    }

    #[test]
    fn test_update_eases_toward_goal() {
        let mut camera = Camera::new();
        let start = camera.yaw;
        camera.orbit(-100.0, 0.0);
        let goal = start + 0.5;

        camera.update(0.0);
        assert_eq!(camera.yaw, start);

        camera.update(1.0 / 60.0);
        assert!(camera.yaw > start && camera.yaw < goal);

        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert!((camera.yaw - goal).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::new();
        camera.zoom(1000.0);
        for _ in 0..1000 {
            camera.update(1.0);
        }
        assert!((camera.distance - MIN_DISTANCE).abs() < 1e-3);
    }
}
