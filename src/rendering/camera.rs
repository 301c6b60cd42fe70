use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera uniform as seen by `particles.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct CameraUniform {
    pub(crate) view_proj: [f32; 16],
}

/// Orbit camera around the particle cloud: yaw rotation, planar pan and
/// zoom toward the origin. Mouse state lives here so drag handling stays
/// out of the event loop.
pub(crate) struct Camera {
    offset: [f32; 2],
    zoom: f32,
    rotation: f32,
    base_distance: f32,

    mouse_pressed: bool,
    last_mouse_position: [f32; 2],
    ctrl_pressed: bool,
    shift_pressed: bool,
}

impl Camera {
    pub(crate) fn new(base_distance: f32) -> Self {
        Self {
            offset: [0.0, 0.0],
            zoom: 1.0,
            rotation: 0.0,
            base_distance,
            mouse_pressed: false,
            last_mouse_position: [0.0, 0.0],
            ctrl_pressed: false,
            shift_pressed: false,
        }
    }

    pub(crate) fn uniform(&self, aspect: f32) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection(aspect).to_cols_array(),
        }
    }

    fn view_projection(&self, aspect: f32) -> Mat4 {
        let distance = self.base_distance / self.zoom;
        let eye = Vec3::new(0.0, distance * 0.15, distance);

        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y)
            * Mat4::from_rotation_y(self.rotation)
            * Mat4::from_translation(Vec3::new(self.offset[0], 0.0, self.offset[1]));

        let proj = Mat4::perspective_rh(45.0_f32.to_radians(), aspect, 0.1, 100_000.0);

        proj * view
    }

    pub(crate) fn pan(&mut self, delta_x: f32, delta_y: f32) {
        // Faster pan when zoomed out.
        let pan_speed = 1.0 / self.zoom;

        let sin_rot = self.rotation.sin();
        let cos_rot = self.rotation.cos();

        self.offset[0] += (delta_x * cos_rot - delta_y * sin_rot) * pan_speed;
        self.offset[1] += (delta_x * sin_rot + delta_y * cos_rot) * pan_speed;
    }

    pub(crate) fn zoom(&mut self, delta: f32) {
        let zoom_speed = 0.1;
        let new_zoom = self.zoom * (1.0 + delta * zoom_speed);
        self.zoom = new_zoom.clamp(0.05, 20.0);
    }

    pub(crate) fn rotate(&mut self, delta: f32) {
        self.rotation += delta * 0.01;

        while self.rotation > std::f32::consts::TAU {
            self.rotation -= std::f32::consts::TAU;
        }
        while self.rotation < 0.0 {
            self.rotation += std::f32::consts::TAU;
        }
    }

    pub(crate) fn handle_mouse_press(&mut self, position: [f32; 2], ctrl: bool, shift: bool) {
        self.mouse_pressed = true;
        self.last_mouse_position = position;
        self.ctrl_pressed = ctrl;
        self.shift_pressed = shift;
    }

    pub(crate) fn handle_mouse_release(&mut self) {
        self.mouse_pressed = false;
    }

    /// Returns true when the camera moved and the view needs refreshing.
    pub(crate) fn handle_mouse_move(&mut self, position: [f32; 2]) -> bool {
        if self.mouse_pressed {
            let delta_x = position[0] - self.last_mouse_position[0];
            let delta_y = position[1] - self.last_mouse_position[1];

            if self.ctrl_pressed {
                self.pan(delta_x, delta_y);
                self.last_mouse_position = position;
                return true;
            } else if self.shift_pressed {
                self.rotate(delta_x);
                self.last_mouse_position = position;
                return true;
            }
        }
        false
    }

    pub(crate) fn handle_mouse_wheel(&mut self, delta: f32) {
        self.zoom(delta);
    }

    pub(crate) fn handle_key_state(&mut self, ctrl: bool, shift: bool) {
        self.ctrl_pressed = ctrl;
        self.shift_pressed = shift;
    }
}
