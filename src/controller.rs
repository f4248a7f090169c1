//engine controller

use glam::{Mat4, Vec3};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

const FOV_RADIANS: f32 = 1.0472; // 60 degrees
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;
const PITCH_LIMIT: f32 = 89.0;

/// Free-flying first person camera. Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraState {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 18.0, 32.0),
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
        }
    }

    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let dir = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        self.front = dir.normalize();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }
}

// actions the event loop cares about beyond camera movement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Regenerate,
    ToggleWireframe,
    Quit,
}

pub struct Controller {
    pub camera: CameraState,
    pub move_speed: f32,
    pub mouse_sens: f32,

    mouse_delta: (f32, f32),
    keys: [bool; 4], // W, A, S, D
}

impl Controller {
    pub fn new(move_speed: f32, mouse_sens: f32) -> Self {
        Self {
            camera: CameraState::new(),
            move_speed,
            mouse_sens,
            mouse_delta: (0.0, 0.0),
            keys: [false; 4],
        }
    }

    pub fn update_camera(&mut self, dt: f32) {
        let step = self.move_speed * dt;
        let cam = &mut self.camera;
        let right = cam.right();

        if self.keys[0] { cam.position += cam.front * step; } // W
        if self.keys[1] { cam.position -= right * step; }     // A
        if self.keys[2] { cam.position -= cam.front * step; } // S
        if self.keys[3] { cam.position += right * step; }     // D

        let (dx, dy) = self.mouse_delta;
        if dx.abs() > 0.0 || dy.abs() > 0.0 {
            // screen y grows downwards
            cam.rotate(dx * self.mouse_sens, -dy * self.mouse_sens);
        }

        // reset delta after use
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0 as f32;
        self.mouse_delta.1 += delta.1 as f32;
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> Option<Command> {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            return self.process_key(event.physical_key, event.state == ElementState::Pressed, event.repeat);
        }
        None
    }

    fn process_key(&mut self, key: PhysicalKey, pressed: bool, repeat: bool) -> Option<Command> {
        match key {
            PhysicalKey::Code(KeyCode::KeyW) => self.keys[0] = pressed,
            PhysicalKey::Code(KeyCode::KeyA) => self.keys[1] = pressed,
            PhysicalKey::Code(KeyCode::KeyS) => self.keys[2] = pressed,
            PhysicalKey::Code(KeyCode::KeyD) => self.keys[3] = pressed,

            PhysicalKey::Code(KeyCode::KeyR) if pressed && !repeat => return Some(Command::Regenerate),
            PhysicalKey::Code(KeyCode::KeyF) if pressed && !repeat => return Some(Command::ToggleWireframe),
            PhysicalKey::Code(KeyCode::Escape) if pressed => return Some(Command::Quit),
            _ => {}
        }
        None
    }

    pub fn get_matrix(&self, width: f32, height: f32) -> Mat4 {
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        let proj = Mat4::perspective_rh(FOV_RADIANS, aspect, Z_NEAR, Z_FAR);
        proj * self.camera.view_matrix()
    }
}
