use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::{Policy, SimConfig};
use crate::rendering::Renderer;

// Store modifier states at the App level
#[derive(Default)]
pub(crate) struct App {
    state: Option<Renderer>,
    ctrl_pressed: bool,
    shift_pressed: bool,
    last_cursor_x: f32,
    last_cursor_y: f32,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Create window object
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes())
                .expect("failed to create window"),
        );

        let state = pollster::block_on(Renderer::new(window.clone(), SimConfig::default()));
        self.state = Some(state);

        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested, stopping");
                if let Some(state) = self.state.take() {
                    state.shutdown();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                state.render();
                // Emits a new redraw requested event.
                state.get_window().request_redraw();
            }
            WindowEvent::Resized(size) => {
                // Reconfigures the size of the surface. We do not re-render
                // here as this event is always followed up by redraw request.
                state.resize(size);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                // Track modifier key states (Ctrl, Shift) at the App level
                self.ctrl_pressed = modifiers.state().control_key();
                self.shift_pressed = modifiers.state().shift_key();

                // Also pass them to the renderer for its internal tracking
                state.handle_key_state(self.ctrl_pressed, self.shift_pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                match delta {
                    MouseScrollDelta::LineDelta(_, y) => {
                        state.handle_mouse_wheel(y);
                    }
                    MouseScrollDelta::PixelDelta(position) => {
                        // Touchpad gesture - needs a smaller scaling factor
                        state.handle_mouse_wheel(position.y as f32 * 0.003);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => {
                    state.handle_mouse_press(
                        [self.last_cursor_x, self.last_cursor_y],
                        self.ctrl_pressed,
                        self.shift_pressed,
                    );
                }
                ElementState::Released => {
                    state.handle_mouse_release();
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let x = position.x as f32;
                let y = position.y as f32;

                self.last_cursor_x = x;
                self.last_cursor_y = y;

                state.handle_mouse_move([x, y]);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if key_state == ElementState::Pressed {
                    match key_code {
                        // Number keys pick the initial-condition policy
                        KeyCode::Digit1 => state.switch_policy(Policy::Random),
                        KeyCode::Digit2 => state.switch_policy(Policy::Shell),
                        KeyCode::Digit3 => state.switch_policy(Policy::Expand),

                        // Re-seed the current policy
                        KeyCode::KeyR => state.reseed(),

                        // Reset camera
                        KeyCode::Digit0 => state.reset_camera(),

                        // Camera controls using keyboard
                        KeyCode::KeyW => state.pan_camera(0.0, 10.0),
                        KeyCode::KeyS => state.pan_camera(0.0, -10.0),
                        KeyCode::KeyA => state.pan_camera(10.0, 0.0),
                        KeyCode::KeyD => state.pan_camera(-10.0, 0.0),

                        KeyCode::KeyQ => state.rotate_camera(-1.0),
                        KeyCode::KeyE => state.rotate_camera(1.0),

                        KeyCode::Equal | KeyCode::NumpadAdd => state.zoom_camera(0.5),
                        KeyCode::Minus | KeyCode::NumpadSubtract => state.zoom_camera(-0.5),

                        _ => (),
                    }
                }
            }
            _ => (),
        }
    }
}

pub(crate) fn run() {
    // Initialize logger
    env_logger::init();

    // Create event loop
    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    // Create app
    let mut app = App::default();
    event_loop
        .run_app(&mut app)
        .expect("event loop terminated abnormally");
}
