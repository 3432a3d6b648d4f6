use std::rc::Rc;

use nalgebra::Point2;
use paperspace_core::{centered_rect_corners, homography_from_4pt, rect_corners, Quad};
use serde::{Deserialize, Serialize};

use crate::draw::{Color, DrawList, Material};
use crate::error::PaperError;
use crate::paper::{Paper, PaperContext, PaperKind, RenderContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamepadButton {
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    Select,
    Start,
    LeftStick,
    RightStick,
    Up,
    Right,
    Down,
    Left,
}

/// Polled state of a connected pad.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadState {
    pub name: String,
    #[serde(default)]
    pub pressed: Vec<GamepadButton>,
}

impl GamepadState {
    pub fn is_pressed(&self, button: GamepadButton) -> bool {
        self.pressed.contains(&button)
    }
}

/// Joystick backend. `index` is 1-based; `None` means disconnected.
pub trait GamepadSource {
    fn poll(&self, index: u32) -> Option<GamepadState>;
}

/// A backend without any pads attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGamepads;

impl GamepadSource for NoGamepads {
    fn poll(&self, _index: u32) -> Option<GamepadState> {
        None
    }
}

const CANVAS: [f32; 2] = [14.0, 7.0];
const LARGE: f32 = 1.2;
const SMALL: f32 = 0.8;

/// Button placement on the canvas: centre, size.
const LAYOUT: [(GamepadButton, [f32; 2], [f32; 2]); 14] = [
    (GamepadButton::Up, [2.5, 2.5], [LARGE, LARGE]),
    (GamepadButton::Left, [1.5, 3.5], [LARGE, LARGE]),
    (GamepadButton::Down, [2.5, 4.5], [LARGE, LARGE]),
    (GamepadButton::Right, [3.5, 3.5], [LARGE, LARGE]),
    (GamepadButton::A, [11.5, 4.5], [LARGE, LARGE]),
    (GamepadButton::B, [12.5, 3.5], [LARGE, LARGE]),
    (GamepadButton::X, [10.5, 3.5], [LARGE, LARGE]),
    (GamepadButton::Y, [11.5, 2.5], [LARGE, LARGE]),
    (GamepadButton::Select, [5.85, 3.5], [1.1, SMALL]),
    (GamepadButton::Start, [8.15, 3.5], [1.1, SMALL]),
    (GamepadButton::LeftStick, [5.0, 6.0], [2.0, 2.0]),
    (GamepadButton::RightStick, [9.0, 6.0], [2.0, 2.0]),
    (GamepadButton::LeftShoulder, [2.5, 1.25], [2.0, 0.5]),
    (GamepadButton::RightShoulder, [11.5, 1.25], [2.0, 0.5]),
];

/// Live overlay of a gamepad's buttons.
pub struct GamepadPaper {
    index: u32,
    source: Rc<dyn GamepadSource>,
    state: Option<GamepadState>,
}

impl GamepadPaper {
    pub fn new(index: u32, source: Rc<dyn GamepadSource>) -> Self {
        Self {
            index,
            source,
            state: None,
        }
    }

    pub fn state(&self) -> Option<&GamepadState> {
        self.state.as_ref()
    }
}

impl Paper for GamepadPaper {
    fn kind(&self) -> PaperKind {
        PaperKind::Gamepad
    }

    fn update(&mut self, cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        let state = self.source.poll(self.index);
        match (&self.state, &state) {
            (None, Some(s)) => {
                log::info!("paper {}: gamepad {} connected ({})", cx.id, self.index, s.name)
            }
            (Some(_), None) => {
                log::info!("paper {}: gamepad {} disconnected", cx.id, self.index)
            }
            _ => {}
        }
        self.state = state;
        Ok(())
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError> {
        let Some(sheet) = cx.projected_corners() else {
            return Ok(());
        };
        let canvas: Quad = rect_corners(CANVAS, Point2::origin());
        let Some(to_sheet) = homography_from_4pt(&canvas, &sheet) else {
            return Ok(());
        };

        let Some(state) = &self.state else {
            out.quad(sheet, Material::solid(Color::GREY));
            return Ok(());
        };
        out.quad(sheet, Material::solid(Color::BLACK));
        for (button, [x, y], size) in LAYOUT {
            let color = if state.is_pressed(button) {
                Color::RED
            } else {
                Color::WHITE
            };
            let quad = centered_rect_corners(Point2::new(x, y), size, 0.0);
            out.quad(to_sheet.apply_quad(&quad), Material::solid(color));
        }
        Ok(())
    }

    fn hide(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.state = None;
        Ok(())
    }
}
