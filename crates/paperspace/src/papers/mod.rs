//! Built-in paper kinds.
//!
//! Each kind only emits draw commands; its heavy collaborator (decoder,
//! gamepad poller, script engine, message broker) is injected.

mod button;
mod gamepad;
mod portal;
mod script;
mod video;

pub use button::{ButtonEvent, ButtonHub, ShortcutButton, DEFAULT_HOLD_GRACE};
pub use gamepad::{GamepadButton, GamepadPaper, GamepadSource, GamepadState, NoGamepads};
pub use portal::{portal_inner_corners, PortalIn, PortalOut, DEFAULT_INNER_SCALE};
pub use script::{Script, ScriptHost, ScriptPaper};
pub use video::VideoPaper;
