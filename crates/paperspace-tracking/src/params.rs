use serde::{Deserialize, Serialize};

fn default_min_move_px() -> f32 {
    2.0
}

fn default_smooth() -> bool {
    true
}

/// Jitter suppression applied by every shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Corners are replaced only when some coordinate moves by at least this
    /// many camera pixels. Smaller moves keep the previous pose.
    #[serde(default = "default_min_move_px")]
    pub min_move_px: f32,
    /// Disable to adopt every new pose as-is.
    #[serde(default = "default_smooth")]
    pub smooth: bool,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            min_move_px: default_min_move_px(),
            smooth: default_smooth(),
        }
    }
}

impl ShapeParams {
    pub fn unsmoothed() -> Self {
        Self {
            smooth: false,
            ..Self::default()
        }
    }
}
