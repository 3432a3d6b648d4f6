//! JSON configuration: paper records, calibration and the app file tying
//! them together.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use paperspace_core::{rect_corners, PerspectiveProjector, Point2, Quad};
use paperspace_tracking::{MarkerId, Shape, ShapeParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, SpaceError};
use crate::paper::{Paper, PaperId, PaperKind};
use crate::papers::{
    ButtonHub, GamepadPaper, GamepadSource, NoGamepads, PortalIn, PortalOut, ScriptHost,
    ScriptPaper, ShortcutButton, VideoPaper, DEFAULT_INNER_SCALE,
};
use crate::space::Space;

fn default_smooth() -> bool {
    true
}

fn default_inner_scale() -> f32 {
    DEFAULT_INNER_SCALE
}

fn default_button_absent_after() -> Option<u32> {
    Some(1)
}

fn default_hold_grace_secs() -> f32 {
    3.0
}

/// Kind-specific part of a paper record, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PaperKindConfig {
    Video {
        video_file: PathBuf,
        video_size: [u32; 2],
        #[serde(default)]
        fps: Option<f32>,
        #[serde(default)]
        frame_count: Option<u64>,
    },
    PortalIn {
        #[serde(default = "default_inner_scale")]
        inner_scale: f32,
    },
    PortalOut {
        #[serde(default = "default_inner_scale")]
        inner_scale: f32,
    },
    Gamepad {
        /// 1-based pad index.
        gamepad_id: u32,
    },
    Script {
        filename: PathBuf,
    },
    ShortcutButton {
        #[serde(alias = "mqtt_topic")]
        topic: String,
        /// Frames of grace before the marker counts as gone; `null` for none.
        #[serde(default = "default_button_absent_after")]
        absent_after: Option<u32>,
        #[serde(default = "default_hold_grace_secs")]
        hold_grace_secs: f32,
    },
}

impl PaperKindConfig {
    pub fn kind(&self) -> PaperKind {
        match self {
            PaperKindConfig::Video { .. } => PaperKind::Video,
            PaperKindConfig::PortalIn { .. } => PaperKind::PortalIn,
            PaperKindConfig::PortalOut { .. } => PaperKind::PortalOut,
            PaperKindConfig::Gamepad { .. } => PaperKind::Gamepad,
            PaperKindConfig::Script { .. } => PaperKind::Script,
            PaperKindConfig::ShortcutButton { .. } => PaperKind::ShortcutButton,
        }
    }
}

/// One configured physical sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: PaperId,
    /// TL, TR, BR, BL for four-marker kinds.
    pub markers: Vec<MarkerId>,
    #[serde(default = "default_smooth")]
    pub smooth: bool,
    #[serde(flatten)]
    pub kind: PaperKindConfig,
}

impl PaperRecord {
    /// Structural checks that do not need any collaborator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kind = self.kind.kind();
        if self.markers.len() != kind.marker_count() {
            return Err(ConfigError::MarkerCount {
                id: self.id,
                kind,
                expected: kind.marker_count(),
                got: self.markers.len(),
            });
        }
        let invalid = |field| ConfigError::InvalidValue { id: self.id, field };
        match &self.kind {
            PaperKindConfig::PortalIn { inner_scale } | PaperKindConfig::PortalOut { inner_scale }
                if !(inner_scale.is_finite() && *inner_scale > 0.0) =>
            {
                Err(invalid("inner_scale"))
            }
            PaperKindConfig::ShortcutButton {
                hold_grace_secs, ..
            } if !(hold_grace_secs.is_finite() && *hold_grace_secs >= 0.0) => {
                Err(invalid("hold_grace_secs"))
            }
            PaperKindConfig::Gamepad { gamepad_id: 0 } => Err(invalid("gamepad_id")),
            _ => Ok(()),
        }
    }

    /// The shape tracking this sheet. `params.smooth` is combined with the
    /// record's own `smooth` flag.
    pub fn shape(&self, params: &ShapeParams) -> Result<Shape, ConfigError> {
        self.validate()?;
        let params = ShapeParams {
            smooth: params.smooth && self.smooth,
            ..*params
        };
        match (&self.kind, self.markers.as_slice()) {
            (PaperKindConfig::ShortcutButton { absent_after, .. }, [marker]) => {
                Ok(Shape::single(*marker, *absent_after, params))
            }
            (_, &[tl, tr, br, bl]) => Ok(Shape::rect([tl, tr, br, bl], params)),
            (kind, markers) => Err(ConfigError::MarkerCount {
                id: self.id,
                kind: kind.kind(),
                expected: kind.kind().marker_count(),
                got: markers.len(),
            }),
        }
    }

    /// Make relative asset paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        match &mut self.kind {
            PaperKindConfig::Video { video_file: path, .. }
            | PaperKindConfig::Script { filename: path } => {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
            _ => {}
        }
    }

    /// Instantiate the paper behaviour, wiring in its collaborator.
    pub fn build_paper(
        &self,
        collaborators: &mut Collaborators,
    ) -> Result<Box<dyn Paper>, ConfigError> {
        self.validate()?;
        let paper: Box<dyn Paper> = match &self.kind {
            PaperKindConfig::Video {
                video_file,
                video_size,
                fps,
                frame_count,
            } => {
                let mut video = VideoPaper::new(video_file, *video_size);
                if let Some(fps) = fps {
                    video = video.with_fps(*fps);
                }
                if let Some(count) = frame_count {
                    video = video.with_frame_count(*count);
                }
                Box::new(video)
            }
            PaperKindConfig::PortalIn { inner_scale } => Box::new(PortalIn::new(*inner_scale)),
            PaperKindConfig::PortalOut { inner_scale } => Box::new(PortalOut::new(*inner_scale)),
            PaperKindConfig::Gamepad { gamepad_id } => Box::new(GamepadPaper::new(
                *gamepad_id,
                Rc::clone(&collaborators.gamepads),
            )),
            PaperKindConfig::Script { filename } => {
                let host = collaborators.scripts.as_ref().ok_or(
                    ConfigError::MissingCollaborator {
                        id: self.id,
                        kind: PaperKind::Script,
                        what: "script host",
                    },
                )?;
                Box::new(ScriptPaper::new(filename, Rc::clone(host)))
            }
            PaperKindConfig::ShortcutButton {
                topic,
                hold_grace_secs,
                ..
            } => {
                let grace = Duration::try_from_secs_f32(*hold_grace_secs).map_err(|_| {
                    ConfigError::InvalidValue {
                        id: self.id,
                        field: "hold_grace_secs",
                    }
                })?;
                let events = collaborators.buttons.subscribe(topic);
                Box::new(ShortcutButton::new(topic, events).with_hold_grace(grace))
            }
        };
        Ok(paper)
    }
}

/// External services papers are wired to at build time.
pub struct Collaborators {
    pub gamepads: Rc<dyn GamepadSource>,
    /// Script papers are rejected when no host is configured.
    pub scripts: Option<Rc<dyn ScriptHost>>,
    pub buttons: ButtonHub,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            gamepads: Rc::new(NoGamepads),
            scripts: None,
            buttons: ButtonHub::new(),
        }
    }
}

/// Accepted records plus the reasons others were dropped.
#[derive(Debug, Default)]
pub struct PaperList {
    pub records: Vec<PaperRecord>,
    pub rejected: Vec<ConfigError>,
}

impl PaperList {
    /// Parse a JSON array of records. Bad records are logged and skipped;
    /// only a document that is not an array fails as a whole.
    pub fn parse_json(json: &str) -> Result<Self, ConfigError> {
        let Value::Array(items) = serde_json::from_str::<Value>(json)? else {
            return Err(ConfigError::NotAList);
        };

        let mut list = PaperList::default();
        let mut seen = HashSet::new();
        for (index, item) in items.into_iter().enumerate() {
            match parse_record(index, item) {
                Ok(record) if !seen.insert(record.id) => {
                    list.reject(SpaceError::DuplicatePaper(record.id).into());
                }
                Ok(record) => list.records.push(record),
                Err(err) => list.reject(err),
            }
        }
        log::debug!(
            "paper list: {} accepted, {} rejected",
            list.records.len(),
            list.rejected.len()
        );
        Ok(list)
    }

    /// Load a paper list; relative asset paths resolve against its directory.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let mut list = Self::parse_json(&raw)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for record in &mut list.records {
            record.resolve_paths(base);
        }
        Ok(list)
    }

    /// Write the accepted records as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a space with every record that can be instantiated; the others
    /// are logged and returned.
    pub fn build_space(
        &self,
        projector: PerspectiveProjector,
        params: &ShapeParams,
        collaborators: &mut Collaborators,
    ) -> (Space, Vec<ConfigError>) {
        let mut space = Space::new(projector);
        let mut skipped = Vec::new();
        for record in &self.records {
            let added = record.shape(params).and_then(|shape| {
                let paper = record.build_paper(collaborators)?;
                space.add_paper(record.id, shape, paper)?;
                Ok(())
            });
            if let Err(err) = added {
                log::warn!("skipping paper {}: {err}", record.id);
                skipped.push(err);
            }
        }
        (space, skipped)
    }

    fn reject(&mut self, err: ConfigError) {
        log::warn!("skipping paper record: {err}");
        self.rejected.push(err);
    }
}

fn parse_record(index: usize, item: Value) -> Result<PaperRecord, ConfigError> {
    if let Some(kind) = item.get("type").and_then(Value::as_str) {
        if PaperKind::from_name(kind).is_none() {
            return Err(ConfigError::UnknownPaperType {
                index,
                kind: kind.to_owned(),
            });
        }
    }
    let record: PaperRecord = serde_json::from_value(item)
        .map_err(|source| ConfigError::InvalidRecord { index, source })?;
    record.validate()?;
    Ok(record)
}

/// Camera/projector correspondence produced by the calibration tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub camera_size: [u32; 2],
    pub projection_size: [u32; 2],
    /// Where the projector's corners land in the camera image, TL, TR, BR, BL.
    pub projection_corners_on_camera: Quad,
    /// Projector-space targets; the full projection rectangle when absent.
    #[serde(default)]
    pub projector_corners: Option<Quad>,
}

impl CalibrationConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn projector_corners(&self) -> Quad {
        self.projector_corners.unwrap_or_else(|| {
            let [w, h] = self.projection_size;
            rect_corners([w as f32, h as f32], Point2::origin())
        })
    }

    pub fn build_projector(&self) -> Result<PerspectiveProjector, ConfigError> {
        Ok(PerspectiveProjector::from_correspondences(
            &self.projection_corners_on_camera,
            &self.projector_corners(),
        )?)
    }
}

/// Top-level file pointing at the calibration and paper list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub calibration: PathBuf,
    pub papers: PathBuf,
    #[serde(default)]
    pub shape: ShapeParams,
}

impl AppConfig {
    /// Load and resolve relative paths against the file's directory.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        Ok(config.resolved(path.parent().unwrap_or_else(|| Path::new(""))))
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn resolved(mut self, base: &Path) -> Self {
        self.calibration = base.join(&self.calibration);
        self.papers = base.join(&self.papers);
        self
    }
}
