use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::draw::{DrawList, Material};
use crate::error::PaperError;
use crate::paper::{Paper, PaperContext, PaperKind, RenderContext};

#[derive(Clone, Copy, Debug)]
struct Playback {
    started: Instant,
    frame: u64,
}

/// Plays a video file on the sheet. Decoding belongs to the renderer; this
/// paper only keeps the playback position.
#[derive(Debug)]
pub struct VideoPaper {
    file: PathBuf,
    size: [u32; 2],
    fps: Option<f32>,
    frame_count: Option<u64>,
    playback: Option<Playback>,
}

impl VideoPaper {
    pub fn new(file: impl Into<PathBuf>, size: [u32; 2]) -> Self {
        Self {
            file: file.into(),
            size,
            fps: None,
            frame_count: None,
            playback: None,
        }
    }

    /// Advance by wall-clock time instead of one frame per update.
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = Some(fps).filter(|f| f.is_finite() && *f > 0.0);
        self
    }

    /// Loop back to frame 0 after `count` frames.
    pub fn with_frame_count(mut self, count: u64) -> Self {
        self.frame_count = Some(count).filter(|&c| c > 0);
        self
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Current frame index, `None` while hidden.
    pub fn frame(&self) -> Option<u64> {
        self.playback.map(|p| p.frame)
    }

    fn landscape(&self) -> bool {
        self.size[0] >= self.size[1]
    }
}

impl Paper for VideoPaper {
    fn kind(&self) -> PaperKind {
        PaperKind::Video
    }

    fn show(&mut self, cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        if !self.file.is_file() {
            return Err(PaperError::new(format!(
                "video file {} not found",
                self.file.display()
            )));
        }
        self.playback = Some(Playback {
            started: cx.frame.now,
            frame: 0,
        });
        Ok(())
    }

    fn update(&mut self, cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        let playback = self
            .playback
            .as_mut()
            .ok_or_else(|| PaperError::new("video is not open"))?;

        let next = match self.fps {
            Some(fps) => {
                let elapsed = cx.frame.now.saturating_duration_since(playback.started);
                (elapsed.as_secs_f64() * f64::from(fps)) as u64
            }
            None => playback.frame + 1,
        };
        playback.frame = match self.frame_count {
            Some(count) => next % count,
            None => next,
        };
        Ok(())
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError> {
        let playback = self
            .playback
            .ok_or_else(|| PaperError::new("video is not open"))?;
        let Some([tl, tr, br, bl]) = cx.projected_corners() else {
            return Ok(());
        };
        // Sheets are portrait; landscape footage is turned a quarter.
        let corners = if self.landscape() {
            [bl, tl, tr, br]
        } else {
            [tl, tr, br, bl]
        };
        out.quad(
            corners,
            Material::Video {
                file: self.file.clone(),
                frame: playback.frame,
            },
        );
        Ok(())
    }

    fn hide(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.playback = None;
        Ok(())
    }
}
