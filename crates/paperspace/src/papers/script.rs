use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::draw::DrawList;
use crate::error::PaperError;
use crate::paper::{Paper, PaperContext, PaperKind, RenderContext};

/// A loaded user script, living from `show` to `hide`.
pub trait Script {
    fn update(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        Ok(())
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError>;

    fn hide(&mut self) -> Result<(), PaperError> {
        Ok(())
    }
}

/// Sandbox that turns a script file into a [`Script`].
pub trait ScriptHost {
    fn load(&self, path: &Path) -> Result<Box<dyn Script>, PaperError>;
}

/// Runs a user script while the sheet is on the desk.
pub struct ScriptPaper {
    filename: PathBuf,
    host: Rc<dyn ScriptHost>,
    script: Option<Box<dyn Script>>,
}

impl ScriptPaper {
    pub fn new(filename: impl Into<PathBuf>, host: Rc<dyn ScriptHost>) -> Self {
        Self {
            filename: filename.into(),
            host,
            script: None,
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn is_loaded(&self) -> bool {
        self.script.is_some()
    }

    fn script(&mut self) -> Result<&mut Box<dyn Script>, PaperError> {
        let filename = &self.filename;
        self.script
            .as_mut()
            .ok_or_else(|| PaperError::new(format!("script {} is not loaded", filename.display())))
    }
}

impl fmt::Debug for ScriptPaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptPaper")
            .field("filename", &self.filename)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Paper for ScriptPaper {
    fn kind(&self) -> PaperKind {
        PaperKind::Script
    }

    fn show(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.script = Some(self.host.load(&self.filename)?);
        log::debug!("loaded script {}", self.filename.display());
        Ok(())
    }

    fn update(&mut self, cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.script()?.update(cx)
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError> {
        self.script()?.render(cx, out)
    }

    fn hide(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        match self.script.take() {
            Some(mut script) => script.hide(),
            None => Ok(()),
        }
    }
}
