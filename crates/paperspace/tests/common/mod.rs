#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use paperspace::core::{rect_corners, Point2, Quad};
use paperspace::tracking::{Detection, MarkerId, Shape, ShapeParams};
use paperspace::{
    Color, DrawList, Material, Paper, PaperContext, PaperError, PaperKind, PaperSnapshot,
    RenderContext,
};

/// Four markers whose first corners sit on the corners of a `size` square at `origin`.
pub fn sheet(ids: [u32; 4], origin: [f32; 2], size: f32) -> Vec<Detection> {
    let corners = rect_corners([size, size], Point2::new(origin[0], origin[1]));
    ids.into_iter()
        .zip(corners)
        .map(|(id, c)| marker(id, c))
        .collect()
}

pub fn marker(id: u32, anchor: Point2<f32>) -> Detection {
    Detection {
        id: MarkerId(id),
        corners: rect_corners([5.0, 5.0], anchor),
    }
}

pub fn rect(ids: [u32; 4]) -> Shape {
    Shape::rect(ids.map(MarkerId), ShapeParams::default())
}

pub fn square(origin: [f32; 2], size: f32) -> Quad {
    rect_corners([size, size], Point2::new(origin[0], origin[1]))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Calls {
    pub show: u32,
    pub update: u32,
    pub render: u32,
    pub hide: u32,
}

/// Paper that records its callbacks and can be told to fail.
#[derive(Clone, Default)]
pub struct Recording {
    pub calls: Rc<RefCell<Calls>>,
    pub fail_show: Rc<RefCell<bool>>,
    pub fail_update: Rc<RefCell<bool>>,
    pub fail_render: Rc<RefCell<bool>>,
    /// Snapshot seen by each `update`.
    pub seen: Rc<RefCell<Vec<Vec<PaperSnapshot>>>>,
}

impl Recording {
    pub fn calls(&self) -> Calls {
        self.calls.borrow().clone()
    }

    pub fn boxed(&self) -> Box<dyn Paper> {
        Box::new(self.clone())
    }
}

impl Paper for Recording {
    fn kind(&self) -> PaperKind {
        PaperKind::Script
    }

    fn show(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.calls.borrow_mut().show += 1;
        if *self.fail_show.borrow() {
            return Err(PaperError::new("show failed"));
        }
        Ok(())
    }

    fn update(&mut self, cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.calls.borrow_mut().update += 1;
        self.seen.borrow_mut().push(cx.frame.papers.to_vec());
        if *self.fail_update.borrow() {
            return Err(PaperError::new("update failed"));
        }
        Ok(())
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError> {
        self.calls.borrow_mut().render += 1;
        if let Some(corners) = cx.projected_corners() {
            out.quad(corners, Material::solid(Color::WHITE));
        }
        if *self.fail_render.borrow() {
            return Err(PaperError::new("render failed"));
        }
        Ok(())
    }

    fn hide(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.calls.borrow_mut().hide += 1;
        Ok(())
    }
}
