use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use nalgebra::Point2;
use paperspace_core::{centered_rect_corners, distance, polygon_center, rotation_from_corners};
use serde::{Deserialize, Serialize};

use crate::draw::{Color, DrawList, Material};
use crate::error::PaperError;
use crate::paper::{Paper, PaperContext, PaperKind, RenderContext};

/// How long a held button keeps its sheet alive without the marker.
pub const DEFAULT_HOLD_GRACE: Duration = Duration::from_secs(3);

const OUTER_MARGIN: f32 = 50.0;
const INNER_MARGIN: f32 = 20.0;

/// Remote button action, as published by the switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonEvent {
    #[serde(rename = "on")]
    Press,
    #[serde(rename = "brightness_move_up")]
    Hold,
    #[serde(rename = "brightness_stop")]
    HoldUp,
}

#[derive(Deserialize)]
struct Payload {
    action: Option<ButtonEvent>,
}

impl ButtonEvent {
    /// Decode a broker message like `{"action": "brightness_move_up"}`.
    ///
    /// Messages without a known action yield `None`.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        serde_json::from_slice::<Payload>(payload)
            .ok()
            .and_then(|p| p.action)
    }
}

/// Routes button events from a delivery thread to the papers subscribed to a
/// topic. Senders are `Send` and may be moved to the broker thread.
#[derive(Debug, Default)]
pub struct ButtonHub {
    topics: HashMap<String, Vec<Sender<ButtonEvent>>>,
}

impl ButtonHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topic: &str) -> Receiver<ButtonEvent> {
        let (tx, rx) = mpsc::channel();
        self.topics.entry(topic.to_owned()).or_default().push(tx);
        rx
    }

    /// Deliver `event` to every subscriber of `topic`; returns how many
    /// receivers are still listening.
    pub fn publish(&mut self, topic: &str, event: ButtonEvent) -> usize {
        let Some(senders) = self.topics.get_mut(topic) else {
            log::debug!("no subscriber for button topic {topic}");
            return 0;
        };
        senders.retain(|tx| tx.send(event).is_ok());
        senders.len()
    }

    /// Senders for every subscriber of `topic`, for handing to a delivery
    /// thread.
    pub fn senders(&self, topic: &str) -> Vec<Sender<ButtonEvent>> {
        self.topics.get(topic).cloned().unwrap_or_default()
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }
}

/// A wireless button stuck to a single-marker sheet.
///
/// Holding the button keeps the sheet visible for a grace period, since the
/// pressing hand usually covers the marker.
#[derive(Debug)]
pub struct ShortcutButton {
    topic: String,
    events: Receiver<ButtonEvent>,
    hold_grace: Duration,
    pressed: bool,
    presses: u64,
}

impl ShortcutButton {
    pub fn new(topic: impl Into<String>, events: Receiver<ButtonEvent>) -> Self {
        Self {
            topic: topic.into(),
            events,
            hold_grace: DEFAULT_HOLD_GRACE,
            pressed: false,
            presses: 0,
        }
    }

    pub fn with_hold_grace(mut self, grace: Duration) -> Self {
        self.hold_grace = grace;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    /// Short presses seen while visible.
    pub fn presses(&self) -> u64 {
        self.presses
    }
}

impl Paper for ShortcutButton {
    fn kind(&self) -> PaperKind {
        PaperKind::ShortcutButton
    }

    fn show(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        let stale = self.events.try_iter().count();
        if stale > 0 {
            log::debug!(
                "button {}: dropped {stale} events received while hidden",
                self.topic
            );
        }
        Ok(())
    }

    fn update(&mut self, cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        let events: Vec<ButtonEvent> = self.events.try_iter().collect();
        for event in events {
            match event {
                ButtonEvent::Press => self.presses += 1,
                ButtonEvent::Hold => self.pressed = true,
                ButtonEvent::HoldUp => self.pressed = false,
            }
        }
        if self.pressed {
            cx.shape.ignore_absence(cx.frame.now, self.hold_grace);
        }
        Ok(())
    }

    fn render(&mut self, cx: &RenderContext<'_>, out: &mut DrawList) -> Result<(), PaperError> {
        let Some(corners) = cx.corners() else {
            return Ok(());
        };
        let [tl, tr, br, bl] = *corners;
        let size =
            (distance(tl, tr) + distance(bl, br) + distance(tl, bl) + distance(tr, br)) / 4.0;
        let center: Point2<f32> = polygon_center(corners);
        let rotation = rotation_from_corners(corners);

        let ring = |margin: f32| {
            cx.project(&centered_rect_corners(
                center,
                [size + margin, size + margin],
                rotation,
            ))
        };
        let outer = if self.pressed { Color::RED } else { Color::BLUE };
        out.quad(ring(OUTER_MARGIN), Material::solid(outer));
        out.quad(ring(INNER_MARGIN), Material::solid(Color::BLACK));
        Ok(())
    }

    fn hide(&mut self, _cx: &mut PaperContext<'_>) -> Result<(), PaperError> {
        self.pressed = false;
        Ok(())
    }
}
