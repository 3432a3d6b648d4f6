mod common;

use std::time::{Duration, Instant};

use paperspace::core::PerspectiveProjector;
use paperspace::tracking::MarkerTracker;
use paperspace::{Color, LifecyclePhase, Material, PaperId, PaperStatus, Space, SpaceError};

use common::{rect, sheet, Recording};

const A: [u32; 4] = [1, 2, 3, 4];
const B: [u32; 4] = [5, 6, 7, 8];

struct Rig {
    tracker: MarkerTracker,
    space: Space,
    now: Instant,
}

impl Rig {
    fn new() -> Self {
        Self {
            tracker: MarkerTracker::new(),
            space: Space::new(PerspectiveProjector::identity()),
            now: Instant::now(),
        }
    }

    fn frame(&mut self, detections: &[paperspace::tracking::Detection]) {
        self.now += Duration::from_millis(33);
        self.tracker.process_frame(detections);
        self.space.update(&self.tracker, self.now);
    }
}

#[test]
fn show_fires_once_per_appearance() {
    let mut rig = Rig::new();
    let paper = Recording::default();
    rig.space
        .add_paper(PaperId(1), rect(A), paper.boxed())
        .unwrap();

    rig.frame(&[]);
    assert!(!rig.space.is_visible(PaperId(1)));
    assert_eq!(paper.calls().show, 0);

    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    assert!(rig.space.is_visible(PaperId(1)));
    let calls = paper.calls();
    assert_eq!((calls.show, calls.update, calls.hide), (1, 3, 0));

    // Two markers covered: shape absent.
    let partial: Vec<_> = sheet(A, [0.0, 0.0], 100.0).into_iter().take(2).collect();
    rig.frame(&partial);
    assert!(!rig.space.is_visible(PaperId(1)));
    let calls = paper.calls();
    assert_eq!((calls.show, calls.update, calls.hide), (1, 3, 1));

    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    assert_eq!(paper.calls().show, 2);
}

#[test]
fn one_covered_marker_keeps_the_paper_visible() {
    let mut rig = Rig::new();
    let paper = Recording::default();
    rig.space
        .add_paper(PaperId(1), rect(A), paper.boxed())
        .unwrap();

    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    let three: Vec<_> = sheet(A, [0.0, 0.0], 100.0).into_iter().skip(1).collect();
    rig.frame(&three);
    assert!(rig.space.is_visible(PaperId(1)));
    assert_eq!(paper.calls().hide, 0);
}

#[test]
fn render_only_draws_visible_papers() {
    let mut rig = Rig::new();
    let a = Recording::default();
    let b = Recording::default();
    rig.space.add_paper(PaperId(1), rect(A), a.boxed()).unwrap();
    rig.space.add_paper(PaperId(2), rect(B), b.boxed()).unwrap();

    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    let draws = rig.space.render();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws.iter().next().map(|c| c.paper), Some(PaperId(1)));
    assert_eq!(b.calls().render, 0);
}

#[test]
fn papers_see_a_frame_consistent_snapshot() {
    let mut rig = Rig::new();
    let a = Recording::default();
    let b = Recording::default();
    rig.space.add_paper(PaperId(1), rect(A), a.boxed()).unwrap();
    rig.space.add_paper(PaperId(2), rect(B), b.boxed()).unwrap();

    let mut both = sheet(A, [0.0, 0.0], 100.0);
    both.extend(sheet(B, [200.0, 0.0], 100.0));
    rig.frame(&both);

    // Paper 1 updates first yet already sees paper 2 visible at its new pose.
    let seen = a.seen.borrow();
    let other = seen[0].iter().find(|p| p.id == PaperId(2)).unwrap();
    assert!(other.visible && other.present);
    assert_eq!(other.corners.map(|c| c[0].x), Some(200.0));
}

#[test]
fn a_failing_paper_does_not_affect_the_others() {
    let mut rig = Rig::new();
    let bad = Recording::default();
    let good = Recording::default();
    *bad.fail_update.borrow_mut() = true;
    rig.space.add_paper(PaperId(1), rect(A), bad.boxed()).unwrap();
    rig.space.add_paper(PaperId(2), rect(B), good.boxed()).unwrap();

    let mut both = sheet(A, [0.0, 0.0], 100.0);
    both.extend(sheet(B, [200.0, 0.0], 100.0));
    rig.frame(&both);

    assert_eq!(
        rig.space.status(PaperId(1)),
        Some(&PaperStatus::Faulted {
            phase: LifecyclePhase::Update,
            message: "update failed".into(),
        })
    );
    assert_eq!(rig.space.status(PaperId(2)), Some(&PaperStatus::Ok));
    assert!(rig.space.is_visible(PaperId(1)));

    let draws = rig.space.render();
    let fault: Vec<_> = draws.iter().filter(|c| c.paper == PaperId(1)).collect();
    assert_eq!(fault.len(), 1);
    assert_eq!(fault[0].material, Material::solid(Color::FAULT));
    assert_eq!(bad.calls().render, 0);
    assert_eq!(good.calls().render, 1);

    *bad.fail_update.borrow_mut() = false;
    rig.frame(&both);
    assert_eq!(rig.space.faulted_ids(), Vec::<PaperId>::new());
    let draws = rig.space.render();
    assert!(draws
        .iter()
        .all(|c| c.material == Material::solid(Color::WHITE)));
}

#[test]
fn failed_render_discards_partial_output() {
    let mut rig = Rig::new();
    let paper = Recording::default();
    *paper.fail_render.borrow_mut() = true;
    rig.space
        .add_paper(PaperId(3), rect(A), paper.boxed())
        .unwrap();

    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    let draws = rig.space.render();
    assert_eq!(draws.len(), 1);
    assert_eq!(
        draws.iter().next().map(|c| c.material.clone()),
        Some(Material::solid(Color::FAULT))
    );
    assert!(matches!(
        rig.space.status(PaperId(3)),
        Some(PaperStatus::Faulted {
            phase: LifecyclePhase::Render,
            ..
        })
    ));

    // Stays faulted until an update succeeds.
    let _ = rig.space.render();
    assert_eq!(paper.calls().render, 1);
}

#[test]
fn failed_show_still_marks_the_paper_visible() {
    let mut rig = Rig::new();
    let paper = Recording::default();
    *paper.fail_show.borrow_mut() = true;
    rig.space
        .add_paper(PaperId(1), rect(A), paper.boxed())
        .unwrap();

    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    assert!(rig.space.is_visible(PaperId(1)));
    // The update that followed succeeded and cleared the fault.
    assert_eq!(paper.calls().update, 1);
    assert_eq!(rig.space.status(PaperId(1)), Some(&PaperStatus::Ok));
}

#[test]
fn shutdown_hides_every_visible_paper() {
    let mut rig = Rig::new();
    let a = Recording::default();
    let b = Recording::default();
    rig.space.add_paper(PaperId(1), rect(A), a.boxed()).unwrap();
    rig.space.add_paper(PaperId(2), rect(B), b.boxed()).unwrap();

    rig.frame(&sheet(A, [0.0, 0.0], 100.0));
    rig.space.shutdown();

    assert_eq!(a.calls().hide, 1);
    assert_eq!(b.calls().hide, 0);
    assert!(rig.space.visible_ids().is_empty());
    assert!(rig.space.render().is_empty());
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut space = Space::new(PerspectiveProjector::identity());
    let paper = Recording::default();
    space.add_paper(PaperId(1), rect(A), paper.boxed()).unwrap();
    assert_eq!(
        space.add_paper(PaperId(1), rect(B), paper.boxed()),
        Err(SpaceError::DuplicatePaper(PaperId(1)))
    );
    assert_eq!(space.len(), 1);
}
