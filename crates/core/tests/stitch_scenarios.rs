use image::{DynamicImage, Rgba, RgbaImage};
use region_stitch_core::compositor::StitchSummary;
use region_stitch_core::geometry::Placement;
use region_stitch_core::selection::{GestureOutcome, PointerButton, RejectReason};
use region_stitch_core::session::{InputOutcome, PointerEvent};
use region_stitch_core::{
    Config, GroupId, Settings, SourceImage, StitchError, StitchOutcome, StitchSession, Viewport,
};

const EPS: f64 = 1e-6;

fn session_with(width: u32, height: u32, viewport: Viewport) -> StitchSession {
    let source = SourceImage::new(width, height).unwrap();
    StitchSession::seeded(source, viewport, Config::default(), 42).unwrap()
}

fn session() -> StitchSession {
    session_with(2000, 1600, Viewport::new(1000.0, 800.0))
}

fn group(id: u8) -> GroupId {
    GroupId::new(id).unwrap()
}

fn drag(session: &mut StitchSession, id: u8, from: (f64, f64), to: (f64, f64)) -> InputOutcome {
    session.set_active_group(group(id));
    let down = session.handle_pointer(PointerEvent::Down {
        x: from.0,
        y: from.1,
        button: PointerButton::Primary,
        over_ui: false,
    });
    if down != InputOutcome::Gesture(GestureOutcome::Started) {
        return down;
    }
    session.handle_pointer(PointerEvent::Move {
        x: to.0,
        y: to.1,
        dx: to.0 - from.0,
    });
    session.handle_pointer(PointerEvent::Up)
}

fn stitched(session: &mut StitchSession) -> StitchSummary {
    match session.stitch().unwrap() {
        StitchOutcome::Stitched(summary) => summary,
        other => panic!("expected a stitch, got {other:?}"),
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < EPS, "{actual} != {expected}");
}

fn assert_same_placement(a: &Placement, b: &Placement) {
    assert!(a.rotation.dot(b.rotation).abs() > 1.0 - 1e-12, "{a:?} vs {b:?}");
    assert!((a.translation - b.translation).length() < 1e-9, "{a:?} vs {b:?}");
}

#[test]
fn single_drag_round_trips_to_source_pixels() {
    let mut session = session();
    assert!(matches!(
        drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0)),
        InputOutcome::Gesture(GestureOutcome::Committed(_))
    ));

    let summary = stitched(&mut session);
    assert_eq!(summary.stacked, vec![group(0)]);

    let regions = session.pixel_regions().unwrap();
    assert_eq!(regions.len(), 1);
    let expected = [(200.0, 200.0), (200.0, 440.0), (600.0, 200.0), (600.0, 440.0)];
    for (point, (x, y)) in regions[0].footprint.iter().zip(expected) {
        assert_close(point.x, x);
        assert_close(point.y, y);
    }
    let rect = regions[0].rect.unwrap();
    assert_close(rect.width(), 400.0);
    assert_close(rect.height(), 240.0);
}

#[test]
fn overlapping_boxes_merge_into_one_region() {
    let mut session = session();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 300.0));
    drag(&mut session, 0, (200.0, 200.0), (400.0, 400.0));

    let summary = stitched(&mut session);
    // Each box is 0.5 units tall; the union spans 0.75, not 1.0.
    assert_close(summary.total_height, 0.75);

    let region = session.store().group(group(0)).cropped().unwrap();
    assert_close(region.height(), 0.75);
    assert_close(region.solid().footprint_area(), 0.25 + 0.25 - 0.0625);

    let rect = session.pixel_regions().unwrap()[0].rect.unwrap();
    assert_close(rect.min_x, 200.0);
    assert_close(rect.max_x, 800.0);
    assert_close(rect.min_y, 200.0);
    assert_close(rect.max_y, 800.0);
}

#[test]
fn skipped_group_gets_no_extra_separator() {
    let mut session = session();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    drag(&mut session, 2, (500.0, 400.0), (700.0, 600.0));

    let summary = stitched(&mut session);
    assert_eq!(summary.stacked, vec![group(0), group(2)]);
    assert_close(summary.total_height, 0.3 + 0.05 + 0.5);

    let composite = session.scene().composite().unwrap();
    assert_eq!(composite.separators().len(), 1);
    assert_eq!(composite.separators()[0].above, group(0));
    assert_eq!(composite.separators()[0].below, group(2));
    assert_close(composite.height(), summary.total_height);
}

#[test]
fn composite_height_sums_groups_and_separators() {
    let mut session = session();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 180.0));
    drag(&mut session, 1, (400.0, 100.0), (600.0, 260.0));
    drag(&mut session, 2, (100.0, 500.0), (900.0, 540.0));

    let summary = stitched(&mut session);
    let heights: f64 = [0, 1, 2]
        .iter()
        .map(|&id| session.store().group(group(id)).cropped_height())
        .sum();
    assert_close(summary.total_height, heights + 2.0 * 0.05);
    assert_eq!(session.scene().composite().unwrap().separators().len(), 2);
}

#[test]
fn stitch_without_selections_changes_nothing() {
    let mut session = session();
    let camera = session.scene().camera;
    let displayed = session.scene().displayed_solid().clone();

    assert_eq!(session.stitch().unwrap(), StitchOutcome::NothingSelected);
    assert!(!session.is_joined());
    assert_eq!(session.scene().camera, camera);
    assert_eq!(*session.scene().displayed_solid(), displayed);
}

#[test]
fn stitch_is_idempotent_once_joined() {
    let mut session = session();
    drag(&mut session, 1, (100.0, 100.0), (300.0, 220.0));
    stitched(&mut session);

    let camera = session.scene().camera;
    let composite = session.scene().displayed_solid().clone();
    let regions = session.pixel_regions().unwrap();

    assert_eq!(session.stitch().unwrap(), StitchOutcome::AlreadyJoined);
    assert_eq!(session.scene().camera, camera);
    assert_eq!(*session.scene().displayed_solid(), composite);
    assert_eq!(session.pixel_regions().unwrap(), regions);
}

#[test]
fn stitch_refits_camera_around_composite() {
    let mut session = session();
    let before = session.scene().camera;
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    stitched(&mut session);

    let camera = session.scene().camera;
    assert_ne!(camera, before);
    let bounds = session.scene().composite().unwrap().bounds();
    assert_close(camera.position.x, bounds.center().x);
    assert_close(camera.position.y, bounds.center().y);
    match camera.projection {
        region_stitch_core::camera::Projection::Orthographic { half_height } => {
            // 0.5 x 0.3 box on a 1.25 aspect viewport: width / aspect wins.
            assert_close(half_height, 0.4 * 1.8 * 0.5);
        }
        other => panic!("unexpected projection {other:?}"),
    }
}

#[test]
fn gestures_after_stitch_are_rejected() {
    let mut session = session();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    stitched(&mut session);

    let outcome = drag(&mut session, 1, (400.0, 400.0), (600.0, 600.0));
    assert_eq!(outcome, InputOutcome::Gesture(GestureOutcome::Rejected(RejectReason::Joined)));
    assert_eq!(session.store().selection_count(), 0);
    assert!(session.store().group(group(1)).cropped().is_none());
}

#[test]
fn tiny_gestures_never_create_selections() {
    let mut session = session();
    for (from, to) in [
        ((100.0, 100.0), (100.0, 100.0)),
        ((100.0, 100.0), (105.0, 400.0)),
        ((100.0, 100.0), (600.0, 109.0)),
    ] {
        assert_eq!(
            drag(&mut session, 0, from, to),
            InputOutcome::Gesture(GestureOutcome::Discarded)
        );
    }
    assert_eq!(session.store().selection_count(), 0);
}

#[test]
fn selections_off_the_image_abort_the_stitch() {
    // Wide viewport: the image covers only the middle half horizontally.
    let mut session = session_with(2000, 1600, Viewport::new(2000.0, 800.0));
    drag(&mut session, 0, (50.0, 100.0), (300.0, 300.0));
    let camera = session.scene().camera;

    let err = session.stitch().unwrap_err();
    assert!(matches!(err, StitchError::NothingToMerge));
    assert!(!session.is_joined());
    assert_eq!(session.store().selection_count(), 1);
    assert_eq!(session.scene().camera, camera);
    assert!(session.scene().composite().is_none());
}

#[test]
fn groups_missing_the_image_are_dropped() {
    let mut session = session_with(2000, 1600, Viewport::new(2000.0, 800.0));
    drag(&mut session, 0, (50.0, 100.0), (300.0, 300.0));
    drag(&mut session, 1, (600.0, 100.0), (900.0, 300.0));

    let summary = stitched(&mut session);
    assert_eq!(summary.stacked, vec![group(1)]);
    assert_eq!(summary.dropped, vec![group(0)]);
    assert!(session.scene().composite().unwrap().separators().is_empty());
}

#[test]
fn crops_stay_inside_the_image() {
    let mut session = session_with(2000, 1600, Viewport::new(2000.0, 800.0));
    drag(&mut session, 0, (300.0, 50.0), (800.0, 700.0));
    drag(&mut session, 0, (700.0, 300.0), (1900.0, 500.0));
    stitched(&mut session);

    let image = session.scene().source().local_bounds();
    let region = session.store().group(group(0)).cropped().unwrap();
    let bounds = region.solid().world_bounds().unwrap();
    assert!(image.contains_xy(&bounds, 1e-9));

    let rect = session.pixel_regions().unwrap()[0].rect.unwrap();
    assert!(rect.min_x >= -EPS && rect.max_x <= 2000.0 + EPS);
    assert!(rect.min_y >= -EPS && rect.max_y <= 1600.0 + EPS);
}

#[test]
fn rotations_compose_for_image_and_pending_selections() {
    let mut stepwise = session();
    let mut direct = session();
    for s in [&mut stepwise, &mut direct] {
        drag(s, 0, (100.0, 100.0), (300.0, 220.0));
        drag(s, 2, (600.0, 500.0), (800.0, 700.0));
    }

    stepwise.rotate_by(0.35);
    stepwise.rotate_by(0.9);
    direct.rotate_by(1.25);

    assert_same_placement(
        stepwise.scene().displayed_solid().placement(),
        direct.scene().displayed_solid().placement(),
    );
    for id in [0, 2] {
        let a = &stepwise.store().group(group(id)).selections()[0];
        let b = &direct.store().group(group(id)).selections()[0];
        assert_same_placement(a.solid().placement(), b.solid().placement());
        assert!(a.orientation().dot(b.orientation()).abs() > 1.0 - 1e-12);
    }
    assert_close(stepwise.rotation().current, 1.25);
}

#[test]
fn smoothed_rotation_settles_image_and_selections_together() {
    let config = Config::builder().with_rotation_smoothing(0.5).build().unwrap();
    let source = SourceImage::new(2000, 1600).unwrap();
    let mut session =
        StitchSession::seeded(source, Viewport::new(1000.0, 800.0), config, 42).unwrap();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));

    assert_close(session.rotate_by(1.0), 0.5);
    assert!(!session.rotation().is_settled());

    let mut ticks = 0;
    while session.tick() != 0.0 {
        ticks += 1;
        assert!(ticks < 100, "rotation never settled");
        let image = session.scene().displayed_solid().placement().angle_z();
        let selection = session.store().group(group(0)).selections()[0].solid().placement();
        assert_close(selection.angle_z(), image);
    }

    assert!(session.rotation().is_settled());
    assert_close(session.rotation().current, 1.0);
    assert_close(session.scene().displayed_solid().placement().angle_z(), 1.0);
    let selection = &session.store().group(group(0)).selections()[0];
    assert_close(selection.solid().placement().angle_z(), 1.0);
    assert_eq!(session.tick(), 0.0);
}

#[test]
fn degenerate_viewports_are_refused() {
    let source = SourceImage::new(200, 160).unwrap();
    let Err(err) = StitchSession::seeded(source, Viewport::new(0.0, 800.0), Config::default(), 42)
    else {
        panic!("zero-width viewport was accepted");
    };
    assert!(matches!(err, StitchError::Config(_)));

    let mut session = session();
    session.resize_viewport(Viewport::new(1280.0, 720.0)).unwrap();
    assert_eq!(session.scene().viewport, Viewport::new(1280.0, 720.0));

    for bad in [Viewport::new(0.0, 800.0), Viewport::new(640.0, f64::NAN)] {
        assert!(session.resize_viewport(bad).is_err());
    }
    assert_eq!(session.scene().viewport, Viewport::new(1280.0, 720.0));
}

#[test]
fn rotate_modifier_turns_pointer_moves_into_rotation() {
    let mut session = session();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));

    session.set_rotate_modifier(true);
    match session.handle_pointer(PointerEvent::Move { x: 530.0, y: 400.0, dx: 30.0 }) {
        InputOutcome::Rotated(angle) => assert_close(angle, 0.3),
        other => panic!("expected a rotation, got {other:?}"),
    }

    let blocked = session.handle_pointer(PointerEvent::Down {
        x: 10.0,
        y: 10.0,
        button: PointerButton::Primary,
        over_ui: false,
    });
    assert_eq!(blocked, InputOutcome::Gesture(GestureOutcome::Rejected(RejectReason::RotateMode)));

    let selection = &session.store().group(group(0)).selections()[0];
    assert_close(selection.solid().placement().angle_z(), 0.3);
    assert_close(session.scene().displayed_solid().placement().angle_z(), 0.3);

    session.set_rotate_modifier(false);
    assert_eq!(
        session.handle_pointer(PointerEvent::Move { x: 0.0, y: 0.0, dx: 5.0 }),
        InputOutcome::Ignored
    );
}

#[test]
fn selection_drawn_after_rotation_maps_to_unrotated_pixels() {
    let mut session = session();
    session.rotate_by(std::f64::consts::FRAC_PI_2);
    drag(&mut session, 0, (300.0, 300.0), (700.0, 500.0));
    stitched(&mut session);

    let rect = session.pixel_regions().unwrap()[0].rect.unwrap();
    assert_close(rect.min_x, 800.0);
    assert_close(rect.max_x, 1200.0);
    assert_close(rect.min_y, 400.0);
    assert_close(rect.max_y, 1200.0);

    // Cropped geometry is frozen.
    assert_eq!(session.rotate_by(0.5), 0.0);
    assert_close(session.rotation().current, std::f64::consts::FRAC_PI_2);
}

#[test]
fn recognized_text_is_split_across_stacked_groups() {
    let mut session = session();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    drag(&mut session, 2, (500.0, 400.0), (700.0, 600.0));

    assert!(matches!(session.distribute_text("early"), Err(StitchError::NotStitched)));
    stitched(&mut session);

    session.distribute_text("Header text\n###\nFooter text").unwrap();
    let store = session.store();
    assert_eq!(store.group(group(0)).text().get(), "Header text");
    assert_eq!(store.group(group(1)).text().get(), "");
    assert_eq!(store.group(group(2)).text().get(), "Footer text");

    assert!(session.set_group_text(group(1), "typed by hand"));
    assert_eq!(session.store().group(group(1)).text().get(), "typed by hand");
}

#[test]
fn finished_record_carries_rotation_text_and_pixels() {
    let mut session = session();
    session.rotate_by(0.0);
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    stitched(&mut session);
    session.distribute_text("Total: 42").unwrap();

    let record = session.finish(&Settings::default());
    assert_eq!(record.rotation_angle, 0.0);
    assert_eq!(record.groups.len(), GroupId::COUNT);

    let first = &record.groups[0];
    assert_eq!(first.tag, "title");
    assert_eq!(first.text, "Total: 42");
    assert_eq!(first.footprint.len(), 4);
    let rect = first.rect.unwrap();
    assert_close(rect.min_x, 200.0);
    assert_close(rect.max_y, 440.0);

    assert!(record.groups[1].footprint.is_empty());
    assert!(record.groups[1].rect.is_none());
}

#[test]
fn reset_unlocks_and_restores_the_image() {
    let mut session = session();
    session.rotate_by(0.4);
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    stitched(&mut session);

    session.reset();
    assert!(!session.is_joined());
    assert!(session.scene().composite().is_none());
    assert_eq!(*session.scene().displayed_solid().placement(), Placement::IDENTITY);
    assert_eq!(session.rotation().current, 0.0);

    assert!(matches!(
        drag(&mut session, 1, (100.0, 100.0), (300.0, 220.0)),
        InputOutcome::Gesture(GestureOutcome::Committed(_))
    ));
}

#[test]
fn loading_a_new_image_clears_everything() {
    let mut session = session();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    session.load_image(SourceImage::new(800, 600).unwrap());

    assert_eq!(session.store().selection_count(), 0);
    assert_eq!(session.scene().source().pixel_width(), 800);
    assert!(!session.is_joined());
}

#[test]
fn snapshot_shows_separator_between_groups() {
    let original = DynamicImage::ImageRgba8(RgbaImage::from_fn(200, 160, |x, y| {
        Rgba([x as u8, y as u8, 128, 255])
    }));
    let mut session = session_with(200, 160, Viewport::new(1000.0, 800.0));
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    drag(&mut session, 1, (500.0, 400.0), (700.0, 600.0));

    assert!(matches!(session.render_snapshot(&original), Err(StitchError::NotStitched)));
    stitched(&mut session);

    let rendered = session.render_snapshot(&original).unwrap();
    assert_eq!(rendered.separator_rows.len(), 1);
    // 0.05 world units at 80 pixels per unit.
    let band = &rendered.separator_rows[0];
    assert_eq!(band.end - band.start, 4);
    assert!((40..=42).contains(&rendered.image.width()));
}

#[test]
fn oversized_separators_fail_the_snapshot() {
    let original = DynamicImage::ImageRgba8(RgbaImage::new(200, 160));
    let config = Config::builder().with_separator_height(1.0e8).build().unwrap();
    let source = SourceImage::new(200, 160).unwrap();
    let mut session =
        StitchSession::seeded(source, Viewport::new(1000.0, 800.0), config, 42).unwrap();
    drag(&mut session, 0, (100.0, 100.0), (300.0, 220.0));
    drag(&mut session, 1, (500.0, 400.0), (700.0, 600.0));
    stitched(&mut session);

    let err = session.render_snapshot(&original).unwrap_err();
    assert!(matches!(err, StitchError::ImageProcessing(_)));
}
