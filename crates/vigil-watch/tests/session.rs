use image::{GrayImage, Luma};
use vigil_proto::{GuardError, Point, Rect};
use vigil_vision::{DetectorConfig, Frame};
use vigil_watch::{Applied, ArmOutcome, Command, Edge, Mode, Session, SessionConfig, TickReport};
use vigil_zone::{MemoryZoneRepository, ZoneRepository};

const BG: u8 = 20;

fn scene(w: u32, h: u32, block: Option<(u32, u32)>) -> Frame {
    let img = GrayImage::from_fn(w, h, |x, y| match block {
        Some((bx, by)) if (bx..bx + 40).contains(&x) && (by..by + 40).contains(&y) => Luma([220]),
        _ => Luma([BG]),
    });
    Frame::from_gray(img)
}

fn empty_scene() -> Frame {
    scene(160, 120, None)
}

fn intruder_at(x: u32, y: u32) -> Frame {
    scene(160, 120, Some((x, y)))
}

fn session_with(repo: Box<dyn ZoneRepository>, per_tick: usize) -> Session {
    let cfg = SessionConfig { max_commands_per_tick: per_tick, ..Default::default() };
    Session::new(&cfg, DetectorConfig::default(), Rect::new(0, 0, 320, 240), (160, 120), repo)
}

fn session() -> Session {
    session_with(Box::new(MemoryZoneRepository::new()), 16)
}

fn draw_zone(s: &mut Session, pts: &[(i32, i32)]) {
    for &(x, y) in pts {
        s.enqueue(Command::AddZonePoint(Point::new(x, y)));
    }
    s.enqueue(Command::CloseZone);
}

/// Session with one zone covering the middle of the frame, armed on an empty scene.
fn armed_session() -> Session {
    let mut s = session();
    draw_zone(&mut s, &[(50, 30), (110, 30), (110, 90), (50, 90)]);
    s.enqueue(Command::Arm);
    let report = s.tick(Some(&empty_scene()));
    assert_eq!(report.mode, Mode::Hot);
    assert_eq!(s.zones().zones().len(), 1);
    report.commands.iter().for_each(|c| assert!(c.result.is_ok(), "{:?}", c));
    s
}

fn only_result(report: &TickReport) -> &Result<Applied, GuardError> {
    assert_eq!(report.commands.len(), 1, "{:?}", report.commands);
    &report.commands[0].result
}

#[test]
fn block_inside_zone_raises_alarm() {
    let mut s = armed_session();
    let report = s.tick(Some(&intruder_at(60, 40)));

    assert!(report.alarm);
    assert!(report.rising_edge());
    assert_eq!(report.intrusions, 1);
    assert_eq!(report.regions.len(), 1);
    let hit = report.regions[0];
    assert!(hit.in_zone);
    assert!(hit.region.area > 1500);
    assert_eq!(hit.sensor_centroid, hit.region.centroid, "no zoom, crop origin is the sensor origin");
}

#[test]
fn block_outside_zone_is_reported_without_alarm() {
    let mut s = armed_session();
    let report = s.tick(Some(&intruder_at(0, 0)));

    assert_eq!(report.regions.len(), 1);
    assert!(!report.regions[0].in_zone);
    assert!(!report.alarm);
    assert_eq!(report.edge, Some(Edge::Quiet));
    assert_eq!(report.intrusions, 0);
}

#[test]
fn episodes_count_once_each() {
    let mut s = armed_session();
    let frames = [intruder_at(60, 40), intruder_at(60, 40), empty_scene(), intruder_at(60, 40)];
    let edges: Vec<_> = frames.iter().map(|f| s.tick(Some(f))).map(|r| (r.edge, r.intrusions)).collect();
    assert_eq!(
        edges,
        vec![
            (Some(Edge::Rising), 1),
            (Some(Edge::Sustained), 1),
            (Some(Edge::Falling), 1),
            (Some(Edge::Rising), 2),
        ]
    );
}

#[test]
fn missing_frames_do_not_touch_the_episode() {
    let mut s = armed_session();
    assert!(s.tick(Some(&intruder_at(60, 40))).rising_edge());

    let gap = s.tick(None);
    assert!(!gap.had_frame);
    assert_eq!(gap.edge, None);
    assert_eq!(gap.mode, Mode::Hot);
    assert_eq!(gap.intrusions, 1);

    let report = s.tick(Some(&intruder_at(60, 40)));
    assert_eq!(report.edge, Some(Edge::Sustained));
    assert_eq!(report.intrusions, 1);
}

#[test]
fn cold_session_never_detects() {
    let mut s = session();
    draw_zone(&mut s, &[(0, 0), (159, 0), (159, 119), (0, 119)]);
    s.tick(None);
    let report = s.tick(Some(&intruder_at(60, 40)));
    assert_eq!(report.mode, Mode::Cold);
    assert!(report.regions.is_empty());
    assert!(!report.alarm);
    assert_eq!(report.edge, None);
}

#[test]
fn arm_needs_a_frame() {
    let mut s = session();
    s.enqueue(Command::Arm);
    let report = s.tick(None);
    assert!(matches!(only_result(&report), Err(GuardError::NotReady(_))));
    assert_eq!(report.mode, Mode::Cold);
    assert!(!report.armed());
}

#[test]
fn rearm_recaptures_reference() {
    let mut s = armed_session();
    assert!(s.tick(Some(&intruder_at(60, 40))).alarm);

    // the intruder stays put and becomes part of the scene
    s.enqueue(Command::Arm);
    let report = s.tick(Some(&intruder_at(60, 40)));
    assert_eq!(only_result(&report), &Ok(Applied::Armed(ArmOutcome::Rearmed)));

    let report = s.tick(Some(&intruder_at(60, 40)));
    assert!(report.regions.is_empty());
    assert_eq!(report.edge, Some(Edge::Quiet));
    assert_eq!(report.intrusions, 1);
}

#[test]
fn disarm_zeroes_count() {
    let mut s = armed_session();
    s.tick(Some(&intruder_at(60, 40)));
    s.enqueue(Command::Disarm);
    let report = s.tick(Some(&intruder_at(60, 40)));
    assert_eq!(only_result(&report), &Ok(Applied::Disarmed));
    assert_eq!(report.mode, Mode::Cold);
    assert_eq!(report.intrusions, 0);

    s.enqueue(Command::Disarm);
    let report = s.tick(None);
    assert_eq!(only_result(&report), &Ok(Applied::AlreadyCold));
}

#[test]
fn resolution_change_rebaselines_silently() {
    let mut s = armed_session();
    assert!(s.tick(Some(&intruder_at(60, 40))).rising_edge());

    // mid-episode, the intruder still in view at the new size
    let report = s.tick(Some(&scene(320, 240, Some((60, 40)))));
    assert!(report.regions.is_empty());
    assert!(!report.alarm);
    assert_eq!(report.edge, Some(Edge::Falling));
    assert_eq!(report.intrusions, 1);
    assert_eq!(report.crop, Rect::new(0, 0, 320, 240));
    assert_eq!(s.view().sensor_width, 320);

    let report = s.tick(Some(&scene(320, 240, Some((60, 40)))));
    assert!(report.regions.is_empty(), "new reference already holds the block");
    assert_eq!(report.intrusions, 1);
}

#[test]
fn zoom_while_armed_rebaselines_silently() {
    let mut s = armed_session();
    assert!(s.tick(Some(&intruder_at(60, 40))).rising_edge());

    s.enqueue(Command::SetZoom(2.0));
    let report = s.tick(Some(&empty_scene()));
    assert_eq!(report.edge, Some(Edge::Falling));
    assert_eq!(s.view().crop_rect(), Rect::new(0, 0, 80, 60));

    // smaller crop with something in it: becomes the reference, no alarm
    let report = s.tick(Some(&intruder_at(40, 20)));
    assert_eq!(report.crop, Rect::new(0, 0, 80, 60));
    assert!(report.regions.is_empty());
    assert!(!report.alarm);
    assert_eq!(report.intrusions, 1);
    assert_eq!(report.mode, Mode::Hot);

    let report = s.tick(Some(&intruder_at(40, 20)));
    assert!(report.regions.is_empty());
    assert_eq!(report.edge, Some(Edge::Quiet));
}

#[test]
fn pan_while_armed_does_not_alarm_on_shifted_scene() {
    // a static bright object; shifting the crop over it would look like motion
    let still = intruder_at(40, 30);
    let mut s = session();
    draw_zone(&mut s, &[(0, 0), (159, 0), (159, 119), (0, 119)]);
    s.enqueue(Command::SetZoom(2.0));
    s.tick(Some(&still));
    s.enqueue(Command::Arm);
    s.tick(Some(&still));
    assert_eq!(s.mode(), Mode::Hot);

    s.enqueue(Command::Pan { dx: -80, dy: -40 });
    let report = s.tick(Some(&still));
    assert!(report.regions.is_empty());
    assert_eq!(s.view().crop_rect(), Rect::new(20, 10, 80, 60));

    for _ in 0..2 {
        let report = s.tick(Some(&still));
        assert_eq!(report.crop, Rect::new(20, 10, 80, 60));
        assert!(report.regions.is_empty());
        assert!(!report.alarm);
    }
    assert_eq!(s.intrusions(), 0);
}

#[test]
fn pan_then_arm_in_one_tick_uses_the_new_view() {
    let still = intruder_at(40, 30);
    let mut s = session();
    draw_zone(&mut s, &[(0, 0), (159, 0), (159, 119), (0, 119)]);
    s.enqueue(Command::SetZoom(2.0));
    s.tick(Some(&still));

    // arm captures the crop cut before the pan
    s.enqueue(Command::Pan { dx: -80, dy: -40 });
    s.enqueue(Command::Arm);
    let report = s.tick(Some(&still));
    assert_eq!(report.crop, Rect::new(0, 0, 80, 60));
    assert_eq!(report.mode, Mode::Hot);

    for _ in 0..2 {
        let report = s.tick(Some(&still));
        assert!(report.regions.is_empty());
    }
    assert_eq!(s.intrusions(), 0);
}

#[test]
fn zoomed_detection_maps_back_to_sensor() {
    let mut s = session();
    draw_zone(&mut s, &[(50, 40), (70, 40), (70, 60), (50, 60)]);
    s.enqueue(Command::SetZoom(2.0));
    // display is four times the crop, so a -80,-40 drag moves the crop by 20,10
    s.enqueue(Command::Pan { dx: -80, dy: -40 });
    let report = s.tick(Some(&empty_scene()));
    assert!(report.commands.iter().all(|c| c.result.is_ok()));
    assert_eq!(s.view().crop_rect(), Rect::new(20, 10, 80, 60));

    s.enqueue(Command::Arm);
    let report = s.tick(Some(&empty_scene()));
    assert_eq!(report.crop, Rect::new(20, 10, 80, 60));
    assert_eq!(report.mode, Mode::Hot);

    let report = s.tick(Some(&intruder_at(40, 30)));
    assert_eq!(report.regions.len(), 1);
    let hit = report.regions[0];
    assert_eq!(hit.sensor_centroid, hit.region.centroid.offset(20, 10));
    assert!(hit.in_zone);
    assert!(report.rising_edge());
}

#[test]
fn zoom_below_one_is_floored() {
    let mut s = session();
    s.enqueue(Command::SetZoom(0.5));
    let report = s.tick(None);
    assert!(matches!(only_result(&report), Err(GuardError::InvalidGeometry(_))));
    assert_eq!(s.view().zoom, 1.0);
}

#[test]
fn command_budget_per_tick() {
    let mut s = session_with(Box::new(MemoryZoneRepository::new()), 2);
    for i in 0..5 {
        s.enqueue(Command::AddZonePoint(Point::new(i, i)));
    }
    let report = s.tick(None);
    assert_eq!(report.commands.len(), 2);
    assert_eq!(s.pending_commands(), 3);
    assert_eq!(s.zones().draft().len(), 2);

    s.tick(None);
    s.tick(None);
    assert_eq!(s.pending_commands(), 0);
    assert_eq!(s.zones().draft().len(), 5);
}

#[test]
fn clicks_are_mapped_to_sensor_space() {
    let mut s = session();
    s.enqueue(Command::ClickZonePoint(Point::new(100, 60)));
    let report = s.tick(None);
    assert_eq!(only_result(&report), &Ok(Applied::PointAdded(Point::new(50, 30))));
    assert_eq!(s.zones().draft(), &[Point::new(50, 30)]);
}

#[test]
fn short_draft_close_is_rejected() {
    let mut s = session();
    draw_zone(&mut s, &[(0, 0), (10, 10)]);
    let report = s.tick(None);
    let last = report.commands.last().map(|c| &c.result);
    assert!(matches!(last, Some(Err(GuardError::InvalidGeometry(_)))));
    assert!(s.zones().zones().is_empty());
    assert!(s.zones().draft().is_empty());
}

#[test]
fn sensitivity_is_clamped_and_applied() {
    let mut s = session();
    s.enqueue(Command::SetSensitivity(0));
    s.enqueue(Command::SetMinArea(2000));
    let report = s.tick(None);
    assert_eq!(report.commands[0].result, Ok(Applied::ThresholdSet(1)));
    assert_eq!(report.commands[1].result, Ok(Applied::MinAreaSet(2000)));
    assert_eq!(s.detector().config().threshold, 1);
    assert_eq!(s.detector().config().min_area, 2000);
}

#[test]
fn raised_min_area_hides_block() {
    let mut s = armed_session();
    s.enqueue(Command::SetMinArea(2000));
    s.tick(Some(&empty_scene()));
    let report = s.tick(Some(&intruder_at(60, 40)));
    assert!(report.regions.is_empty());
    assert!(!report.alarm);
}

#[test]
fn save_clear_load_round_trip() {
    let mut s = session();
    draw_zone(&mut s, &[(0, 0), (40, 0), (40, 40)]);
    s.enqueue(Command::SaveZones);
    s.enqueue(Command::ClearZones);
    let report = s.tick(None);
    assert_eq!(report.commands[4].result, Ok(Applied::ZonesSaved(1)));
    assert!(s.zones().zones().is_empty());

    s.enqueue(Command::LoadZones);
    let report = s.tick(None);
    assert_eq!(only_result(&report), &Ok(Applied::ZonesLoaded(1)));
    assert!(s.zones().contains(Point::new(30, 5)));
}

#[test]
fn corrupt_store_keeps_current_zones() {
    let mut s = session_with(Box::new(MemoryZoneRepository::with_bytes("{not zones")), 16);
    assert!(matches!(s.load_zones(), Err(GuardError::CorruptData(_))));

    draw_zone(&mut s, &[(0, 0), (40, 0), (40, 40)]);
    s.enqueue(Command::LoadZones);
    let report = s.tick(None);
    assert!(matches!(report.commands.last().map(|c| &c.result), Some(Err(GuardError::CorruptData(_)))));
    assert_eq!(s.zones().zones().len(), 1);
}

#[test]
fn empty_store_loads_nothing() {
    let mut s = session();
    assert_eq!(s.load_zones().unwrap(), 0);
}
