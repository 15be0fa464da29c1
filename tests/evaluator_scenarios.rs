//! End-to-end evaluator behaviour over frame sequences.
//!
//! Covers vehicle selection, the size/position gates, the literal containment
//! rule and the obstacle debounce across consecutive frames.

use stencil_guard::{
    check_obstacles, check_size, evaluate_frame, select_vehicle, vehicle_box, DetectedObject,
    EvaluationState, EvaluatorConfig, FrameDetections, FrameEvaluator, FrameGeometry, Guidance,
    Rect, Tolerances,
};

const W: u32 = 1920;
const H: u32 = 1080;

fn centered_vehicle(height: f64) -> DetectedObject {
    DetectedObject::new("car", Rect::centered_at(960.0, 540.0, 1000.0, height))
}

fn small_obstacle() -> DetectedObject {
    // Well under 0.8x the vehicle on both axes, sitting inside it.
    DetectedObject::new("person", Rect::centered_at(900.0, 500.0, 200.0, 400.0))
}

fn obstructed_frame() -> FrameDetections {
    FrameDetections::new(W, H, vec![centered_vehicle(900.0), small_obstacle()])
}

fn clear_frame() -> FrameDetections {
    FrameDetections::new(W, H, vec![centered_vehicle(900.0)])
}

#[test]
fn frames_without_vehicle_labels_fail_size() {
    let frames = [
        vec![],
        vec![DetectedObject::new("person", Rect::new(0.0, 0.0, 1000.0, 900.0))],
        vec![
            DetectedObject::new("bus", Rect::centered_at(960.0, 540.0, 1000.0, 900.0)),
            DetectedObject::new("bicycle", Rect::new(10.0, 10.0, 50.0, 50.0)),
        ],
    ];
    let tolerances = Tolerances::default();
    for objects in frames {
        assert_eq!(select_vehicle(&objects), None);
        let vbox = vehicle_box(&objects);
        assert_eq!(vbox, Rect::ZERO);
        assert!(!check_size(&tolerances, &vbox));

        let frame = FrameDetections::new(W, H, objects);
        let (verdict, _) =
            evaluate_frame(&EvaluatorConfig::default(), &EvaluationState::new(), &frame);
        assert!(!verdict.size_ok);
        assert!(!verdict.vehicle_fits);
        assert_eq!(verdict.guidance, Some(Guidance::FitVehicleInStencil));
        assert_eq!(
            verdict.guidance_message(),
            Some("Please Fit Vehicle In Stencil")
        );
    }
}

#[test]
fn reported_obstacles_always_intersect_vehicle() {
    let vehicle = Rect::new(460.0, 140.0, 1000.0, 800.0);
    let mut candidates = Vec::new();
    for i in 0..12 {
        for j in 0..8 {
            let x = i as f64 * 180.0 - 100.0;
            let y = j as f64 * 150.0 - 100.0;
            candidates.push(DetectedObject::new(
                format!("obj{}_{}", i, j),
                Rect::new(x, y, 120.0 + i as f64 * 20.0, 90.0 + j as f64 * 30.0),
            ));
        }
    }
    let (obstacles, present) = check_obstacles(&candidates, &vehicle, 0.8);
    assert!(present);
    assert!(obstacles.len() < candidates.len());
    for obstacle in &obstacles {
        assert!(obstacle.object.bounding_box.intersects(&vehicle));
    }
}

#[test]
fn candidate_dwarfing_vehicle_is_not_an_obstacle() {
    let vehicle = Rect::new(0.0, 0.0, 1000.0, 800.0);
    let huge = DetectedObject::new("building", Rect::new(-150.0, -150.0, 1300.0, 1100.0));
    let (obstacles, present) = check_obstacles(std::slice::from_ref(&huge), &vehicle, 0.8);
    assert!(obstacles.is_empty());
    assert!(!present);

    // 0.8 * 900 = 720 is not > 1000, so this overlapping box counts.
    let smaller = DetectedObject::new("tree", Rect::new(0.0, 0.0, 900.0, 700.0));
    let (obstacles, present) = check_obstacles(std::slice::from_ref(&smaller), &vehicle, 0.8);
    assert_eq!(obstacles.len(), 1);
    assert!(present);
}

#[test]
fn size_band_endpoints_pass() {
    let tolerances = Tolerances::default();
    for (height, expected) in [
        (699.0, false),
        (700.0, true),
        (900.0, true),
        (1100.0, true),
        (1101.0, false),
    ] {
        let r = Rect::new(0.0, 0.0, 1000.0, height);
        assert_eq!(check_size(&tolerances, &r), expected, "height {}", height);
    }
}

#[test]
fn alert_raises_on_tenth_consecutive_frame() {
    let mut evaluator = FrameEvaluator::new(EvaluatorConfig::default());
    for frame_no in 1..=9 {
        let verdict = evaluator.evaluate(&obstructed_frame());
        assert!(verdict.vehicle_fits);
        assert_eq!(verdict.obstacles.len(), 1);
        assert_eq!(verdict.obstacle_streak, frame_no);
        assert!(!verdict.obstacle_alert_active, "frame {}", frame_no);
    }
    let verdict = evaluator.evaluate(&obstructed_frame());
    assert_eq!(verdict.obstacle_streak, 10);
    assert!(verdict.obstacle_alert_active);

    for _ in 0..5 {
        assert!(evaluator.evaluate(&obstructed_frame()).obstacle_alert_active);
    }

    let verdict = evaluator.evaluate(&clear_frame());
    assert!(!verdict.obstacle_alert_active);
    assert_eq!(verdict.obstacle_streak, 0);
    assert!(verdict.obstacles.is_empty());
}

#[test]
fn single_clean_frame_after_nine_resets_streak() {
    let mut evaluator = FrameEvaluator::new(EvaluatorConfig::default());
    for _ in 0..9 {
        evaluator.evaluate(&obstructed_frame());
    }
    let verdict = evaluator.evaluate(&clear_frame());
    assert_eq!(verdict.obstacle_streak, 0);
    assert!(!verdict.obstacle_alert_active);

    let verdict = evaluator.evaluate(&obstructed_frame());
    assert_eq!(verdict.obstacle_streak, 1);
    assert!(!verdict.obstacle_alert_active);
}

#[test]
fn streak_is_frozen_while_vehicle_is_not_framed() {
    let mut evaluator = FrameEvaluator::new(EvaluatorConfig::default());
    for _ in 0..6 {
        evaluator.evaluate(&obstructed_frame());
    }

    // Vehicle shifted far right: position gate fails, streak untouched.
    let off_center = FrameDetections::new(
        W,
        H,
        vec![
            DetectedObject::new("car", Rect::centered_at(1400.0, 540.0, 1000.0, 900.0)),
            small_obstacle(),
        ],
    );
    let verdict = evaluator.evaluate(&off_center);
    assert!(verdict.size_ok);
    assert!(!verdict.position_ok);
    assert_eq!(verdict.guidance, Some(Guidance::MoveRight));
    assert!(verdict.obstacles.is_empty());
    assert_eq!(verdict.obstacle_streak, 6);

    // Vehicle lost entirely: size gate fails, streak still untouched.
    let verdict = evaluator.evaluate(&FrameDetections::new(W, H, vec![small_obstacle()]));
    assert_eq!(verdict.obstacle_streak, 6);
    assert_eq!(evaluator.state().obstacle_present_streak(), 6);
    assert_eq!(evaluator.state().missing_vehicle_streak(), 1);

    for _ in 0..4 {
        evaluator.evaluate(&obstructed_frame());
    }
    assert!(evaluator.evaluate(&obstructed_frame()).obstacle_alert_active);
}

#[test]
fn evaluation_is_deterministic() {
    let config = EvaluatorConfig::default();
    let mut state = EvaluationState::new();
    for _ in 0..4 {
        state = evaluate_frame(&config, &state, &obstructed_frame()).1;
    }
    let frame = obstructed_frame().with_brightness(1.0);
    let (first, first_state) = evaluate_frame(&config, &state, &frame);
    let (second, second_state) = evaluate_frame(&config, &state, &frame);
    assert_eq!(first, second);
    assert_eq!(first_state, second_state);
    assert!(first.low_light);
}

#[test]
fn well_framed_scenario_raises_and_clears_alert() {
    let mut evaluator = FrameEvaluator::new(EvaluatorConfig::default());
    let mut alerts = Vec::new();
    for _ in 0..12 {
        alerts.push(evaluator.evaluate(&obstructed_frame()).obstacle_alert_active);
    }
    let expected: Vec<bool> = (1..=12).map(|n| n >= 10).collect();
    assert_eq!(alerts, expected);

    let verdict = evaluator.evaluate(&FrameDetections::new(W, H, vec![centered_vehicle(900.0)]));
    assert!(verdict.vehicle_fits);
    assert!(!verdict.obstacle_alert_active);
}

#[test]
fn custom_threshold_and_geometry_are_honoured() {
    let geometry = FrameGeometry::new(1280.0, 720.0, 50.0, 50.0).expect("geometry");
    let tolerances = Tolerances {
        min_vehicle_height: 300.0,
        max_vehicle_height: 600.0,
        obstacle_streak_threshold: 2,
        ..Tolerances::default()
    };
    let config = EvaluatorConfig::new(geometry, tolerances).expect("config");
    let mut evaluator = FrameEvaluator::new(config);

    let frame = FrameDetections::new(
        1280,
        720,
        vec![
            DetectedObject::new("truck", Rect::centered_at(640.0, 360.0, 700.0, 500.0)),
            DetectedObject::new("cone", Rect::centered_at(640.0, 200.0, 60.0, 80.0)),
        ],
    );
    assert!(!evaluator.evaluate(&frame).obstacle_alert_active);
    assert!(evaluator.evaluate(&frame).obstacle_alert_active);

    let low = FrameDetections::new(
        1280,
        720,
        vec![DetectedObject::new(
            "truck",
            Rect::centered_at(640.0, 280.0, 700.0, 500.0),
        )],
    );
    let verdict = evaluator.evaluate(&low);
    assert_eq!(verdict.guidance, Some(Guidance::MoveBottom));
}
