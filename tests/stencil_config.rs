use std::io::Write;
use std::sync::Mutex;

use tempfile::{Builder, NamedTempFile};

use stencil_guard::config::StencilConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "STENCIL_CONFIG",
        "STENCIL_SOURCE",
        "STENCIL_FRAME_WIDTH",
        "STENCIL_FRAME_HEIGHT",
        "STENCIL_MAX_DX",
        "STENCIL_MAX_DY",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = StencilConfig::load().expect("load defaults");
    let geometry = cfg.evaluator.geometry();
    assert_eq!(cfg.source, "stub://centered");
    assert_eq!(geometry.frame_width(), 1920.0);
    assert_eq!(geometry.frame_height(), 1080.0);
    assert_eq!(geometry.max_dx(), 300.0);
    assert_eq!(geometry.max_dy(), 200.0);
    assert_eq!(cfg.evaluator.tolerances().obstacle_streak_threshold, 10);
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": "captures/driveway.jsonl",
        "frame": {
            "width": 1280,
            "height": 720,
            "max_dx": 150
        },
        "tolerances": {
            "min_vehicle_height": 400,
            "max_vehicle_height": 650,
            "obstacle_streak_threshold": 6
        }
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("STENCIL_CONFIG", file.path());
    std::env::set_var("STENCIL_MAX_DY", "90");

    let cfg = StencilConfig::load().expect("load config");
    let geometry = cfg.evaluator.geometry();
    let tolerances = cfg.evaluator.tolerances();

    assert_eq!(cfg.source, "captures/driveway.jsonl");
    assert_eq!(geometry.frame_width(), 1280.0);
    assert_eq!(geometry.frame_height(), 720.0);
    assert_eq!(geometry.max_dx(), 150.0);
    assert_eq!(geometry.max_dy(), 90.0);
    assert_eq!(tolerances.min_vehicle_height, 400.0);
    assert_eq!(tolerances.max_vehicle_height, 650.0);
    assert_eq!(tolerances.obstacle_streak_threshold, 6);
    assert_eq!(tolerances.containment_ratio, 0.8);

    clear_env();
}

#[test]
fn loads_toml_config_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
source = "stub://obstructed"

[frame]
width = 3840
height = 2160

[tolerances]
containment_ratio = 0.75
min_brightness = 1.5
"#;
    file.write_all(toml.as_bytes()).expect("write config");

    let cfg = StencilConfig::from_path(file.path()).expect("load toml");
    assert_eq!(cfg.source, "stub://obstructed");
    assert_eq!(cfg.evaluator.geometry().frame_width(), 3840.0);
    assert_eq!(cfg.evaluator.geometry().max_dx(), 300.0);
    assert_eq!(cfg.evaluator.tolerances().containment_ratio, 0.75);
    assert_eq!(cfg.evaluator.tolerances().min_brightness, 1.5);
}

#[test]
fn invalid_geometry_fails_fast() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("STENCIL_FRAME_WIDTH", "0");
    assert!(StencilConfig::load().is_err());

    std::env::set_var("STENCIL_FRAME_WIDTH", "wide");
    assert!(StencilConfig::load().is_err());

    clear_env();
}

#[test]
fn invalid_tolerances_fail_fast() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(br#"{"tolerances":{"min_vehicle_height":1200,"max_vehicle_height":1100}}"#)
        .expect("write config");
    assert!(StencilConfig::from_path(file.path()).is_err());

    assert!(StencilConfig::from_path("does/not/exist.json").is_err());
}

#[test]
fn misspelt_tolerance_key_fails_load() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(br#"{"tolerances":{"min_vehcle_height":800}}"#)
        .expect("write config");
    let err = StencilConfig::from_path(file.path()).expect_err("typo must not load");
    assert!(format!("{:#}", err).contains("min_vehcle_height"));
}
