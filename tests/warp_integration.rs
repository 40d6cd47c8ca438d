//! Warp integration tests
//!
//! Charge timing, the proximity interlock and its override, and autopilot
//! arrival, all driven through bridge commands and ticks.

use glam::Vec3;

use starship_bridge::command::BridgeCommand;
use starship_bridge::core::ShipConfig;
use starship_bridge::departments::Helm;
use starship_bridge::ship::{ShipEvent, StarChart, StarshipCore};
use starship_bridge::warp::WarpMode;

fn ship() -> StarshipCore {
    StarshipCore::with_standard_departments(ShipConfig::default(), StarChart::sol_system())
        .expect("default ship should build")
}

fn run_for(core: &mut StarshipCore, seconds: f32) {
    let steps = (seconds / 0.1).round() as u32;
    for _ in 0..steps {
        core.tick(0.1);
    }
}

/// Point the ship at +Z, away from Earth and into open space
fn face_outbound(core: &mut StarshipCore) {
    let body = core.body_mut();
    body.set_heading(180.0, 0.0);
    body.yaw = 180.0;
}

fn warp_to(factor: f32) -> BridgeCommand {
    BridgeCommand::new("helm", "warp").with_warp_factor(factor)
}

#[test]
fn test_charge_then_accelerate() {
    let mut core = ship();
    face_outbound(&mut core);
    let start = core.body().position;

    let result = core.route_command(&warp_to(4.0));
    assert!(result.success, "{}", result.message);
    assert_eq!(result.data["mode"], "charging");

    run_for(&mut core, 2.0);
    assert_eq!(core.warp().mode(), WarpMode::Charging);
    assert_eq!(core.body().position, start);

    run_for(&mut core, 1.2);
    assert_eq!(core.warp().mode(), WarpMode::AtWarp);
    assert!(core
        .drain_events()
        .contains(&ShipEvent::WarpEngaged { factor: 4.0 }));

    run_for(&mut core, 4.0);
    assert_eq!(core.warp().state().current_factor, 4.0);
    assert!(core.body().position.z > start.z + 10_000.0);
    let status = core.full_status();
    assert_eq!(status["warp"]["mode"], "at_warp");
    assert!((status["warp"]["max_factor"].as_f64().unwrap() - 9.99).abs() < 1e-4);
    assert!(status["warp"]["multiple_of_c"].as_f64().unwrap() > 1.0);
}

#[test]
fn test_engage_while_under_way_is_refused() {
    let mut core = ship();
    face_outbound(&mut core);
    assert!(core.route_command(&warp_to(3.0)).success);

    let charging = core.route_command(&BridgeCommand::new("helm", "engage").with_warp_factor(7.0));
    assert!(!charging.success);
    assert_eq!(charging.data["error"], "rejected");
    assert!(charging.message.contains("already charging"));
    assert_eq!(core.warp().state().target_factor, 3.0);

    run_for(&mut core, 3.5);
    assert!(core.warp().is_at_warp());
    let at_warp = core.route_command(&warp_to(5.0));
    assert!(!at_warp.success);
    assert_eq!(at_warp.message, "Already at warp");

    let retarget = core.route_command(
        &BridgeCommand::new("helm", "adjust warp").with_warp_factor(7.0),
    );
    assert!(retarget.success, "{}", retarget.message);
    assert!(retarget.message.contains("Adjusting"));
    assert_eq!(core.warp().state().target_factor, 7.0);
}

#[test]
fn test_blocked_course_with_warp_is_not_laid_in() {
    let mut core = ship();
    // 260 units off Earth's surface
    core.body_mut().position = Vec3::new(100_000.0, 0.0, 900.0);
    let heading = core.body().target_heading();

    let result = core.route_command(
        &BridgeCommand::new("helm", "navigate")
            .with_target("jupiter")
            .with_warp_factor(5.0),
    );
    assert!(!result.success);
    assert_eq!(result.data["error"], "rejected");
    assert_eq!(core.body().target_heading(), heading);
    assert!(core.get::<Helm>().unwrap().course().is_none());
    assert!(!core
        .drain_events()
        .iter()
        .any(|e| matches!(e, ShipEvent::CourseSet { .. })));
}

#[test]
fn test_proximity_block_and_single_use_override() {
    let mut core = ship();
    // 260 units off Earth's surface
    core.body_mut().position = Vec3::new(100_000.0, 0.0, 900.0);

    let blocked = core.route_command(&warp_to(3.0));
    assert!(!blocked.success);
    assert_eq!(blocked.data["error"], "rejected");
    assert!(blocked.message.contains("Earth"));
    assert!(core.drain_events().iter().any(|e| matches!(
        e,
        ShipEvent::WarpBlocked { nearest_body, .. } if nearest_body == "Earth"
    )));

    let override_cmd = BridgeCommand::new("helm", "safety_override");
    let first = core.route_command(&override_cmd);
    assert_eq!(first.data["armed"], false);
    assert_eq!(first.data["presses_remaining"], 2);
    core.route_command(&override_cmd);
    let third = core.route_command(&override_cmd);
    assert_eq!(third.data["armed"], true);
    assert!(core.warp().safety().is_armed());

    let engaged = core.route_command(&warp_to(3.0));
    assert!(engaged.success, "{}", engaged.message);
    assert!(core.warp().is_charging());
    assert!(!core.warp().safety().is_armed());
    let events = core.drain_events();
    assert!(events.contains(&ShipEvent::SafetyOverrideArmed));
    assert!(events.contains(&ShipEvent::SafetyOverrideUsed {
        obstruction: "Earth".into()
    }));

    let cancelled = core.route_command(&BridgeCommand::new("helm", "disengage"));
    assert_eq!(cancelled.message, "Warp charge cancelled");

    // The override was spent on the previous engagement
    let again = core.route_command(&warp_to(3.0));
    assert!(!again.success);
    assert_eq!(core.warp().mode(), WarpMode::Impulse);
}

#[test]
fn test_disengage_during_charge_never_reaches_warp() {
    let mut core = ship();
    face_outbound(&mut core);
    core.route_command(&warp_to(5.0));
    run_for(&mut core, 1.0);

    let result = core.route_command(&BridgeCommand::new("navigation", "disengage"));
    assert!(result.success);
    assert_eq!(result.data["mode"], "impulse");

    run_for(&mut core, 5.0);
    assert_eq!(core.warp().mode(), WarpMode::Impulse);
    let events = core.drain_events();
    assert!(events.contains(&ShipEvent::WarpChargeCancelled));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ShipEvent::WarpEngaged { .. })));
}

#[test]
fn test_cancel_warp_when_idle_fails() {
    let mut core = ship();
    let result = core.route_command(&BridgeCommand::new("helm", "cancel_warp"));
    assert!(!result.success);
    assert_eq!(result.message, "Warp drive is not charging");
}

#[test]
fn test_autopilot_drops_out_on_arrival() {
    let mut core = ship();
    face_outbound(&mut core);
    let start = core.body().position;
    let destination = start + Vec3::new(0.0, 0.0, 20_000.0);

    let mut cmd = BridgeCommand::new("helm", "navigate_coordinates").with_warp_factor(2.0);
    cmd.coordinates = Some([destination.x, destination.y, destination.z]);
    let result = core.route_command(&cmd);
    assert!(result.success, "{}", result.message);

    run_for(&mut core, 20.0);

    assert_eq!(core.warp().mode(), WarpMode::Impulse);
    assert_eq!(core.body().speed(), 0.0);
    let remaining = core.body().position.distance(destination);
    assert!(remaining > 1_500.0 && remaining <= 2_301.0, "stopped {} short", remaining);
    assert!(core
        .drain_events()
        .iter()
        .any(|e| matches!(e, ShipEvent::ArrivedAtDestination { .. })));
}

#[test]
fn test_stop_at_warp_is_full_stop() {
    let mut core = ship();
    face_outbound(&mut core);
    core.route_command(&BridgeCommand::new("helm", "impulse").with_impulse(50.0));
    core.route_command(&warp_to(2.0));
    run_for(&mut core, 3.5);
    assert!(core.warp().is_at_warp());

    let result = core.route_command(&BridgeCommand::new("helm", "all stop"));
    assert_eq!(result.data["dropped_from_warp"], true);
    core.tick(0.1);
    assert_eq!(core.body().speed(), 0.0);
    assert_eq!(core.body().impulse_percent(), 0.0);
}
