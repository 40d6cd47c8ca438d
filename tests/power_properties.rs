//! Property tests for the power table
//!
//! Whatever sequence of writes arrives, the live table keeps every channel
//! inside 0-100% and the total at 100%. Rejected writes change nothing.

use proptest::prelude::*;

use starship_bridge::command::BridgeCommand;
use starship_bridge::core::ShipConfig;
use starship_bridge::power::{PowerChannel, PowerDistribution, PowerSystem, SUM_TOLERANCE};
use starship_bridge::ship::{StarChart, StarshipCore};

fn channel() -> impl Strategy<Value = PowerChannel> {
    prop::sample::select(PowerChannel::ALL.to_vec())
}

fn assert_valid(dist: &PowerDistribution) {
    assert!((dist.sum() - 100.0).abs() <= SUM_TOLERANCE, "sum drifted: {}", dist);
    for ch in PowerChannel::ALL {
        let v = dist.get(ch);
        assert!((0.0..=100.0).contains(&v), "{} out of range: {}", ch, v);
    }
}

proptest! {
    #[test]
    fn test_modify_sequences_stay_balanced(
        ops in prop::collection::vec((channel(), -60.0f32..60.0), 1..60)
    ) {
        let mut power = PowerSystem::new();
        for (ch, delta) in ops {
            let before = *power.distribution();
            if power.modify(ch, delta).is_err() {
                prop_assert_eq!(*power.distribution(), before);
            }
            assert_valid(power.distribution());
        }
    }

    #[test]
    fn test_set_distribution_is_atomic(
        values in prop::array::uniform4(-20.0f32..120.0)
    ) {
        let mut power = PowerSystem::new();
        let before = *power.distribution();
        let candidate = PowerDistribution::new(values[0], values[1], values[2], values[3]);

        match power.set_distribution(candidate) {
            Ok(()) => prop_assert_eq!(*power.distribution(), candidate),
            Err(_) => prop_assert_eq!(*power.distribution(), before),
        }
        assert_valid(power.distribution());
    }

    #[test]
    fn test_ramp_points_are_valid(
        a in (channel(), -40.0f32..40.0),
        b in (channel(), -40.0f32..40.0),
        t in 0.0f32..=1.0,
    ) {
        let base = PowerDistribution::default();
        let from = PowerSystem::modified(&base, a.0, a.1).unwrap_or(base);
        let to = PowerSystem::modified(&base, b.0, b.1).unwrap_or(base);
        assert_valid(&PowerDistribution::lerp(&from, &to, t));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Engineering orders interleaved with ticks never leave an invalid table
    #[test]
    fn test_engineering_orders_keep_ship_table_valid(
        orders in prop::collection::vec((channel(), -50.0f32..50.0, 0u32..20), 1..12)
    ) {
        let mut core = StarshipCore::with_standard_departments(
            ShipConfig::default(),
            StarChart::sol_system(),
        )
        .unwrap();

        for (ch, delta, ticks) in orders {
            let cmd = BridgeCommand::new("engineering", "boost")
                .with_channel(ch.name())
                .with_amount(delta);
            core.route_command(&cmd);
            for _ in 0..ticks {
                core.tick(0.1);
                assert_valid(core.distribution());
            }
        }
    }
}
