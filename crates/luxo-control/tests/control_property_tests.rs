//! 控制律的属性测试
//!
//! 使用 proptest 验证阶段切换与力矩命令的不变量。

mod common;

use common::{RecordingActuator, ScriptedSensor, test_config};
use luxo_control::control::{
    ControlLoop, ManualClock, PdGains, PhaseMachine, TorqueCommandGenerator, next_phase, pd_torque,
};
use luxo_control::{JointState, NewtonMeter, Rad, RadPerSecond};
use luxo_tools::{ControlPhase, MemoryLog, ThresholdDirection};
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = ThresholdDirection> {
    prop_oneof![Just(ThresholdDirection::Increasing), Just(ThresholdDirection::Decreasing)]
}

fn phase() -> impl Strategy<Value = ControlPhase> {
    prop_oneof![Just(ControlPhase::Launch), Just(ControlPhase::Stabilize)]
}

proptest! {
    /// 起跳阶段的力矩与传感器读数无关
    #[test]
    fn launch_torque_ignores_state(
        launch in -5.0..5.0f64,
        position in -50.0..50.0f64,
        velocity in -50.0..50.0f64,
    ) {
        let gains = PdGains::new(3.0, 0.3, Rad(1.0), RadPerSecond(0.0));
        let mut generator = TorqueCommandGenerator::new(NewtonMeter(launch), gains, NewtonMeter(5.0));
        let state = JointState::new(Rad(position), RadPerSecond(velocity));
        let command = generator.compute(ControlPhase::Launch, Some(&state));
        prop_assert_eq!(command.commanded, NewtonMeter(launch));
        prop_assert!(!command.saturated);
    }

    /// 稳定阶段：钳位前等于 PD 律，钳位后在限幅内
    #[test]
    fn stabilize_torque_is_clamped_pd(
        kp in 0.0..50.0f64,
        kd in 0.0..5.0f64,
        target in -3.0..3.0f64,
        position in -10.0..10.0f64,
        velocity in -20.0..20.0f64,
        torque_max in 0.0..10.0f64,
    ) {
        let gains = PdGains::new(kp, kd, Rad(target), RadPerSecond(0.0));
        let mut generator = TorqueCommandGenerator::new(NewtonMeter(0.0), gains, NewtonMeter(torque_max));
        let state = JointState::new(Rad(position), RadPerSecond(velocity));
        let command = generator.compute(ControlPhase::Stabilize, Some(&state));

        let expected = kp * (target - position) + kd * (0.0 - velocity);
        prop_assert!((command.raw.0 - expected).abs() < 1e-9);
        prop_assert_eq!(command.raw, pd_torque(&gains, Rad(position), RadPerSecond(velocity)));
        prop_assert!(command.commanded.0.abs() <= torque_max);
        prop_assert_eq!(command.saturated, expected.abs() > torque_max);
    }

    /// 对同一状态重复判定得到同一阶段
    #[test]
    fn next_phase_is_idempotent(
        current in phase(),
        position in -10.0..10.0f64,
        threshold in -10.0..10.0f64,
        dir in direction(),
    ) {
        let once = next_phase(current, Rad(position), Rad(threshold), dir);
        let twice = next_phase(once, Rad(position), Rad(threshold), dir);
        prop_assert_eq!(once, twice);
    }

    /// 任意样本序列：最多一次切换，且永不回退
    #[test]
    fn phase_never_reverts(
        samples in prop::collection::vec(prop::option::of(-5.0..5.0f64), 1..200),
        threshold in -2.0..2.0f64,
        dir in direction(),
    ) {
        let mut machine = PhaseMachine::new(Rad(threshold), dir);
        let mut transitions = 0;
        let mut seen_stabilize = false;

        for (cycle, sample) in samples.iter().enumerate() {
            if machine.update(sample.map(Rad), cycle as u64) {
                transitions += 1;
            }
            if seen_stabilize {
                prop_assert_eq!(machine.phase(), ControlPhase::Stabilize);
            }
            seen_stabilize |= machine.phase() == ControlPhase::Stabilize;
        }
        prop_assert!(transitions <= 1);
    }

    /// 可达阈值：单调逼近的轨迹恰好切换一次
    #[test]
    fn reachable_threshold_transitions_exactly_once(
        threshold in 0.1..3.0f64,
        step in 0.001..0.2f64,
        extra in 1usize..50,
    ) {
        let mut machine = PhaseMachine::new(Rad(threshold), ThresholdDirection::Increasing);
        let crossing = (threshold / step).ceil() as usize;
        let mut transitions = 0;
        for cycle in 0..=crossing + extra {
            if machine.update(Some(Rad(cycle as f64 * step)), cycle as u64) {
                transitions += 1;
            }
        }
        prop_assert_eq!(transitions, 1);
        prop_assert_eq!(machine.phase(), ControlPhase::Stabilize);
    }

    /// 完整循环：日志阶段单调、力矩在限幅内、切换周期与报告一致
    #[test]
    fn loop_log_invariants(positions in prop::collection::vec(-1.0..2.0f64, 1..60)) {
        let config = test_config(positions.len() as u64);
        let torque_max = config.limits.torque_max;
        let mut log = MemoryLog::new();
        let mut control = ControlLoop::with_clock(
            config,
            ScriptedSensor::positions(&positions),
            RecordingActuator::new(),
            &mut log,
            ManualClock::new(),
        ).unwrap();
        let report = control.run().unwrap();
        drop(control);

        let run_log = log.into_run_log();
        prop_assert_eq!(run_log.len(), positions.len());
        prop_assert!(run_log.is_monotonic());
        prop_assert_eq!(run_log.transition_cycle(), report.transition_cycle);
        prop_assert!(run_log.records.iter().all(|r| r.torque.abs() <= torque_max));
    }
}
