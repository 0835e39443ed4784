//! 故障处理与定时集成测试
//!
//! 覆盖执行器故障、超时周期、停止信号、日志失败以及 Drop 安全网。

mod common;

use common::{FailingLog, RecordingActuator, ScriptedSensor, fail, ok, test_config};
use luxo_control::control::{Clock, ControlLoop, ManualClock, StopSignal};
use luxo_control::hardware::{JointSensor, SimulatedJoint, SimulationParams};
use luxo_control::{
    ActuatorFault, ControlError, FaultKind, JointState, LoopState, SensorFault, StopReason,
};
use luxo_tools::{JumpConfig, LogError, LogRecord, LogSink, MemoryLog};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

#[test]
fn test_actuator_fault_is_fatal_and_retries_safe_torque() {
    let mut config = test_config(10);
    config.limits.safe_torque = 0.25;

    // 写入 0、1 成功；2 失败（周期 2）；3 为第一次安全力矩（失败）；4 为重试（成功）
    let mut actuator = RecordingActuator::failing_at([2, 3]);
    let mut log = MemoryLog::new();
    let mut control = ControlLoop::with_clock(
        config,
        ScriptedSensor::positions(&[0.1; 10]),
        &mut actuator,
        &mut log,
        ManualClock::new(),
    )
    .unwrap();

    let err = control.run().unwrap_err();
    assert!(matches!(
        err,
        ControlError::ActuatorFault {
            cycle: 2,
            source: ActuatorFault::Hardware(_)
        }
    ));
    assert_eq!(err.kind(), FaultKind::ActuatorFault);

    let report = control.report().cloned().unwrap();
    assert_eq!(report.stop_reason, StopReason::Fault(FaultKind::ActuatorFault));
    assert!(report.shutdown_clean);
    assert_eq!(control.state(), LoopState::Stopped);
    drop(control);

    assert_eq!(actuator.writes, vec![2.0, 2.0, 2.0, 0.25, 0.25]);
    assert_eq!(actuator.releases, 2);
    // 失败的周期不写日志
    assert_eq!(log.records().len(), 2);
}

#[test]
fn test_safe_torque_retry_failure_marks_unclean_shutdown() {
    let mut actuator = RecordingActuator::failing_at([0, 1, 2]);
    let mut control = ControlLoop::with_clock(
        test_config(5),
        ScriptedSensor::positions(&[0.1; 5]),
        &mut actuator,
        MemoryLog::new(),
        ManualClock::new(),
    )
    .unwrap();

    assert!(control.run().is_err());
    assert!(!control.report().unwrap().shutdown_clean);
    drop(control);
    // 周期写入 + 安全力矩 + 一次重试，没有更多尝试
    assert_eq!(actuator.writes.len(), 3);
    assert_eq!(actuator.releases, 2);
}

#[test]
fn test_overruns_are_counted_not_absorbed() {
    let clock = ManualClock::new();
    let slow = Duration::from_micros(3_000); // 周期 2.5ms
    let sensor = ScriptedSensor::new([
        ok(0.1, 0.0),
        ok(0.1, 0.0).taking(slow),
        ok(0.1, 0.0),
        ok(0.1, 0.0),
    ])
    .with_clock(clock.clone());

    let mut log = MemoryLog::new();
    let mut control = ControlLoop::with_clock(
        test_config(4),
        sensor,
        RecordingActuator::new(),
        &mut log,
        clock.clone(),
    )
    .unwrap();

    let report = control.run().unwrap();
    assert_eq!(report.deadline_misses, 1);
    assert_eq!(report.timing.overruns, 1);
    drop(control);

    let missed: Vec<_> = log.records().iter().map(|r| r.deadline_missed).collect();
    assert_eq!(missed, vec![false, true, false, false]);

    // 超时后锚点重置为当前时间：周期 2 紧接着开始，不补跑
    let times: Vec<_> = log.records().iter().map(|r| r.time).collect();
    assert!((times[2] - 0.0055).abs() < 1e-9, "times: {times:?}");
    assert!((times[3] - 0.0080).abs() < 1e-9, "times: {times:?}");
}

/// 每次追加都推进虚拟时钟的日志
struct SlowLog {
    clock: ManualClock,
    cost: Duration,
    records: Vec<LogRecord>,
}

impl LogSink for SlowLog {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        self.clock.advance(self.cost);
        self.records.push(record);
        Ok(())
    }
}

#[test]
fn test_overrun_during_log_append_is_counted() {
    let clock = ManualClock::new();
    let log = SlowLog {
        clock: clock.clone(),
        cost: Duration::from_micros(7_500), // 周期 2.5ms
        records: Vec::new(),
    };
    let mut control = ControlLoop::with_clock(
        test_config(4),
        ScriptedSensor::positions(&[0.1; 4]),
        RecordingActuator::new(),
        log,
        clock.clone(),
    )
    .unwrap();

    let report = control.run().unwrap();
    assert_eq!(report.cycles, 4);
    assert_eq!(report.deadline_misses, 4);
    assert_eq!(report.timing.overruns, 4);
    assert_eq!(clock.now(), Duration::from_millis(30));
    // 判定发生在写日志之后，记录中的标志保持 false
    assert!(control.log().records.iter().all(|r| !r.deadline_missed));
}

#[test]
fn test_overrun_during_log_append_respects_limit() {
    let clock = ManualClock::new();
    let log = SlowLog {
        clock: clock.clone(),
        cost: Duration::from_micros(7_500),
        records: Vec::new(),
    };
    let mut config = test_config(10);
    config.faults.max_consecutive_deadline_misses = Some(1);

    let mut control = ControlLoop::with_clock(
        config,
        ScriptedSensor::positions(&[0.1; 10]),
        RecordingActuator::new(),
        log,
        clock,
    )
    .unwrap();

    let err = control.run().unwrap_err();
    assert!(matches!(
        err,
        ControlError::DeadlineMiss {
            cycle: 1,
            consecutive: 2,
            limit: 1
        }
    ));
    assert_eq!(control.log().records.len(), 2);
}

#[test]
fn test_consecutive_deadline_misses_exceeding_limit_abort() {
    let clock = ManualClock::new();
    let slow = Duration::from_micros(3_000);
    let sensor = ScriptedSensor::new((0..10).map(|_| ok(0.1, 0.0).taking(slow)))
        .with_clock(clock.clone());

    let mut config = test_config(10);
    config.faults.max_consecutive_deadline_misses = Some(2);

    let mut log = MemoryLog::new();
    let mut control =
        ControlLoop::with_clock(config, sensor, RecordingActuator::new(), &mut log, clock).unwrap();

    let err = control.run().unwrap_err();
    assert!(matches!(
        err,
        ControlError::DeadlineMiss {
            cycle: 2,
            consecutive: 3,
            limit: 2
        }
    ));
    drop(control);
    // 超限的周期已写日志
    assert_eq!(log.records().len(), 3);
    assert!(log.records().iter().all(|r| r.deadline_missed));
}

#[test]
fn test_slow_sensor_read_is_timeout_fault() {
    let clock = ManualClock::new();
    let sensor = ScriptedSensor::new([
        ok(0.1, 0.5),
        ok(0.2, 0.5).taking(Duration::from_millis(20)), // io_timeout 10ms
    ])
    .with_clock(clock.clone());

    let mut log = MemoryLog::new();
    let mut control =
        ControlLoop::with_clock(test_config(2), sensor, RecordingActuator::new(), &mut log, clock)
            .unwrap();
    control.run().unwrap();
    drop(control);

    let record = &log.records()[1];
    assert!(record.degraded);
    assert_eq!(record.position, Some(0.1));
    assert!(record.deadline_missed);
}

#[test]
fn test_stop_signal_stops_at_top_of_next_cycle() {
    let stop = StopSignal::new();
    let sensor = ScriptedSensor::positions(&[0.1; 100]).stop_after(3, stop.clone());

    let mut actuator = RecordingActuator::new();
    let mut log = MemoryLog::new();
    let mut control = ControlLoop::with_clock(
        test_config(100),
        sensor,
        &mut actuator,
        &mut log,
        ManualClock::new(),
    )
    .unwrap()
    .with_stop_signal(stop);

    let report = control.run().unwrap();
    assert_eq!(report.stop_reason, StopReason::StopSignal);
    assert_eq!(report.cycles, 3);
    drop(control);

    assert_eq!(log.records().len(), 3);
    assert_eq!(actuator.writes.last(), Some(&0.0));
}

#[test]
fn test_stop_signal_from_another_thread() {
    let mut config = JumpConfig::default();
    config.timing.max_duration_ms = 5_000;

    let joint = SimulatedJoint::new(SimulationParams::default());
    let (sensor, actuator) = joint.split();
    let mut control = ControlLoop::new(config, sensor, actuator, MemoryLog::new()).unwrap();

    let stop = control.stop_signal();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        stop.trigger();
    });

    let report = control.run().unwrap();
    handle.join().unwrap();

    assert_eq!(report.stop_reason, StopReason::StopSignal);
    assert!(report.duration_s < 4.0);
    assert!(report.cycles > 0);
    assert!(joint.is_released());
}

#[test]
fn test_log_failure_is_fatal() {
    let mut actuator = RecordingActuator::new();
    let mut control = ControlLoop::with_clock(
        test_config(10),
        ScriptedSensor::positions(&[0.1; 10]),
        &mut actuator,
        FailingLog {
            fail_at: 3,
            ..Default::default()
        },
        ManualClock::new(),
    )
    .unwrap();

    let err = control.run().unwrap_err();
    assert!(matches!(
        err,
        ControlError::Log {
            cycle: 3,
            source: LogError::Io(_)
        }
    ));
    assert_eq!(err.kind(), FaultKind::LogFailure);
    assert_eq!(control.log().records.len(), 3);
    drop(control);
    assert_eq!(actuator.writes.last(), Some(&0.0));
}

struct PanickingSensor {
    reads: u32,
}

impl JointSensor for PanickingSensor {
    fn read(&mut self, _timeout: Duration) -> Result<JointState, SensorFault> {
        self.reads += 1;
        if self.reads == 3 {
            panic!("sensor driver crashed");
        }
        Ok(JointState::new(luxo_control::Rad(0.1), luxo_control::RadPerSecond(0.0)))
    }
}

#[test]
fn test_drop_while_running_commands_safe_torque() {
    let params = SimulationParams::default();
    let joint = SimulatedJoint::new(params);
    let (_sensor, actuator) = joint.split();

    let mut config = test_config(10);
    config.limits.safe_torque = 0.1;

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut control = ControlLoop::with_clock(
            config,
            PanickingSensor { reads: 0 },
            actuator,
            MemoryLog::new(),
            ManualClock::new(),
        )
        .unwrap();
        let _ = control.run();
    }));

    assert!(result.is_err());
    assert_eq!(joint.commands(), vec![2.0, 2.0, 0.1]);
    assert!(joint.is_released());
}

#[test]
fn test_scripted_exhaustion_counts_as_sensor_fault() {
    let mut control = ControlLoop::with_clock(
        test_config(20),
        ScriptedSensor::new([ok(0.1, 0.0), fail()]),
        RecordingActuator::new(),
        MemoryLog::new(),
        ManualClock::new(),
    )
    .unwrap();

    let err = control.run().unwrap_err();
    assert_eq!(err.cycle(), Some(5));
    assert_eq!(err.kind(), FaultKind::SensorFault);
}
