// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Scenarios that cross module boundaries: a whole robot on the simulated bench.

use alloc::rc::Rc;
use alloc::vec;
use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use crate::control::{Action, Alignment, LineFollower, PolicyConfig};
use crate::drivers::{
    BatteryConfig, BatteryMonitor, ObstacleArray, ObstacleConfig, ReadMode, SensorConfig,
};
use crate::fixtures::{self, AMBIENT};
use crate::hw::mock::{EventKind, MockDelay, MockPin, MockPwm, Timeline};
use crate::hw::{make_reader, AnalogRead, Emitter, DUTY_MAX};
use crate::motors::{Kinematics, MotorDriver, MotorLegs, Turn};
use crate::storage::{CalibrationStore, MemoryStore};
use crate::{Robot, RobotConfig};

fn batched() -> RobotConfig {
    let mut config = RobotConfig::default();
    config.sensors.read_mode = ReadMode::Batched;
    config
}

#[test]
fn calibrated_threshold_reloads_without_drift() {
    let timeline = Timeline::new();
    let mut motors = fixtures::motors(&timeline);
    let swing = || vec![40_001, 10_000];
    let mut line = fixtures::line(
        &timeline,
        [swing(), swing(), swing(), swing(), swing()],
        SensorConfig::default(),
    );
    let mut store = CalibrationStore::new(MemoryStore::new());

    let report = crate::control::Calibrator::new(Default::default())
        .run(&mut motors, &mut line, &mut store)
        .unwrap();
    assert_eq!(report.threshold(), 25_000.5);

    // A fresh follower over a fresh view of the same backing store.
    let mut reopened = CalibrationStore::new(store.into_inner());
    let follower = LineFollower::from_store(&mut reopened, PolicyConfig::default());
    assert_eq!(follower.threshold().to_bits(), report.threshold().to_bits());
}

#[test]
fn robot_calibrates_then_follows() {
    let timeline = Timeline::new();
    let config = batched();
    let swing = || vec![40_000, 10_000];
    let line = fixtures::line(
        &timeline,
        [swing(), swing(), swing(), swing(), swing()],
        config.sensors,
    );
    let mut robot = Robot::new(
        fixtures::motors(&timeline),
        line,
        CalibrationStore::new(MemoryStore::with_contents(r#"{"min": 0, "max": 2000}"#)),
        &config,
    );
    assert_eq!(robot.threshold(), 1_000.0);

    let report = robot.calibrate().unwrap();
    assert_eq!(report.threshold(), 25_000.0);
    assert_eq!(report.alignment, Alignment::Aligned { steps: 1 });
    assert_eq!(robot.threshold(), 25_000.0);
    assert_eq!(robot.store().load().unwrap(), Some(25_000.0));

    // Sweep and alignment leave every sensor's cycle on 40000 for the next snapshot.
    assert_eq!(robot.follow_line_tick(), Action::Stop);
    assert!(robot.motors().state().is_braked());
    assert_eq!(robot.follow_line_tick(), Action::Forward);
    assert!(!robot.motors().state().is_braked());
}

#[test]
fn follow_line_stops_when_cancelled_mid_tick() {
    let timeline = Timeline::new();
    let cancel = AtomicBool::new(false);
    let reads = Rc::new(Cell::new(0u32));

    let pin = MockPin::new(&timeline, "ir");
    let level = pin.level();
    // The center sensor requests cancellation on its third lit sample.
    let sensor = |reading: i32, watch: bool| {
        let level = level.clone();
        let reads = reads.clone();
        let cancel = &cancel;
        move || {
            if !level.get() {
                return AMBIENT;
            }
            if watch {
                reads.set(reads.get() + 1);
                if reads.get() == 3 {
                    cancel.store(true, Ordering::Relaxed);
                }
            }
            (AMBIENT as i32 - reading) as u16
        }
    };
    let inputs = [
        sensor(30_000, false),
        sensor(30_000, false),
        sensor(0, true),
        sensor(30_000, false),
        sensor(30_000, false),
    ];
    let config = batched();
    let line = fixtures::line_with(&timeline, pin, inputs, config.sensors);
    let mut robot = Robot::new(
        fixtures::motors(&timeline),
        line,
        CalibrationStore::new(MemoryStore::new()),
        &config,
    );

    assert_eq!(robot.follow_line(&cancel), 2);
    // Two full ticks of 40 + 100 ms, then the third read before the cancelled wait.
    assert_eq!(timeline.now(), Duration::from_millis(320));
    assert!(robot.motors().state().is_braked());
}

/// Board ADC: line sensors on 0..5, obstacles on 5..9, battery on 9.
struct BoardAdc {
    emitter: Rc<Cell<bool>>,
    lit: u16,
    ambient: u16,
    obstacles: [u16; 4],
    battery: u16,
}

impl AnalogRead for BoardAdc {
    fn read_channel(&mut self, ch: u8) -> u16 {
        match ch {
            0..=4 if self.emitter.get() => self.lit,
            0..=4 => self.ambient,
            5..=8 => self.obstacles[(ch - 5) as usize],
            _ => self.battery,
        }
    }
}

#[test]
fn peripherals_share_one_converter() {
    let timeline = Timeline::new();
    let pin = MockPin::new(&timeline, "ir");
    let adc = RefCell::new(BoardAdc {
        emitter: pin.level(),
        lit: 5_000,
        ambient: 8_000,
        obstacles: [30_000, 4_000, 30_000, 30_000],
        battery: 21_484,
    });

    let mut line = crate::drivers::ReflectanceArray::new(
        core::array::from_fn::<_, 5, _>(|i| make_reader(&adc, i as u8)),
        Emitter::active_high(pin),
        MockDelay::new(&timeline),
        SensorConfig::default(),
    );
    let mut obstacles = ObstacleArray::new(
        core::array::from_fn::<_, 4, _>(|i| make_reader(&adc, 5 + i as u8)),
        ObstacleConfig::default(),
    );
    let battery = BatteryMonitor::new(make_reader(&adc, 9), BatteryConfig::default());

    let legs = MotorLegs {
        a_fwd: MockPwm::new(&timeline, "ain2"),
        a_rev: MockPwm::new(&timeline, "ain1"),
        b_fwd: MockPwm::new(&timeline, "bin2"),
        b_rev: MockPwm::new(&timeline, "bin1"),
    };
    let mut motors = MotorDriver::new(
        legs,
        MockDelay::new(&timeline),
        battery,
        Kinematics::default(),
    );

    assert_eq!(line.read_sensor(0), 3_000);
    assert_eq!(obstacles.scan(), [false, true, false, false]);
    assert!((motors.battery_voltage() - 4.0).abs() < 1e-3);

    timeline.clear_events();
    let start = timeline.now();
    let used = motors.turn_one_step(Turn::Left, 90.0);
    assert!((used.as_secs_f64() - 0.427_36).abs() < 1e-3);

    let brake = timeline
        .events()
        .into_iter()
        .rev()
        .find(|e| e.source == "ain1" && e.kind == EventKind::Duty(DUTY_MAX))
        .unwrap();
    let elapsed = (brake.at - start).as_secs_f64();
    assert!((elapsed - used.as_secs_f64()).abs() < 1e-5);
}

#[cfg(feature = "std")]
#[test]
fn file_backed_robot_keeps_calibration_across_restarts() {
    use crate::storage::FileStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calibration.json");
    let config = batched();
    let swing = || vec![36_000, 12_000];

    let timeline = Timeline::new();
    let line = fixtures::line(
        &timeline,
        [swing(), swing(), swing(), swing(), swing()],
        config.sensors,
    );
    let mut robot = Robot::new(
        fixtures::motors(&timeline),
        line,
        CalibrationStore::new(FileStore::new(&path)),
        &config,
    );
    assert_eq!(robot.threshold(), crate::storage::DEFAULT_THRESHOLD);
    let calibrated = robot.calibrate().unwrap().threshold();
    assert_eq!(calibrated, 24_000.0);
    drop(robot);

    let timeline = Timeline::new();
    let line = fixtures::line(
        &timeline,
        [swing(), swing(), swing(), swing(), swing()],
        config.sensors,
    );
    let robot = Robot::new(
        fixtures::motors(&timeline),
        line,
        CalibrationStore::new(FileStore::new(&path)),
        &config,
    );
    assert_eq!(robot.threshold(), calibrated);
}
