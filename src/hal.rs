//! Consumed interfaces: the physical serial transport, the system clock, the
//! hardware drivers, the custom-payload handler, and the reset primitive.
//!
//! Each trait here stands in for a `[[gnu::weak]]` extension point in the original
//! source — a seam the target firmware fills in with real hardware, and a test
//! fills in with a mock. Traits that aren't on the hot path get a default no-op /
//! zero-valued body so a test only needs to override what it cares about.

use crate::device_class::DeviceClass;

/// The physical serial transport: read available count, read one byte, write N
/// bytes. No framing, buffering, or retry logic lives here — that's the ring
/// buffer's and codec's job.
pub trait SerialIo {
    /// Write `buf` as a single call. The adapter may truncate on a full outbound
    /// buffer; the protocol does not retry or report this.
    fn write(&mut self, buf: &[u8]);
    /// Number of bytes currently available to read.
    fn read_avail(&mut self) -> u8;
    /// Read and consume one byte. Only called when `read_avail() > 0`.
    fn read(&mut self) -> u8;
}

/// Monotonic milliseconds, offset-resettable by the dispatcher's "reset time"
/// control frame.
pub trait Clock {
    fn systime_ms(&mut self) -> u32;
}

/// `SIMPLE_ACTUATOR` on/off/toggle state, matching the original source's
/// `RCP_SimpleActuatorState` wire values.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive)]
pub enum ActuatorCommand {
    Off = 0x00,
    On = 0x80,
    Toggle = 0xC0,
}

impl Default for ActuatorCommand {
    fn default() -> Self {
        Self::Off
    }
}

/// `STEPPER` write mode, matching the original source's `RCP_StepperControlMode`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive)]
pub enum StepperMode {
    AbsolutePosition = 0x40,
    RelativePosition = 0x80,
    Speed = 0xC0,
}

/// Driver for `SIMPLE_ACTUATOR` devices.
pub trait SimpleActuatorDriver {
    fn read(&mut self, id: u8) -> ActuatorCommand {
        let _ = id;
        ActuatorCommand::Off
    }
    fn write(&mut self, id: u8, cmd: ActuatorCommand) -> ActuatorCommand {
        let _ = id;
        cmd
    }
}

/// Driver for `STEPPER` devices. Reads/writes report `(position, speed)`.
pub trait StepperDriver {
    fn read(&mut self, id: u8) -> (f32, f32) {
        let _ = id;
        (0.0, 0.0)
    }
    fn write(&mut self, id: u8, mode: StepperMode, value: f32) -> (f32, f32) {
        let _ = (id, mode, value);
        (0.0, 0.0)
    }
}

/// Driver for `ANGLED_ACTUATOR` devices.
pub trait AngledActuatorDriver {
    fn read(&mut self, id: u8) -> f32 {
        let _ = id;
        0.0
    }
    fn write(&mut self, id: u8, value: f32) -> f32 {
        let _ = id;
        value
    }
}

/// Driver for every sensor device class: scalar, vector, GPS, power monitor, and
/// boolean sensors. `read` always returns four floats; callers that only need one,
/// two, or three values per the wire format slice the leading elements they need.
pub trait SensorDriver {
    fn read(&mut self, class: DeviceClass, id: u8) -> [f32; 4] {
        let _ = (class, id);
        [0.0; 4]
    }
    fn read_bool(&mut self, id: u8) -> bool {
        let _ = id;
        false
    }
    fn write_tare(&mut self, class: DeviceClass, id: u8, channel: u8, value: f32) {
        let _ = (class, id, channel, value);
    }
}

/// Forwards a `CUSTOM` frame's raw payload to whatever the host registers.
pub trait CustomDataHandler {
    fn handle(&mut self, data: &[u8]) {
        let _ = data;
    }
}

/// The reset primitive: restarts the process/device. Never returns control.
pub trait SystemReset {
    fn reset(&mut self) -> !;
}

/// A `SerialIo` with nothing attached: never has bytes available, discards
/// every write.
#[derive(Default)]
pub struct NullSerialIo;

impl SerialIo for NullSerialIo {
    fn write(&mut self, _buf: &[u8]) {}
    fn read_avail(&mut self) -> u8 {
        0
    }
    fn read(&mut self) -> u8 {
        0
    }
}

/// A `Clock` stuck at zero. Useful when a context under test drives time
/// through `reset_time`/explicit ticks rather than a real clock.
#[derive(Default)]
pub struct NullClock;

impl Clock for NullClock {
    fn systime_ms(&mut self) -> u32 {
        0
    }
}

/// Default no-op driver for a device class a given target doesn't wire up.
#[derive(Default)]
pub struct NullSimpleActuatorDriver;
impl SimpleActuatorDriver for NullSimpleActuatorDriver {}

#[derive(Default)]
pub struct NullStepperDriver;
impl StepperDriver for NullStepperDriver {}

#[derive(Default)]
pub struct NullAngledActuatorDriver;
impl AngledActuatorDriver for NullAngledActuatorDriver {}

#[derive(Default)]
pub struct NullSensorDriver;
impl SensorDriver for NullSensorDriver {}

#[derive(Default)]
pub struct NullCustomDataHandler;
impl CustomDataHandler for NullCustomDataHandler {}

/// A `SystemReset` with no real hardware reset to invoke: spins forever rather
/// than silently returning, since the trait's contract is never to return
/// control.
#[derive(Default)]
pub struct LoopingSystemReset;

impl SystemReset for LoopingSystemReset {
    fn reset(&mut self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}
