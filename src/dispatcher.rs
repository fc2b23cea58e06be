//! Dispatcher (C6): per-device-class handling of one decoded inbound frame.

use crate::codec;
use crate::context::RcpContext;
use crate::device_class::DeviceClass;
use crate::estop::Halt;
use crate::frame::Frame;
use crate::hal::{ActuatorCommand, AngledActuatorDriver, Clock, CustomDataHandler, SensorDriver, SerialIo, SimpleActuatorDriver, StepperDriver, StepperMode, SystemReset};
use crate::procedures::Procedure;
use crate::test_state::TestStateTag;

fn read_f32(bytes: &[u8]) -> f32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[..4]);
    f32::from_ne_bytes(b)
}

impl<IO, CLK, SA, ST, AA, SN, CD, RS, H> RcpContext<IO, CLK, SA, ST, AA, SN, CD, RS, H>
where
    IO: SerialIo,
    CLK: Clock,
    SA: SimpleActuatorDriver,
    ST: StepperDriver,
    AA: AngledActuatorDriver,
    SN: SensorDriver,
    CD: CustomDataHandler,
    RS: SystemReset,
    H: Halt,
{
    pub(crate) fn dispatch(&mut self, frame: Frame) {
        let Ok(class) = DeviceClass::try_from(frame.device_class) else {
            crate::log::trace!("dispatch: unknown device class {}", frame.device_class);
            return;
        };
        let payload = frame.payload.as_slice();

        match class {
            DeviceClass::TestState => self.dispatch_test_state(payload),
            DeviceClass::Prompt => {
                if payload.is_empty() {
                    crate::log::trace!("PROMPT frame with empty payload ignored");
                } else if !self.prompt.deliver(payload) {
                    crate::log::trace!("PROMPT frame with no registered acceptor ignored");
                }
            }
            DeviceClass::SimpleActuator => self.dispatch_simple_actuator(payload),
            DeviceClass::Stepper => self.dispatch_stepper(payload),
            DeviceClass::AngledActuator => self.dispatch_angled_actuator(payload),
            DeviceClass::BoolSensor => self.dispatch_bool_sensor(payload),
            DeviceClass::Powermon => self.dispatch_two_float_sensor(class, payload),
            DeviceClass::Accelerometer | DeviceClass::Gyroscope | DeviceClass::Magnetometer => {
                self.dispatch_vector_sensor(class, payload)
            }
            DeviceClass::Gps => self.dispatch_gps(payload),
            DeviceClass::Custom => self.custom.handle(payload),
            other if other.is_scalar_sensor() => self.dispatch_scalar_sensor(other, payload),
            _ => {}
        }
    }

    fn dispatch_test_state(&mut self, payload: &[u8]) {
        if let Some(&control) = payload.first() {
            let high = control >> 4;
            let low = control & 0x0F;
            match high {
                0x0 => {
                    self.test_state.start(low);
                }
                0x1 => match low {
                    0x0 => self.stop_active_test(),
                    0x1 => {
                        self.test_state.toggle_pause();
                    }
                    0x2 => self.reset.reset(),
                    0x3 => {
                        let now = self.now_ms();
                        self.test_state.reset_time(now);
                    }
                    _ => {}
                },
                0x2 => self.test_state.set_data_streaming(low != 0),
                0x3 => {} // query: no state change, report emitted below regardless
                0xF => {
                    let now = self.now_ms();
                    self.test_state.handle_heartbeat_control(low, now);
                }
                _ => {}
            }
        }
        self.emit_test_state_report();
    }

    fn stop_active_test(&mut self) {
        if !matches!(self.test_state.state(), TestStateTag::Running | TestStateTag::Paused) {
            return;
        }
        let idx = self.test_state.test_num() as usize;
        if let Some(procedure) = self.registry.get_mut(idx).and_then(|slot| slot.as_mut()) {
            procedure.end(true);
        }
        self.test_state.stop();
        self.reset_prompt();
    }

    fn dispatch_simple_actuator(&mut self, payload: &[u8]) {
        match payload.len() {
            1 => {
                let id = payload[0];
                let state = self.simple_actuator.read(id);
                self.reply_simple_actuator(id, state);
            }
            2 => {
                let id = payload[0];
                let Ok(cmd) = ActuatorCommand::try_from(payload[1]) else {
                    return;
                };
                let new_state = self.simple_actuator.write(id, cmd);
                if !self.suppress_write_reports {
                    self.reply_simple_actuator(id, new_state);
                }
            }
            _ => {}
        }
    }

    fn reply_simple_actuator(&mut self, id: u8, state: ActuatorCommand) {
        let ts = self.millis();
        codec::encode_simple_actuator_reply(&mut self.io, self.config.channel, ts, id, state.into());
    }

    fn dispatch_stepper(&mut self, payload: &[u8]) {
        match payload.len() {
            1 => {
                let id = payload[0];
                let (pos, spd) = self.stepper.read(id);
                self.reply_stepper(id, pos, spd);
            }
            6 => {
                let id = payload[0];
                let Ok(mode) = StepperMode::try_from(payload[1]) else {
                    return;
                };
                let value = read_f32(&payload[2..6]);
                let (pos, spd) = self.stepper.write(id, mode, value);
                if !self.suppress_write_reports {
                    self.reply_stepper(id, pos, spd);
                }
            }
            _ => {}
        }
    }

    fn reply_stepper(&mut self, id: u8, pos: f32, spd: f32) {
        let ts = self.millis();
        codec::encode_two_float(&mut self.io, self.config.channel, DeviceClass::Stepper.into(), ts, id, [pos, spd]);
    }

    fn dispatch_angled_actuator(&mut self, payload: &[u8]) {
        match payload.len() {
            1 => {
                let id = payload[0];
                let value = self.angled_actuator.read(id);
                self.reply_angled_actuator(id, value);
            }
            5 => {
                let id = payload[0];
                let value = read_f32(&payload[1..5]);
                let new_value = self.angled_actuator.write(id, value);
                if !self.suppress_write_reports {
                    self.reply_angled_actuator(id, new_value);
                }
            }
            _ => {}
        }
    }

    fn reply_angled_actuator(&mut self, id: u8, value: f32) {
        let ts = self.millis();
        codec::encode_one_float(&mut self.io, self.config.channel, DeviceClass::AngledActuator.into(), ts, id, value);
    }

    fn dispatch_bool_sensor(&mut self, payload: &[u8]) {
        if payload.len() != 1 {
            return;
        }
        let id = payload[0];
        let value = self.sensor.read_bool(id);
        let ts = self.millis();
        codec::encode_bool_sensor(&mut self.io, self.config.channel, DeviceClass::BoolSensor.into(), ts, id, value);
    }

    fn dispatch_scalar_sensor(&mut self, class: DeviceClass, payload: &[u8]) {
        match payload.len() {
            1 => {
                let id = payload[0];
                let values = self.sensor.read(class, id);
                let ts = self.millis();
                codec::encode_one_float(&mut self.io, self.config.channel, class.into(), ts, id, values[0]);
            }
            6 => self.tare_sensor(class, payload),
            _ => {}
        }
    }

    fn dispatch_two_float_sensor(&mut self, class: DeviceClass, payload: &[u8]) {
        match payload.len() {
            1 => {
                let id = payload[0];
                let values = self.sensor.read(class, id);
                let ts = self.millis();
                codec::encode_two_float(&mut self.io, self.config.channel, class.into(), ts, id, [values[0], values[1]]);
            }
            6 => self.tare_sensor(class, payload),
            _ => {}
        }
    }

    fn dispatch_vector_sensor(&mut self, class: DeviceClass, payload: &[u8]) {
        match payload.len() {
            1 => {
                let id = payload[0];
                let values = self.sensor.read(class, id);
                let ts = self.millis();
                codec::encode_three_float(
                    &mut self.io,
                    self.config.channel,
                    class.into(),
                    ts,
                    id,
                    [values[0], values[1], values[2]],
                );
            }
            6 => self.tare_sensor(class, payload),
            _ => {}
        }
    }

    fn dispatch_gps(&mut self, payload: &[u8]) {
        match payload.len() {
            1 => {
                let id = payload[0];
                let values = self.sensor.read(DeviceClass::Gps, id);
                let ts = self.millis();
                codec::encode_four_float(&mut self.io, self.config.channel, DeviceClass::Gps.into(), ts, id, values);
            }
            6 => self.tare_sensor(DeviceClass::Gps, payload),
            _ => {}
        }
    }

    /// Shared `id, channel, f32` tare handler for every sensor class. No reply
    /// frame is emitted on tare.
    fn tare_sensor(&mut self, class: DeviceClass, payload: &[u8]) {
        let id = payload[0];
        let channel = payload[1];
        let value = read_f32(&payload[2..6]);
        self.sensor.write_tare(class, id, channel, value);
    }
}
