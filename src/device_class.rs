//! Device-class tag: the byte following a frame's header that selects a subprotocol.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// One-byte tag selecting which subprotocol a frame's payload is speaking.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum DeviceClass {
    TestState = 0x00,
    SimpleActuator = 0x01,
    Stepper = 0x02,
    Prompt = 0x03,
    AngledActuator = 0x04,
    Custom = 0x80,
    AmPressure = 0x90,
    AmTemperature = 0x91,
    PressureTransducer = 0x92,
    RelativeHygrometer = 0x93,
    LoadCell = 0x94,
    BoolSensor = 0x95,
    Powermon = 0xA0,
    Accelerometer = 0xB0,
    Gyroscope = 0xB1,
    Magnetometer = 0xB2,
    Gps = 0xC0,
}

impl DeviceClass {
    /// True for the five scalar sensor classes that share one-float-read /
    /// channel-tare handling (`AM_PRESSURE`, `AM_TEMPERATURE`, `PRESSURE_TRANSDUCER`,
    /// `RELATIVE_HYGROMETER`, `LOAD_CELL`).
    pub fn is_scalar_sensor(self) -> bool {
        matches!(
            self,
            Self::AmPressure
                | Self::AmTemperature
                | Self::PressureTransducer
                | Self::RelativeHygrometer
                | Self::LoadCell
        )
    }

    /// True for the three vector sensor classes that share three-float-read /
    /// channel-tare handling.
    pub fn is_vector_sensor(self) -> bool {
        matches!(self, Self::Accelerometer | Self::Gyroscope | Self::Magnetometer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_match_spec() {
        assert_eq!(DeviceClass::TestState as u8, 0x00);
        assert_eq!(DeviceClass::SimpleActuator as u8, 0x01);
        assert_eq!(DeviceClass::Custom as u8, 0x80);
        assert_eq!(DeviceClass::Gps as u8, 0xC0);
    }

    #[test]
    fn unknown_byte_does_not_parse() {
        assert!(DeviceClass::try_from(0x99).is_err());
    }
}
