//! Per-axis gain derived from the fuse ROM sensitivity bytes.

/// Nominal multiplier applied to every axis before fuse ROM trim.
pub const NOMINAL_GAIN: f32 = 30.0;

/// Per-axis multipliers, ordered X, Y, Z.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisGain(pub [f32; 3]);

impl AxisGain {
    /// Gain used before calibration or when the fuse ROM is unreadable.
    pub const UNITY: Self = Self([1.0; 3]);

    /// Wraps explicit per-axis gains.
    pub const fn new(gains: [f32; 3]) -> Self {
        Self(gains)
    }

    /// Computes the gain from the raw `ASAX..=ASAZ` bytes.
    ///
    /// Each byte is read as an 8-bit two's complement value `s` and mapped to
    /// `((s - 128) / 256 + 1) * 30`.
    pub fn from_fuse_rom(raw: [u8; 3]) -> Self {
        Self(raw.map(Self::axis_gain))
    }

    fn axis_gain(raw: u8) -> f32 {
        let signed = raw as i8 as f32;
        (((signed - 128.0) / 256.0) + 1.0) * NOMINAL_GAIN
    }

    /// Returns the X, Y, Z multipliers.
    pub const fn as_array(&self) -> [f32; 3] {
        self.0
    }

    /// Negates each raw axis (sensor to body frame) and scales it.
    ///
    /// Results outside the `i16` range saturate.
    pub fn apply(&self, raw: [i16; 3]) -> [i16; 3] {
        let mut out = [0i16; 3];
        for ((out, raw), gain) in out.iter_mut().zip(raw).zip(self.0) {
            *out = (-(raw as f32) * gain) as i16;
        }
        out
    }
}

impl Default for AxisGain {
    fn default() -> Self {
        Self::UNITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trim_byte_maps_to_fifteen() {
        // 0x00 is signed 0: ((0 - 128) / 256 + 1) * 30 = 15.
        assert_eq!(AxisGain::from_fuse_rom([0x00; 3]).as_array(), [15.0; 3]);
    }

    #[test]
    fn formula_uses_signed_interpretation() {
        let gain = AxisGain::from_fuse_rom([0x80, 0xFF, 0x7F]).as_array();

        // 0x80 -> -128: ((-256 / 256) + 1) * 30 = 0.
        assert_eq!(gain[0], 0.0);
        // 0xFF -> -1: ((-129 / 256) + 1) * 30.
        assert_eq!(gain[1], ((-129.0f32 / 256.0) + 1.0) * 30.0);
        // 0x7F -> 127: ((-1 / 256) + 1) * 30.
        assert_eq!(gain[2], ((-1.0f32 / 256.0) + 1.0) * 30.0);
    }

    #[test]
    fn apply_negates_and_keeps_axis_order() {
        let raw = [256, 512, 768];
        assert_eq!(AxisGain::UNITY.apply(raw), [-256, -512, -768]);
    }

    #[test]
    fn apply_saturates_out_of_range_products() {
        let gain = AxisGain::new([30.0; 3]);
        assert_eq!(gain.apply([-2000, 2000, i16::MIN]), [i16::MAX, i16::MIN, i16::MAX]);
    }
}
