//! Bit-for-bit reinterpretation between `f32` weights and the `i32` values
//! stored in a bundle's `intvector`.

/// Reinterpret the IEEE-754 bits of `value` as a signed integer.
#[inline]
pub fn float_to_bits(value: f32) -> i32 {
    value.to_bits() as i32
}

/// Inverse of [`float_to_bits`].
#[inline]
pub fn bits_to_float(bits: i32) -> f32 {
    f32::from_bits(bits as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_patterns() {
        assert_eq!(float_to_bits(0.0), 0);
        assert_eq!(float_to_bits(-0.0), i32::MIN);
        assert_eq!(float_to_bits(1.0), 0x3f80_0000);
        assert_eq!(float_to_bits(-1.0), 0xbf80_0000_u32 as i32);
        assert_eq!(bits_to_float(1_065_353_216), 1.0);
    }

    #[test]
    fn test_roundtrip_is_exact() {
        let values = [
            0.0f32,
            -0.0,
            1.0,
            -2.5,
            0.1,
            f32::MIN_POSITIVE,
            f32::MIN_POSITIVE / 8.0, // subnormal
            -f32::from_bits(1),      // smallest negative subnormal
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
            f32::NEG_INFINITY,
        ];
        for v in values {
            let back = bits_to_float(float_to_bits(v));
            assert_eq!(back.to_bits(), v.to_bits(), "value {v:e}");
        }
    }

    #[test]
    fn test_nan_payload_is_preserved() {
        let nan = f32::from_bits(0x7fc0_1234);
        assert_eq!(bits_to_float(float_to_bits(nan)).to_bits(), 0x7fc0_1234);
    }
}
