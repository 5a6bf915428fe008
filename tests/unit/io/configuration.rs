//! Tests for codec constants and encoder defaults

#[cfg(test)]
mod tests {
    use wfa_codec::io::configuration::{
        BASE_STATE_COUNT, COEFFICIENT_DECIMALS, EncoderConfig, LEAST_SQUARES_THRESHOLD,
        ROOT_STATE_ID,
    };

    // Tests the root follows directly after the basis states
    // Verified by numbering the root from one
    #[test]
    fn test_root_follows_basis() {
        assert_eq!(BASE_STATE_COUNT, 6);
        assert_eq!(ROOT_STATE_ID, BASE_STATE_COUNT);
    }

    // Tests defaults come from the constants
    // Verified by swapping the default threshold
    #[test]
    fn test_encoder_config_default() {
        let config = EncoderConfig::default();
        assert!((config.error_threshold - LEAST_SQUARES_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(config.coefficient_decimals, COEFFICIENT_DECIMALS);
    }
}
