//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

/// Parse and validate a bounded float value.
///
/// # Arguments
///
/// * `s` - The string to parse
/// * `min` - Minimum allowed value (inclusive)
/// * `max` - Maximum allowed value (inclusive)
/// * `name` - Name of the parameter for error messages
pub fn parse_bounded_float(s: &str, min: f64, max: f64, name: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(min..=max).contains(&value) {
        return Err(format!(
            "{name} must be between {min} and {max}, got {value}"
        ));
    }

    Ok(value)
}

/// Parse a recording duration in seconds (finite, non-negative).
pub fn parse_duration_secs(s: &str) -> Result<f64, String> {
    parse_bounded_float(s, 0.0, f64::MAX, "duration")
}

/// Parse a strictly positive model input scale.
pub fn parse_input_scale(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !value.is_finite() || value <= 0.0 {
        return Err(format!("input scale must be a positive number, got {value}"));
    }

    Ok(value)
}

/// Parse a worker count of at least one.
pub fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid job count"))?;

    if value == 0 {
        return Err("jobs must be at least 1".to_string());
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounded_float_valid() {
        assert_eq!(
            parse_bounded_float("50.0", -100.0, 100.0, "test").ok(),
            Some(50.0)
        );
        assert_eq!(
            parse_bounded_float("-100.0", -100.0, 100.0, "test").ok(),
            Some(-100.0)
        );
    }

    #[test]
    fn test_parse_bounded_float_invalid() {
        assert!(parse_bounded_float("101", -100.0, 100.0, "test").is_err());
        assert!(parse_bounded_float("abc", -100.0, 100.0, "test").is_err());
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("240").ok(), Some(240.0));
        assert_eq!(parse_duration_secs("0").ok(), Some(0.0));
        assert!(parse_duration_secs("-1").is_err());
        assert!(parse_duration_secs("NaN").is_err());
        assert!(parse_duration_secs("inf").is_err());
    }

    #[test]
    fn test_parse_input_scale() {
        assert_eq!(parse_input_scale("0.5").ok(), Some(0.5));
        assert!(parse_input_scale("0").is_err());
        assert!(parse_input_scale("-2").is_err());
        assert!(parse_input_scale("x").is_err());
    }

    #[test]
    fn test_parse_jobs() {
        assert_eq!(parse_jobs("4").ok(), Some(4));
        assert_eq!(parse_jobs("1").ok(), Some(1));
        assert!(parse_jobs("0").is_err());
        assert!(parse_jobs("-1").is_err());
        assert!(parse_jobs("many").is_err());
    }
}
