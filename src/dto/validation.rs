//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum length accepted for display names.
const MAX_NAME_LENGTH: usize = 40;

/// Validates a player/team display name: non-blank and at most 40 characters.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!(
                "Display name must be at most {MAX_NAME_LENGTH} characters (got {})",
                name.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates a hole par. Real cards stay within 3..=6.
pub fn validate_par(par: u8) -> Result<(), ValidationError> {
    if !(3..=6).contains(&par) {
        let mut err = ValidationError::new("par_range");
        err.message = Some(format!("Par must be between 3 and 6 (got {par})").into());
        return Err(err);
    }
    Ok(())
}

/// Validates a tee slope rating, which the rating system bounds to 55..=155.
pub fn validate_slope(slope: u16) -> Result<(), ValidationError> {
    if !(55..=155).contains(&slope) {
        let mut err = ValidationError::new("slope_range");
        err.message = Some(format!("Slope rating must be between 55 and 155 (got {slope})").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_accepts_reasonable_values() {
        assert!(validate_display_name("Sam").is_ok());
        assert!(validate_display_name("A. Player-Smith").is_ok());
    }

    #[test]
    fn display_name_rejects_blank_and_oversized() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(41)).is_err());
    }

    #[test]
    fn par_bounds() {
        assert!(validate_par(3).is_ok());
        assert!(validate_par(6).is_ok());
        assert!(validate_par(2).is_err());
        assert!(validate_par(7).is_err());
    }

    #[test]
    fn slope_bounds() {
        assert!(validate_slope(113).is_ok());
        assert!(validate_slope(55).is_ok());
        assert!(validate_slope(155).is_ok());
        assert!(validate_slope(54).is_err());
        assert!(validate_slope(156).is_err());
    }
}
