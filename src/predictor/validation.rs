//! Year input checks shared by the CLI and the predictor.

use crate::models::YearValidation;

pub const MIN_TYPICAL_YEAR: i64 = 1900;
pub const MAX_TYPICAL_YEAR: i64 = 2100;

pub const NOT_A_NUMBER: &str = "Year must be a number";
pub const OUT_OF_RANGE: &str = "Year is outside typical range (1900-2100)";

/// Validate raw user input such as `"2025"` or `"abc"`.
pub fn validate_year(input: &str) -> YearValidation {
    match input.trim().parse::<i64>() {
        Ok(year) => validate_year_value(year),
        Err(_) => YearValidation {
            valid: false,
            error: Some(NOT_A_NUMBER.into()),
            warning: false,
            year: None,
        },
    }
}

/// Years outside `[1900, 2100]` are reported invalid with `warning` set, so
/// callers may still choose to predict for them.
pub fn validate_year_value(year: i64) -> YearValidation {
    let Ok(parsed) = i32::try_from(year) else {
        return YearValidation {
            valid: false,
            error: Some(OUT_OF_RANGE.into()),
            warning: true,
            year: None,
        };
    };

    if !(MIN_TYPICAL_YEAR..=MAX_TYPICAL_YEAR).contains(&year) {
        return YearValidation {
            valid: false,
            error: Some(OUT_OF_RANGE.into()),
            warning: true,
            year: Some(parsed),
        };
    }

    YearValidation {
        valid: true,
        error: None,
        warning: false,
        year: Some(parsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_input_is_invalid_without_warning() {
        let result = validate_year("abc");
        assert!(!result.valid);
        assert!(!result.warning);
        assert_eq!(result.error.as_deref(), Some(NOT_A_NUMBER));

        assert!(!validate_year("").valid);
        assert!(!validate_year("20.5").valid);
    }

    #[test]
    fn out_of_range_years_warn() {
        let result = validate_year("1850");
        assert!(!result.valid);
        assert!(result.warning);
        assert_eq!(result.year, Some(1850));

        let late = validate_year_value(2101);
        assert!(!late.valid && late.warning);

        let huge = validate_year_value(i64::MAX);
        assert!(!huge.valid && huge.warning);
        assert_eq!(huge.year, None);
    }

    #[test]
    fn typical_years_are_valid() {
        for input in ["2050", " 1900 ", "2100"] {
            let result = validate_year(input);
            assert!(result.valid, "{input}");
            assert!(!result.warning);
            assert_eq!(result.error, None);
        }
    }

    #[test]
    fn serializes_like_the_exported_module() {
        let ok = serde_json::to_value(validate_year("2050")).unwrap();
        assert_eq!(ok, serde_json::json!({ "valid": true, "year": 2050 }));

        let warn = serde_json::to_value(validate_year("1850")).unwrap();
        assert_eq!(warn["valid"], false);
        assert_eq!(warn["warning"], true);
    }
}
