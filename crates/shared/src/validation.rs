//! Common validation utilities.

use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// First model year accepted for a vehicle.
const MIN_VEHICLE_YEAR: i32 = 1886;

lazy_static! {
    // 17 characters, letters I, O and Q are never used in a VIN.
    static ref VIN_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
    static ref LICENSE_PLATE_REGEX: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9 \-]{0,9}$").unwrap();
    static ref PART_NUMBER_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-_./]{0,49}$").unwrap();
    static ref SQL_IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a vehicle identification number (case-insensitive).
pub fn validate_vin(vin: &str) -> Result<(), ValidationError> {
    if VIN_REGEX.is_match(&vin.trim().to_uppercase()) {
        Ok(())
    } else {
        Err(error(
            "vin_format",
            "VIN must be 17 characters and cannot contain I, O or Q",
        ))
    }
}

/// Validates a license plate (case-insensitive, up to 10 characters).
pub fn validate_license_plate(plate: &str) -> Result<(), ValidationError> {
    if LICENSE_PLATE_REGEX.is_match(&plate.trim().to_uppercase()) {
        Ok(())
    } else {
        Err(error(
            "license_plate_format",
            "License plate must be 1-10 letters, digits, spaces or dashes",
        ))
    }
}

/// Validates a vehicle model year: from 1886 up to next year.
pub fn validate_vehicle_year(year: i32) -> Result<(), ValidationError> {
    let max_year = Utc::now().year() + 1;
    if (MIN_VEHICLE_YEAR..=max_year).contains(&year) {
        Ok(())
    } else {
        Err(error("year_range", "Year is outside the accepted range"))
    }
}

/// Validates an inventory part number.
pub fn validate_part_number(part_number: &str) -> Result<(), ValidationError> {
    if PART_NUMBER_REGEX.is_match(part_number) {
        Ok(())
    } else {
        Err(error(
            "part_number_format",
            "Part number must be 1-50 letters, digits or - _ . /",
        ))
    }
}

/// Returns true when the value is a safe, unquoted lowercase SQL identifier.
pub fn is_sql_identifier(value: &str) -> bool {
    SQL_IDENTIFIER_REGEX.is_match(value)
}

/// Normalizes a VIN or plate for storage: trimmed and uppercased.
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_vin() {
        assert!(validate_vin("1HGCM82633A004352").is_ok());
        assert!(validate_vin("1hgcm82633a004352").is_ok());
        assert!(validate_vin(" 1HGCM82633A004352 ").is_ok());
    }

    #[test]
    fn test_validate_vin_rejects_forbidden_letters() {
        assert!(validate_vin("1HGCM82633A00435O").is_err());
        assert!(validate_vin("IHGCM82633A004352").is_err());
        assert!(validate_vin("QHGCM82633A004352").is_err());
    }

    #[test]
    fn test_validate_vin_length() {
        assert!(validate_vin("1HGCM82633A00435").is_err());
        assert!(validate_vin("1HGCM82633A0043522").is_err());
        assert!(validate_vin("").is_err());
    }

    #[test]
    fn test_validate_vin_error_message() {
        let err = validate_vin("short").unwrap_err();
        assert_eq!(err.code, "vin_format");
        assert!(err.message.unwrap().contains("17"));
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("ABC-1234").is_ok());
        assert!(validate_license_plate("7xyz 99").is_ok());
        assert!(validate_license_plate("").is_err());
        assert!(validate_license_plate("TOO-LONG-PLATE").is_err());
        assert!(validate_license_plate("AB#12").is_err());
    }

    #[test]
    fn test_validate_vehicle_year() {
        let next_year = Utc::now().year() + 1;
        assert!(validate_vehicle_year(1886).is_ok());
        assert!(validate_vehicle_year(2015).is_ok());
        assert!(validate_vehicle_year(next_year).is_ok());
        assert!(validate_vehicle_year(1885).is_err());
        assert!(validate_vehicle_year(next_year + 1).is_err());
    }

    #[test]
    fn test_validate_part_number() {
        assert!(validate_part_number("BP-1042/A").is_ok());
        assert!(validate_part_number("").is_err());
        assert!(validate_part_number("-leading").is_err());
        assert!(validate_part_number(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_is_sql_identifier() {
        assert!(is_sql_identifier("vehicles"));
        assert!(is_sql_identifier("_staff_read_all"));
        assert!(!is_sql_identifier("Vehicles"));
        assert!(!is_sql_identifier("vehicles; drop table profiles"));
        assert!(!is_sql_identifier("1vehicles"));
        assert!(!is_sql_identifier(&"a".repeat(64)));
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier(" abc-123 "), "ABC-123");
    }
}
