//! Custom input validators
//!
//! Validators that go beyond what the `validator` derive attributes cover.

use validator::ValidationError;

/// Validate a full name: letters and spaces only
pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    let name_regex = regex_lite::Regex::new(r"^[a-zA-Z ]*$").unwrap();
    if !name_regex.is_match(name) {
        let mut err = ValidationError::new("full_name");
        err.message = Some("Full name may only contain letters and spaces".into());
        return Err(err);
    }
    Ok(())
}
