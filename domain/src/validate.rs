//! Lightweight record validation used by the service layer. Repositories
//! themselves store whatever they are given.

use crate::CoreError;
use crate::Record;

/// Ids must be non-empty and free of whitespace so they survive a round trip
/// through command lines and document keys unchanged.
pub fn validate_id(id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::InvalidRecord("empty id".into()));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidRecord("id contains whitespace".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidRecord("empty name".into()));
    }
    Ok(())
}

pub fn validate_record(record: &Record) -> Result<(), CoreError> {
    validate_id(&record.id)?;
    validate_name(&record.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_validation_basic() {
        assert!(validate_id("abc-123").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("abc 123").is_err());
        assert!(validate_id("abc\t").is_err());
    }

    #[test]
    fn name_validation_basic() {
        assert!(validate_name("Joe").is_ok());
        assert!(validate_name("Joe Smith").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn record_validation_checks_both_fields() {
        assert!(validate_record(&Record::new("abc-123", "Joe")).is_ok());
        assert!(matches!(
            validate_record(&Record::new("", "Joe")),
            Err(CoreError::InvalidRecord(_))
        ));
        assert!(matches!(
            validate_record(&Record::new("abc-123", "")),
            Err(CoreError::InvalidRecord(_))
        ));
    }
}
