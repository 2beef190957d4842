//! Attribute definition validation.
//!
//! Valid attribute names:
//! - ASCII letters, digits and underscores (`_`)
//! - Must start with a letter
//! - At most 100 characters
//!
//! Beyond the name, a definition is checked field by field (see
//! [`validate_definition`]). The first violation is reported.

use super::prefix::SiPrefix;
use crate::error::{Result, TaxonomyError};
use crate::spec::AttributeDef;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_UNIT_LEN: usize = 50;

/// Validates an attribute machine name.
///
/// # Examples
/// ```
/// use partcat::attributes::validate_attribute_name;
///
/// assert!(validate_attribute_name("resistance").is_ok());
/// assert!(validate_attribute_name("power_rating_70c").is_ok());
///
/// assert!(validate_attribute_name("").is_err());
/// assert!(validate_attribute_name("_hidden").is_err());
/// assert!(validate_attribute_name("7segment").is_err());
/// assert!(validate_attribute_name("max-voltage").is_err());
/// ```
pub fn validate_attribute_name(name: &str) -> std::result::Result<(), NameValidationError> {
    let Some(first_char) = name.chars().next() else {
        return Err(NameValidationError::Empty);
    };
    if !first_char.is_ascii_alphabetic() {
        return Err(NameValidationError::InvalidStart(first_char));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NameValidationError::TooLong(name.chars().count()));
    }
    if let Some(ch) = name.chars().find(|ch| !is_valid_name_char(*ch)) {
        return Err(NameValidationError::InvalidCharacter(ch));
    }
    Ok(())
}

fn is_valid_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Error type for attribute name validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    Empty,
    /// Names must start with a letter
    InvalidStart(char),
    TooLong(usize),
    InvalidCharacter(char),
}

impl std::fmt::Display for NameValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameValidationError::Empty => write!(f, "cannot be empty"),
            NameValidationError::InvalidStart(c) => {
                write!(f, "must start with a letter, found '{}'", c)
            }
            NameValidationError::TooLong(len) => {
                write!(f, "is {} characters long (max {})", len, MAX_NAME_LEN)
            }
            NameValidationError::InvalidCharacter(c) => {
                write!(f, "contains invalid character '{}'", c)
            }
        }
    }
}

impl std::error::Error for NameValidationError {}

/// Parses raw prefix symbols into the known SI set, dropping repeats but
/// keeping first-seen order.
pub fn parse_prefixes(attribute: &str, raw: &[String]) -> Result<Vec<SiPrefix>> {
    let mut prefixes: Vec<SiPrefix> = Vec::with_capacity(raw.len());
    for symbol in raw {
        let prefix = symbol
            .parse::<SiPrefix>()
            .map_err(|e| TaxonomyError::schema(attribute, "allowed_prefixes", e.to_string()))?;
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }
    Ok(prefixes)
}

/// Checks one definition. Returns the parsed prefix list on success so the
/// caller never has to parse twice.
pub fn validate_definition(def: &AttributeDef) -> Result<Vec<SiPrefix>> {
    validate_attribute_name(&def.name)
        .map_err(|e| TaxonomyError::schema(&def.name, "name", e.to_string()))?;

    if def.display_name.is_empty() {
        return Err(TaxonomyError::schema(
            &def.name,
            "display_name",
            "must have at least one locale",
        ));
    }

    if let Some(unit) = &def.unit {
        if unit.chars().count() > MAX_UNIT_LEN {
            return Err(TaxonomyError::schema(
                &def.name,
                "unit",
                format!("is longer than {} characters", MAX_UNIT_LEN),
            ));
        }
    }

    if def.data_type.is_enumerated() {
        let has_values = def
            .allowed_values
            .as_ref()
            .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()));
        if !has_values {
            return Err(TaxonomyError::schema(
                &def.name,
                "allowed_values",
                format!("must be non-empty for {:?}", def.data_type),
            ));
        }
    }

    if def.is_label && !def.is_required {
        return Err(TaxonomyError::schema(
            &def.name,
            "is_label",
            "requires is_required",
        ));
    }

    match &def.allowed_prefixes {
        Some(raw) => parse_prefixes(&def.name, raw),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeScope, DataType};

    fn field_of(err: TaxonomyError) -> &'static str {
        match err {
            TaxonomyError::SchemaDefinition { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_names() {
        assert!(validate_attribute_name("a").is_ok());
        assert!(validate_attribute_name("Vf").is_ok());
        assert!(validate_attribute_name("temp_coefficient_ppm").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(validate_attribute_name(""), Err(NameValidationError::Empty));
        assert_eq!(
            validate_attribute_name("9volt"),
            Err(NameValidationError::InvalidStart('9'))
        );
        assert_eq!(
            validate_attribute_name("max voltage"),
            Err(NameValidationError::InvalidCharacter(' '))
        );
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            validate_attribute_name(&long),
            Err(NameValidationError::TooLong(MAX_NAME_LEN + 1))
        );
    }

    #[test]
    fn test_select_requires_values() {
        let def = AttributeDef::new("package", DataType::Select, AttributeScope::Component);
        assert_eq!(field_of(validate_definition(&def).unwrap_err()), "allowed_values");

        let blank = def.clone().values(&[" "]);
        assert_eq!(field_of(validate_definition(&blank).unwrap_err()), "allowed_values");

        let ok = def.values(&["TO-92", "SOT-23"]);
        assert!(validate_definition(&ok).is_ok());
    }

    #[test]
    fn test_multiselect_requires_values() {
        let def = AttributeDef::new("features", DataType::MultiSelect, AttributeScope::Part);
        assert_eq!(field_of(validate_definition(&def).unwrap_err()), "allowed_values");
    }

    #[test]
    fn test_unknown_prefix_is_rejected() {
        let def = AttributeDef::new("capacitance", DataType::Decimal, AttributeScope::Component)
            .prefixes(&["p", "n", "u"]);
        let err = validate_definition(&def).unwrap_err();
        assert!(err.to_string().contains("unknown SI prefix 'u'"));
        assert_eq!(field_of(err), "allowed_prefixes");
    }

    #[test]
    fn test_prefixes_are_deduplicated_in_order() {
        let def = AttributeDef::new("voltage", DataType::Decimal, AttributeScope::Part)
            .prefixes(&["-", "m", "-", "k"]);
        assert_eq!(
            validate_definition(&def).unwrap(),
            vec![SiPrefix::Base, SiPrefix::Milli, SiPrefix::Kilo]
        );
    }

    #[test]
    fn test_label_requires_required() {
        let def = AttributeDef::new("value", DataType::Decimal, AttributeScope::Component).label();
        assert_eq!(field_of(validate_definition(&def).unwrap_err()), "is_label");
        assert!(validate_definition(&def.required()).is_ok());
    }

    #[test]
    fn test_unit_length() {
        let def = AttributeDef::new("x", DataType::Decimal, AttributeScope::Part).unit("Ω".repeat(51));
        assert_eq!(field_of(validate_definition(&def).unwrap_err()), "unit");
    }

    #[test]
    fn test_display_name_required() {
        let def = AttributeDef::new("x", DataType::String, AttributeScope::Part)
            .display_name(crate::model::LocalizedText::new());
        assert_eq!(field_of(validate_definition(&def).unwrap_err()), "display_name");
    }
}
