//! Definition-write checks

use crate::rules::check_value;
use crate::{Error, Result};
use mdm_schema::{AttributeDefinition, RawAttributeDefinition};

/// Parse a raw definition and check its default value
///
/// # Errors
///
/// [`Error::Config`] for a bad kind or config, [`Error::InvalidDefault`] when
/// the default value fails the definition's own value rules.
pub fn validate_definition(raw: RawAttributeDefinition) -> Result<AttributeDefinition> {
    let definition = AttributeDefinition::try_from(raw)?;
    check_definition(&definition)?;
    Ok(definition)
}

/// Check the default value of an already parsed definition
///
/// # Errors
///
/// [`Error::InvalidDefault`] when the default fails validation.
pub fn check_definition(definition: &AttributeDefinition) -> Result<()> {
    let Some(default) = &definition.default_value else {
        return Ok(());
    };
    let result = check_value(&definition.config, default);
    if result.is_valid {
        Ok(())
    } else {
        Err(Error::InvalidDefault {
            code: definition.code.clone(),
            reason: result.message.unwrap_or_default(),
        })
    }
}
