use raidlog_domain::EmbedTemplate;
use thiserror::Error;

/// Discord-style limits on embed content.
pub const MAX_EMBED_FIELDS: usize = 25;
pub const MAX_FIELD_NAME_CHARS: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),
    #[error("embed template has {0} fields, at most {MAX_EMBED_FIELDS} are allowed")]
    TooManyFields(usize),
    #[error("embed field #{0} has an empty name or value")]
    EmptyField(usize),
    #[error("embed field #{0} name is longer than {MAX_FIELD_NAME_CHARS} characters")]
    FieldNameTooLong(usize),
}

pub fn validate_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::NotPositive(name));
    }
    Ok(())
}

pub fn validate_embed_template(template: &EmbedTemplate) -> Result<(), ConfigError> {
    if template.fields.len() > MAX_EMBED_FIELDS {
        return Err(ConfigError::TooManyFields(template.fields.len()));
    }
    for (position, field) in template.fields.iter().enumerate() {
        if field.name.trim().is_empty() || field.value.trim().is_empty() {
            return Err(ConfigError::EmptyField(position));
        }
        if field.name.chars().count() > MAX_FIELD_NAME_CHARS {
            return Err(ConfigError::FieldNameTooLong(position));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidlog_domain::EmbedField;

    #[test]
    fn default_embed_is_well_formed() {
        assert_eq!(validate_embed_template(&EmbedTemplate::default()), Ok(()));
    }

    #[test]
    fn blank_field_is_rejected() {
        let mut template = EmbedTemplate::default();
        template.fields.push(EmbedField {
            name: "Extra".to_string(),
            value: " ".to_string(),
            inline: false,
        });
        let last = template.fields.len() - 1;
        assert_eq!(
            validate_embed_template(&template),
            Err(ConfigError::EmptyField(last))
        );
        assert_eq!(
            validate_positive("radius", f64::NAN),
            Err(ConfigError::NotPositive("radius"))
        );
    }
}
