//! Generator settings.
//!
//! Resolution order: built-in defaults < JSON config file < CLI flags.
use std::path::Path;

use serde::Deserialize;

use crate::error::{GenError, GenResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Java package of every generated unit.
    pub package: String,
    /// Type name used when the document root is itself a schema.
    pub root_type: String,
    /// Implementation class name = contract name + suffix.
    pub impl_suffix: String,
    /// Appended to identifiers that collide with reserved words.
    pub reserved_suffix: String,
    pub not_null_annotation: String,
    pub nullable_annotation: String,
    pub range_annotation: String,
    /// Checked exception thrown by parsing constructors; `(String raw, Throwable cause)`.
    pub parse_exception: String,
    /// Package holding `JSONObject` / `JSONArray`.
    pub json_package: String,
    /// Emit `@Generated` with a timestamp on every unit.
    pub stamp_generated: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            package: "com.example.model".into(),
            root_type: "Root".into(),
            impl_suffix: "Impl".into(),
            reserved_suffix: "_".into(),
            not_null_annotation: "org.jetbrains.annotations.NotNull".into(),
            nullable_annotation: "org.jetbrains.annotations.Nullable".into(),
            range_annotation: "org.jetbrains.annotations.Range".into(),
            parse_exception: "com.example.json.JsonParseException".into(),
            json_package: "org.json".into(),
            stamp_generated: false,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> GenResult<Self> {
        let src = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        let config: Self = crate::path_de::from_str_with_path(&src)
            .map_err(|e| GenError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GenResult<()> {
        let valid_name = |s: &str| {
            !s.is_empty()
                && s.split('.').all(|seg| {
                    !seg.is_empty()
                        && !seg.starts_with(|c: char| c.is_ascii_digit())
                        && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                })
        };
        for (field, value) in [
            ("package", &self.package),
            ("not_null_annotation", &self.not_null_annotation),
            ("nullable_annotation", &self.nullable_annotation),
            ("range_annotation", &self.range_annotation),
            ("parse_exception", &self.parse_exception),
            ("json_package", &self.json_package),
        ] {
            if !valid_name(value.as_str()) {
                return Err(GenError::Config(format!("`{field}` is not a qualified Java name: {value:?}")));
            }
        }
        if self.reserved_suffix.is_empty() {
            return Err(GenError::Config("`reserved_suffix` must not be empty".into()));
        }
        Ok(())
    }

    /// Directory of the package relative to an output root.
    pub fn package_dir(&self) -> std::path::PathBuf {
        self.package.split('.').collect()
    }
}

/// Simple name of a qualified Java name (`org.json.JSONObject` → `JSONObject`).
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let config: GeneratorConfig =
            crate::path_de::from_str_with_path(r#"{"package": "io.acme.api", "stamp_generated": true}"#).unwrap();
        assert_eq!(config.package, "io.acme.api");
        assert!(config.stamp_generated);
        assert_eq!(config.impl_suffix, "Impl");
        assert_eq!(config.package_dir(), std::path::PathBuf::from("io/acme/api"));
    }

    #[test]
    fn config_errors_carry_the_path() {
        let err = crate::path_de::from_str_with_path::<GeneratorConfig>(r#"{"stamp_generated": "yes"}"#).unwrap_err();
        assert_eq!(err.path, "stamp_generated");
        let err = crate::path_de::from_str_with_path::<GeneratorConfig>(r#"{"pakage": "x"}"#).unwrap_err();
        assert!(err.message.contains("pakage"), "{err}");
    }

    #[test]
    fn invalid_names_are_rejected() {
        let config = GeneratorConfig { package: "com.9bad".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(GenError::Config(_))));
        assert!(GeneratorConfig::default().validate().is_ok());
        assert_eq!(simple_name("org.json.JSONObject"), "JSONObject");
    }
}
