//! Pluggable schema validation seam.
//!
//! The core pipeline never validates; validation is an external oracle
//! invoked by the CLI after the document is on disk. The default backend
//! shells out to `xmllint`, pointing it at the revision's remote schema
//! URL or a local schema directory.

use ipforge_ipxact::Revision;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Which validation backend to use, from the CLI flags.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Skip validation entirely.
    #[default]
    None,
    /// Validate against the revision's published schema URL.
    Remote,
    /// Validate against `<libs>/ipxact_schemas/<year>/index.xsd`.
    Local,
}

/// Validation failures, distinguished so the CLI can exit with code 2.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The validator executable could not be started.
    #[error("could not run xmllint: {0}")]
    Launch(std::io::Error),
    /// The document failed schema validation.
    #[error("schema validation failed:\n{stderr}")]
    Failed {
        /// Validator stderr output.
        stderr: String,
    },
}

/// A validation oracle for an emitted document.
pub trait Validator {
    /// Validates the file at `path`; `Ok(())` means schema-valid.
    fn validate(&self, path: &Path) -> Result<(), ValidationError>;
}

/// The no-op validator for `ValidationMode::None`.
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _path: &Path) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Validates by spawning `xmllint --noout --schema <schema> <file>`.
pub struct XmllintValidator {
    schema: String,
}

impl XmllintValidator {
    /// Validator against the revision's remote schema URL.
    pub fn remote(revision: Revision) -> Self {
        Self {
            schema: format!("{}/index.xsd", revision.namespace()),
        }
    }

    /// Validator against a local schema tree under the library root.
    pub fn local(libs: &Path, revision: Revision) -> Self {
        let path: PathBuf = libs
            .join("ipxact_schemas")
            .join(revision.year())
            .join("index.xsd");
        Self {
            schema: path.display().to_string(),
        }
    }
}

impl Validator for XmllintValidator {
    fn validate(&self, path: &Path) -> Result<(), ValidationError> {
        let output = Command::new("xmllint")
            .arg("--noout")
            .arg("--schema")
            .arg(&self.schema)
            .arg(path)
            .output()
            .map_err(ValidationError::Launch)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ValidationError::Failed {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// Selects the validator for the chosen mode.
pub fn validator_for(mode: &ValidationMode, libs: &Path, revision: Revision) -> Box<dyn Validator> {
    match mode {
        ValidationMode::None => Box::new(NoopValidator),
        ValidationMode::Remote => Box::new(XmllintValidator::remote(revision)),
        ValidationMode::Local => Box::new(XmllintValidator::local(libs, revision)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_always_passes() {
        assert!(NoopValidator.validate(Path::new("/does/not/exist.xml")).is_ok());
    }

    #[test]
    fn remote_schema_url() {
        let v = XmllintValidator::remote(Revision::Std2014);
        assert_eq!(
            v.schema,
            "http://www.accellera.org/XMLSchema/IPXACT/1685-2014/index.xsd"
        );
    }

    #[test]
    fn local_schema_path() {
        let v = XmllintValidator::local(Path::new("libs"), Revision::Std2009);
        assert!(v.schema.ends_with("2009/index.xsd"));
        assert!(v.schema.starts_with("libs"));
    }
}
