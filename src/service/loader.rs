//! Service definition loading.
//!
//! # Responsibilities
//! - Read and parse one YAML service file
//! - Resolve `${file(<path>)}` fragment references in `functions`
//! - Merge fragments in order, later keys overriding earlier ones
//!
//! # Design Decisions
//! - Each file loads independently; one broken file never affects another
//! - Fragments resolve against the working directory, not the file's directory
//! - Any read or parse error aborts the file (the caller decides what to do)

use std::fs;
use std::path::{Path, PathBuf};
use serde_yaml::Value;
use thiserror::Error;

use crate::service::definition::{FunctionMap, ServiceDefinition};

/// Errors raised while loading a service definition.
#[derive(Debug, Error)]
pub enum ServiceConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid fragment reference '{0}' (expected ${{file(<path>)}})")]
    FragmentReference(String),

    #[error("'functions' in {0} must be a mapping or a list of fragment references")]
    FunctionsShape(PathBuf),
}

/// Loads service definition files relative to a working directory.
#[derive(Debug, Clone)]
pub struct ServiceLoader {
    working_dir: PathBuf,
}

impl ServiceLoader {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Load one service file and every fragment it references.
    pub fn load(&self, path: &Path) -> Result<ServiceDefinition, ServiceConfigError> {
        let source = self.working_dir.join(path);
        let document = read_yaml(&source)?;

        let functions = match document.get("functions") {
            None | Some(Value::Null) => FunctionMap::new(),
            Some(Value::Sequence(references)) => {
                let mut merged = FunctionMap::new();
                for reference in references {
                    let reference = reference
                        .as_str()
                        .ok_or_else(|| ServiceConfigError::FunctionsShape(source.clone()))?;
                    let fragment = self.working_dir.join(parse_file_reference(reference)?);
                    tracing::debug!(fragment = %fragment.display(), "Merging function fragment");
                    merged.extend(parse_functions(&fragment, read_yaml(&fragment)?)?);
                }
                merged
            }
            Some(functions @ Value::Mapping(_)) => parse_functions(&source, functions.clone())?,
            Some(_) => return Err(ServiceConfigError::FunctionsShape(source)),
        };

        Ok(ServiceDefinition { source, functions })
    }

    /// Load several files, keeping each outcome separate.
    pub fn load_all<'a, I>(&self, paths: I) -> Vec<(PathBuf, Result<ServiceDefinition, ServiceConfigError>)>
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        paths
            .into_iter()
            .map(|path| (path.clone(), self.load(path)))
            .collect()
    }
}

/// Extract `<path>` from `${file(<path>)}`.
pub fn parse_file_reference(reference: &str) -> Result<&str, ServiceConfigError> {
    reference
        .trim()
        .strip_prefix("${file(")
        .and_then(|rest| rest.strip_suffix(")}"))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .ok_or_else(|| ServiceConfigError::FragmentReference(reference.to_string()))
}

fn read_yaml(path: &Path) -> Result<Value, ServiceConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ServiceConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ServiceConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_functions(path: &Path, value: Value) -> Result<FunctionMap, ServiceConfigError> {
    if value.is_null() {
        return Ok(FunctionMap::new());
    }
    serde_yaml::from_value(value).map_err(|source| ServiceConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
