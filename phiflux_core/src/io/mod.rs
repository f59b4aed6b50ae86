//! Module for reading and writing Models and the workbooks used by the analyses
use std::path::Path;

use thiserror::Error;

use crate::metabolic_model::model::Model;

pub mod gpr_parse;
pub mod json;
pub mod sbml;
pub mod spreadsheet;

/// Read a model, choosing the format from the file extension
///
/// `.json` files are read as COBRA JSON, `.xml` and `.sbml` files as SBML.
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Model, IoError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(Model::read_json(path)?),
        Some("xml") | Some("sbml") => Ok(Model::read_sbml(path)?),
        _ => Err(IoError::UnknownFormat(path.display().to_string())),
    }
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error("Unable to determine the model format of {0}, expected .json, .xml or .sbml")]
    UnknownFormat(String),
    #[error(transparent)]
    Json(#[from] json::JsonError),
    #[error(transparent)]
    Sbml(#[from] sbml::SbmlError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_model(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join(name)
    }

    #[test]
    fn dispatch_on_extension() {
        assert_eq!(read_model(test_model("toy_model.json")).unwrap().reactions.len(), 6);
        assert_eq!(read_model(test_model("toy_model.xml")).unwrap().reactions.len(), 4);
        assert!(matches!(
            read_model("model.mat"),
            Err(IoError::UnknownFormat(_))
        ));
    }
}
