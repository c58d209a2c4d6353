/// Output file naming and persistence of the aggregated API responses.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use xmltree::{Element, EmitterConfig};

use crate::logging::{self, Stage};
use crate::model::RunError;

/// Paths of the two files produced for one input sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub xml: PathBuf,
    pub xlsx: PathBuf,
}

impl OutputPaths {
    /// `survey.xlsx` -> `survey_out.xml`, `survey_out.xlsx`, next to the input.
    pub fn for_input(input: &Path) -> Self {
        let stem = input.with_extension("");
        OutputPaths {
            xml: with_suffix(&stem, "_out.xml"),
            xlsx: with_suffix(&stem, "_out.xlsx"),
        }
    }
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write the aggregate document as indented XML.
///
/// Returns `Ok(false)` without touching the file system when there is no
/// aggregate to write.
pub fn save_xml(aggregate: Option<&Element>, path: &Path) -> Result<bool, RunError> {
    let Some(root) = aggregate else {
        logging::warn(Stage::Output, None, "No valid XML tree, skipping XML output");
        return Ok(false);
    };

    let write_error = |reason: String| RunError::OutputWrite {
        path: path.display().to_string(),
        reason,
    };

    let file = File::create(path).map_err(|e| write_error(e.to_string()))?;
    let config = EmitterConfig::new().perform_indent(true);
    root.write_with_config(BufWriter::new(file), config)
        .map_err(|e| write_error(e.to_string()))?;

    logging::info(Stage::Output, None, &format!("Wrote {}", path.display()));
    Ok(true)
}
