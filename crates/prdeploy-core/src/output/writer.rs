//! `$GITHUB_OUTPUT` writer for run outputs

use crate::error::{Error, Result};
use crate::outcome::Outputs;
use std::io::Write;
use std::path::Path;

/// Heredoc delimiter for multiline-safe output values
pub const OUTPUT_DELIMITER: &str = "PRDEPLOY_EOF";

/// Output file writer
pub struct OutputWriter;

impl OutputWriter {
    /// Write outputs in the `$GITHUB_OUTPUT` heredoc syntax.
    ///
    /// Empty outputs write nothing, so downstream steps see them unset.
    pub fn write<W: Write>(w: &mut W, outputs: &Outputs) -> Result<()> {
        for (name, value) in outputs.pairs() {
            if value.contains(OUTPUT_DELIMITER) {
                return Err(Error::Runtime(format!(
                    "output '{}' contains the output delimiter",
                    name
                )));
            }
            writeln!(w, "{name}<<{OUTPUT_DELIMITER}")?;
            writeln!(w, "{value}")?;
            writeln!(w, "{OUTPUT_DELIMITER}")?;
        }
        Ok(())
    }

    /// Append outputs to the file named by `$GITHUB_OUTPUT`.
    pub fn append_to_file(path: &Path, outputs: &Outputs) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| {
                Error::Runtime(format!(
                    "cannot open GITHUB_OUTPUT ({}): {}",
                    path.display(),
                    e
                ))
            })?;
        Self::write(&mut f, outputs)
    }
}
