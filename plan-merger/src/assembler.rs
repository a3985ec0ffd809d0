use log::info;
use merge_traits::{ConcatError, PdfConcatenator};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleOutcome {
    Written,
    /// The output already existed, nothing was done.
    AlreadyMerged,
}

#[derive(thiserror::Error, Debug)]
pub enum AssembleError {
    #[error("Nothing to assemble into {}", output.display())]
    NothingToAssemble { output: PathBuf },

    #[error("Fail to save merged plan file {}: {source}", output.display())]
    Write {
        output: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Concat(#[from] ConcatError),
}

/// Writes merged documents, at most once per output path.
///
/// The merge is staged in a temporary file next to `output` and only
/// moved into place once it is complete, so a failure never leaves a
/// file at `output` that a later pass would take as finished.
pub struct Assembler<'a> {
    concatenator: &'a dyn PdfConcatenator,
}

impl<'a> Assembler<'a> {
    pub fn new(concatenator: &'a dyn PdfConcatenator) -> Self {
        Self { concatenator }
    }

    pub fn assemble(
        &self,
        ordered: &[PathBuf],
        output: &Path,
    ) -> Result<AssembleOutcome, AssembleError> {
        if output.exists() {
            info!("--The merged file already exists in {}.", output.display());
            return Ok(AssembleOutcome::AlreadyMerged);
        }

        if ordered.is_empty() {
            return Err(AssembleError::NothingToAssemble {
                output: output.to_path_buf(),
            });
        }

        let write_error = |source: std::io::Error| AssembleError::Write {
            output: output.to_path_buf(),
            source,
        };

        let folder = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut staged = tempfile::Builder::new()
            .prefix(".merging-")
            .suffix(".part")
            .tempfile_in(folder)
            .map_err(write_error)?;

        // on error `staged` is dropped and removed with it
        self.concatenator.concatenate(ordered, &mut staged)?;

        match staged.persist_noclobber(output) {
            Ok(_) => Ok(AssembleOutcome::Written),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                info!("--The merged file already exists in {}.", output.display());
                Ok(AssembleOutcome::AlreadyMerged)
            }
            Err(e) => Err(write_error(e.error)),
        }
    }
}
