use merge_traits::{ConcatError, ImageConverter, ImageError, PdfConcatenator};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the paths it was given, one per line, instead of real PDF bytes.
#[derive(Default)]
pub struct ListingConcatenator {
    pub calls: RefCell<Vec<Vec<PathBuf>>>,
}

impl PdfConcatenator for ListingConcatenator {
    fn concatenate(&self, inputs: &[PathBuf], sink: &mut dyn Write) -> Result<(), ConcatError> {
        self.calls.borrow_mut().push(inputs.to_vec());
        if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
            return Err(ConcatError::Input {
                path: missing.clone(),
                reason: "missing".to_string(),
            });
        }
        for input in inputs {
            writeln!(sink, "{}", input.display())?;
        }
        Ok(())
    }
}

/// Writes a placeholder file and counts how often it was asked to.
#[derive(Default)]
pub struct CountingConverter {
    pub calls: Cell<usize>,
    /// Images whose conversion should fail.
    pub broken: Vec<PathBuf>,
}

impl ImageConverter for CountingConverter {
    fn convert(&self, image: &Path, target: &Path) -> Result<(), ImageError> {
        self.calls.set(self.calls.get() + 1);
        if self.broken.iter().any(|b| b == image) {
            return Err(ImageError::Conversion {
                path: image.to_path_buf(),
                reason: "broken".to_string(),
            });
        }
        std::fs::write(target, b"%PDF-1.5")?;
        Ok(())
    }
}
