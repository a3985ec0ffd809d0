use crate::assembler::Assembler;
use crate::correlator::{Correlator, GroupReport, MergeRecipe};
use crate::settings::Settings;
use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use merge_classifier::Classifier;
use merge_extractor::ImageDescriptor;
use merge_traits::{ClassifiedDocument, ImageConverter, PdfConcatenator, TextSource};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum PassError {
    #[error("Source folder {} does not exist", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Cannot create merge folder {}: {source}", path.display())]
    CreateMergeFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot list {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PassError {
    /// Fatal errors stop polling; the others are retried next pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PassError::SourceMissing { .. })
    }
}

/// State of a single pass, rebuilt every time.
#[derive(Debug, Clone)]
pub struct PassContext {
    pub source_folder: PathBuf,
    pub merge_folder: PathBuf,
    pub started_at: NaiveDateTime,
}

impl PassContext {
    pub fn begin(settings: &Settings) -> Result<Self, PassError> {
        let source_folder = settings.source_folder.clone();
        if !source_folder.is_dir() {
            return Err(PassError::SourceMissing {
                path: source_folder,
            });
        }

        let merge_folder = settings.merge_folder();
        std::fs::create_dir_all(&merge_folder).map_err(|source| {
            PassError::CreateMergeFolder {
                path: merge_folder.clone(),
                source,
            }
        })?;

        Ok(Self {
            source_folder,
            merge_folder,
            started_at: Local::now().naive_local(),
        })
    }
}

/// Regular files in `dir` whose extension equals `extension` ignoring
/// case, sorted by file name. Subfolders are not entered.
pub fn scan_folder(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PassError> {
    let scan_error = |source| PassError::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_error)? {
        let entry = entry.map_err(scan_error)?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[derive(Debug)]
pub enum PassOutcome {
    /// Fewer than two PDFs were present, nothing was classified.
    NothingToMerge { documents: usize },
    Correlated(Vec<GroupReport>),
}

/// Everything a pass needs besides its [PassContext].
pub struct Merger<'a> {
    pub classifier: &'a Classifier,
    pub text_source: &'a dyn TextSource,
    pub converter: &'a dyn ImageConverter,
    pub concatenator: &'a dyn PdfConcatenator,
    pub recipe: MergeRecipe,
}

impl<'a> Merger<'a> {
    pub fn run_pass(&self, ctx: &PassContext) -> Result<PassOutcome, PassError> {
        info!("Start merge pass in {}.", ctx.source_folder.display());

        let pdfs = scan_folder(&ctx.source_folder, "pdf")?;
        if pdfs.len() < 2 {
            info!("--Not enough pdf files for merge ({} found).", pdfs.len());
            return Ok(PassOutcome::NothingToMerge {
                documents: pdfs.len(),
            });
        }

        let documents = self.classify_all(&pdfs);
        let images = Self::describe_all(&scan_folder(&ctx.source_folder, "jpg")?);

        let correlator = Correlator::new(
            self.recipe,
            self.converter,
            Assembler::new(self.concatenator),
        );
        let reports = correlator.correlate(&documents, &images, &ctx.merge_folder);

        let merged = reports.iter().filter(|r| r.is_success()).count();
        info!(
            "Pass started {} finished: {} of {} plan(s) merged or already present.",
            ctx.started_at.format("%m/%d %H:%M"),
            merged,
            reports.len()
        );

        Ok(PassOutcome::Correlated(reports))
    }

    fn classify_all(&self, pdfs: &[PathBuf]) -> Vec<ClassifiedDocument> {
        pdfs.iter()
            .filter_map(|path| match self.classifier.classify_file(path, self.text_source) {
                Ok(doc) => {
                    info!("{} is {}.", path.display(), doc.document_type);
                    Some(doc)
                }
                Err(e) => {
                    warn!("--Skipping {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    fn describe_all(jpgs: &[PathBuf]) -> Vec<ImageDescriptor> {
        jpgs.iter()
            .filter_map(|path| match ImageDescriptor::describe(path) {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("--Skipping {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }
}
