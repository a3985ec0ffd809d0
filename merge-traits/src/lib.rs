use chrono::{NaiveDateTime, TimeDelta};
use std::fmt::{self, Display};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Every kind of report the classifier knows how to recognise.
///
/// The declaration order here is NOT the matching order, see
/// `merge_classifier::instances::GRAMMAR_ORDER` for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// Eclipse external beam plan report.
    EclipsePlan,
    /// Oncentra brachy plan report (microSelectron v3).
    OncentraPlan,
    /// Eclipse dose-volume histogram report.
    EclipseDvh,
    /// Oncentra dose-volume histogram report.
    OncentraDvh,
    /// Eclipse beam's eye view printout, one per field.
    EclipseBeamsEye,
    /// ClearCheck plan evaluation.
    ClearCheck,
    /// Independent monitor unit calculation for a linac plan.
    LinacSecondCheck,
    /// Independent dose verification for a brachy plan.
    BrachySecondCheck,
    /// Nothing matched, only the generic fallback fields were tried.
    Unknown,
}

impl DocumentType {
    pub const fn ident(&self) -> &'static str {
        match self {
            Self::EclipsePlan => "plandocEclipse",
            Self::OncentraPlan => "plandocOncentra",
            Self::EclipseDvh => "DVHEclipse",
            Self::OncentraDvh => "DVHOncentra",
            Self::EclipseBeamsEye => "BEVEclipse",
            Self::ClearCheck => "clearchk",
            Self::LinacSecondCheck => "2ndchkLINAC",
            Self::BrachySecondCheck => "2ndchkbrachy",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ident())
    }
}

/// What a single grammar managed to pull out of a page of text.
///
/// Every field is optional; a grammar that matched its marker but none
/// of its field patterns still yields a valid record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedDocument {
    pub source_path: PathBuf,
    /// Informational only.
    pub page_count: usize,
    pub document_type: DocumentType,
    pub patient_id: Option<String>,
    pub plan_id: Option<String>,
    /// `None` when the timestamp pattern did not match or did not parse.
    pub printed_at: Option<NaiveDateTime>,
    /// Radiation field name, beam's eye view printouts only.
    pub field_id: Option<String>,
}

impl ClassifiedDocument {
    /// A record with no fields extracted and no source attached.
    pub fn unclassified(document_type: DocumentType) -> Self {
        Self {
            source_path: PathBuf::new(),
            page_count: 1,
            document_type,
            patient_id: None,
            plan_id: None,
            printed_at: None,
            field_id: None,
        }
    }

    /// Attaches the originating file to a record produced from its text.
    pub fn with_source(mut self, source_path: impl Into<PathBuf>, page_count: usize) -> Self {
        self.source_path = source_path.into();
        self.page_count = page_count.max(1);
        self
    }

    pub fn is(&self, document_type: DocumentType) -> bool {
        self.document_type == document_type
    }
}

/// Text of the first page of a document plus the number of pages it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub page_count: usize,
}

/// True when `a` and `b` are strictly less than `window` apart, in either direction.
pub fn within_window(a: NaiveDateTime, b: NaiveDateTime, window: TimeDelta) -> bool {
    let delta = if a >= b { a - b } else { b - a };
    delta < window
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("{} cannot be loaded: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} cannot be read as pdf: {reason}", path.display())]
    NotAPdf { path: PathBuf, reason: String },

    #[error("{} has no pages", path.display())]
    NoPages { path: PathBuf },
}

#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    #[error("{} is not a file", path.display())]
    NotAFile { path: PathBuf },

    #[error("{} is not a readable image: {reason}", path.display())]
    NotAnImage { path: PathBuf, reason: String },

    #[error("{} is a {found} image, only jpeg captures are supported", path.display())]
    UnsupportedFormat { path: PathBuf, found: String },

    #[error("{} does not follow the <patient>sc.jpg naming convention", path.display())]
    UnexpectedFileName { path: PathBuf },

    #[error("Failed to convert {} to pdf: {reason}", path.display())]
    Conversion { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConcatError {
    #[error("{} cannot be merged: {reason}", path.display())]
    Input { path: PathBuf, reason: String },

    #[error("Failed to build merged document: {0}")]
    Output(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Yields the raw text of the first page of a document.
pub trait TextSource {
    fn first_page(&self, path: &Path) -> Result<PageText, ExtractError>;
}

/// Renders an image as a single page document at `target`.
pub trait ImageConverter {
    fn convert(&self, image: &Path, target: &Path) -> Result<(), ImageError>;
}

/// Concatenates whole documents, in order, into `sink`.
///
/// Implementations must not write anything to `sink` until every input
/// has been read successfully.
pub trait PdfConcatenator {
    fn concatenate(&self, inputs: &[PathBuf], sink: &mut dyn Write) -> Result<(), ConcatError>;
}
