use crate::assembler::{AssembleError, AssembleOutcome, Assembler};
use chrono::{NaiveDateTime, TimeDelta};
use log::{info, warn};
use merge_extractor::ImageDescriptor;
use merge_traits::{ClassifiedDocument, DocumentType, ImageConverter, within_window};
use std::path::{Path, PathBuf};

/// Which document types make up a complete plan and how far apart in
/// time they may be printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRecipe {
    /// Starts a group; its print time is the reference for every window.
    pub anchor: DocumentType,
    pub secondary: DocumentType,
    pub secondary_window: TimeDelta,
    pub image_window: TimeDelta,
    pub verification: DocumentType,
    pub verification_window: TimeDelta,
}

impl MergeRecipe {
    /// Oncentra brachy plan, its DVH, the screen capture(s) and the
    /// independent dose verification.
    pub fn brachy() -> Self {
        Self {
            anchor: DocumentType::OncentraPlan,
            secondary: DocumentType::OncentraDvh,
            secondary_window: TimeDelta::hours(5),
            image_window: TimeDelta::hours(5),
            verification: DocumentType::BrachySecondCheck,
            verification_window: TimeDelta::hours(24),
        }
    }
}

impl Default for MergeRecipe {
    fn default() -> Self {
        Self::brachy()
    }
}

fn hours(window: &TimeDelta) -> i64 {
    window.num_hours()
}

#[derive(thiserror::Error, Debug)]
pub enum GroupFailure {
    #[error("--Cannot determine the patient of plan file {}.", anchor.display())]
    MissingPatient { anchor: PathBuf },

    #[error("--Patient {patient:?} cannot be used as a file name.")]
    UnsafePatientId { patient: String },

    #[error("--Not enough files are present for merge ({documents} pdf, {images} jpg).")]
    InsufficientFiles { documents: usize, images: usize },

    #[error("--Cannot find the print time of plan file {}.", anchor.display())]
    MissingAnchorTime { anchor: PathBuf },

    #[error("--Cannot find the {document_type} file within {} hours time frame.", hours(window))]
    MissingSecondary {
        document_type: DocumentType,
        window: TimeDelta,
    },

    #[error("--Cannot find the image file within {} hours time frame.", hours(window))]
    MissingImage { window: TimeDelta },

    #[error("--Cannot find the {document_type} file within {} hours time frame.", hours(window))]
    MissingVerification {
        document_type: DocumentType,
        window: TimeDelta,
    },

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// A merged file was written from these inputs, in this order.
    Merged { inputs: Vec<PathBuf> },
    AlreadyMerged,
}

/// What happened to the group started by one anchor document.
#[derive(Debug)]
pub struct GroupReport {
    pub anchor: PathBuf,
    pub patient_id: Option<String>,
    pub output: Option<PathBuf>,
    pub result: Result<GroupOutcome, GroupFailure>,
}

impl GroupReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything belonging to one anchor for the duration of a pass.
#[derive(Debug)]
pub struct MergeGroup<'a> {
    pub anchor: &'a ClassifiedDocument,
    pub satellites: Vec<&'a ClassifiedDocument>,
    pub images: Vec<&'a ImageDescriptor>,
}

impl<'a> MergeGroup<'a> {
    /// Collects satellites by exact patient match and images by
    /// case-insensitive match, both in their original order.
    pub fn gather(
        anchor: &'a ClassifiedDocument,
        patient: &str,
        documents: &'a [ClassifiedDocument],
        images: &'a [ImageDescriptor],
        recipe: &MergeRecipe,
    ) -> Self {
        let satellites = documents
            .iter()
            .filter(|d| !d.is(recipe.anchor) && d.patient_id.as_deref() == Some(patient))
            .collect();

        let patient_lower = patient.to_lowercase();
        let images = images
            .iter()
            .filter(|i| i.patient_id.to_lowercase() == patient_lower)
            .collect();

        Self {
            anchor,
            satellites,
            images,
        }
    }

    fn first_satellite(
        &self,
        document_type: DocumentType,
        reference: NaiveDateTime,
        window: TimeDelta,
    ) -> Option<&'a ClassifiedDocument> {
        self.satellites.iter().copied().find(|d| {
            d.is(document_type)
                && d.printed_at
                    .is_some_and(|t| within_window(t, reference, window))
        })
    }

    /// Builds the ordered input list, stopping at the first missing piece.
    pub fn plan(
        &self,
        recipe: &MergeRecipe,
        converter: &dyn ImageConverter,
    ) -> Result<Vec<PathBuf>, GroupFailure> {
        let reference = self
            .anchor
            .printed_at
            .ok_or_else(|| GroupFailure::MissingAnchorTime {
                anchor: self.anchor.source_path.clone(),
            })?;

        let mut ordered = vec![self.anchor.source_path.clone()];

        let secondary = self
            .first_satellite(recipe.secondary, reference, recipe.secondary_window)
            .ok_or(GroupFailure::MissingSecondary {
                document_type: recipe.secondary,
                window: recipe.secondary_window,
            })?;
        ordered.push(secondary.source_path.clone());

        let mut found_image = false;
        for image in self
            .images
            .iter()
            .filter(|i| within_window(i.modified_at, reference, recipe.image_window))
        {
            match image.to_document_form(converter) {
                Ok(pdf) => {
                    ordered.push(pdf);
                    found_image = true;
                }
                Err(e) => warn!("--{e}"),
            }
        }
        if !found_image {
            return Err(GroupFailure::MissingImage {
                window: recipe.image_window,
            });
        }

        let verification = self
            .first_satellite(recipe.verification, reference, recipe.verification_window)
            .ok_or(GroupFailure::MissingVerification {
                document_type: recipe.verification,
                window: recipe.verification_window,
            })?;
        ordered.push(verification.source_path.clone());

        Ok(ordered)
    }
}

/// Groups the documents of a pass around each anchor and merges the
/// complete groups.
pub struct Correlator<'a> {
    recipe: MergeRecipe,
    converter: &'a dyn ImageConverter,
    assembler: Assembler<'a>,
}

impl<'a> Correlator<'a> {
    pub fn new(recipe: MergeRecipe, converter: &'a dyn ImageConverter, assembler: Assembler<'a>) -> Self {
        Self {
            recipe,
            converter,
            assembler,
        }
    }

    pub fn recipe(&self) -> &MergeRecipe {
        &self.recipe
    }

    /// One report per anchor document, in document order. Groups never
    /// affect each other.
    pub fn correlate(
        &self,
        documents: &[ClassifiedDocument],
        images: &[ImageDescriptor],
        output_folder: &Path,
    ) -> Vec<GroupReport> {
        documents
            .iter()
            .filter(|d| d.is(self.recipe.anchor))
            .map(|anchor| {
                let report = self.merge_group(anchor, documents, images, output_folder);
                match &report.result {
                    Ok(GroupOutcome::Merged { .. }) => info!("--Merged plan completed."),
                    Ok(GroupOutcome::AlreadyMerged) => {}
                    Err(e) => warn!("{e}"),
                }
                report
            })
            .collect()
    }

    fn merge_group(
        &self,
        anchor: &ClassifiedDocument,
        documents: &[ClassifiedDocument],
        images: &[ImageDescriptor],
        output_folder: &Path,
    ) -> GroupReport {
        let mut report = GroupReport {
            anchor: anchor.source_path.clone(),
            patient_id: anchor.patient_id.clone(),
            output: None,
            result: Ok(GroupOutcome::AlreadyMerged),
        };

        let Some(patient) = anchor.patient_id.as_deref() else {
            report.result = Err(GroupFailure::MissingPatient {
                anchor: anchor.source_path.clone(),
            });
            return report;
        };

        let group = MergeGroup::gather(anchor, patient, documents, images, &self.recipe);
        info!(
            "Found {} pdf files and {} jpg file(s) for patient {}.",
            group.satellites.len() + 1,
            group.images.len(),
            patient
        );

        if group.satellites.is_empty() || group.images.is_empty() {
            report.result = Err(GroupFailure::InsufficientFiles {
                documents: group.satellites.len() + 1,
                images: group.images.len(),
            });
            return report;
        }

        if patient.contains(['/', '\\']) || patient == "." || patient == ".." {
            report.result = Err(GroupFailure::UnsafePatientId {
                patient: patient.to_string(),
            });
            return report;
        }

        info!("Start creating plan for patient {patient}.");
        let output = output_folder.join(format!("{patient}.pdf"));
        report.output = Some(output.clone());

        if output.exists() {
            info!("--The merged file already exists in {}.", output.display());
            return report;
        }

        report.result = group
            .plan(&self.recipe, self.converter)
            .and_then(|inputs| match self.assembler.assemble(&inputs, &output)? {
                AssembleOutcome::Written => Ok(GroupOutcome::Merged { inputs }),
                AssembleOutcome::AlreadyMerged => Ok(GroupOutcome::AlreadyMerged),
            });

        report
    }
}
