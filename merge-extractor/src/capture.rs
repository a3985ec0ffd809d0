use chrono::{DateTime, Local, NaiveDateTime};
use image::{ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use merge_traits::{ImageConverter, ImageError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Screen captures are saved as `<patient>sc.jpg`.
static CAPTURE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)sc\.jpg$").expect("capture name pattern is valid"));

/// Captures are rendered into the PDF at this many pixels per inch.
pub const CAPTURE_DPI: f64 = 100.0;

/// A screen capture that belongs to a patient.
///
/// Captures carry no metadata of their own, so the patient comes from the
/// file name and the time from the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub source_path: PathBuf,
    pub format: ImageFormat,
    pub patient_id: String,
    pub modified_at: NaiveDateTime,
}

impl ImageDescriptor {
    pub fn describe(path: &Path) -> Result<Self, ImageError> {
        if !path.is_file() {
            return Err(ImageError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let not_an_image = |reason: String| ImageError::NotAnImage {
            path: path.to_path_buf(),
            reason,
        };

        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| not_an_image(e.to_string()))?;

        match reader.format() {
            Some(ImageFormat::Jpeg) => {}
            Some(other) => {
                return Err(ImageError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    found: format!("{other:?}"),
                });
            }
            None => return Err(not_an_image("unrecognised format".to_string())),
        }

        // header only, the pixels are decoded on conversion
        reader
            .into_dimensions()
            .map_err(|e| not_an_image(e.to_string()))?;

        let patient_id = patient_from_file_name(path).ok_or_else(|| {
            ImageError::UnexpectedFileName {
                path: path.to_path_buf(),
            }
        })?;

        let modified = std::fs::metadata(path)?.modified()?;
        let modified_at = DateTime::<Local>::from(modified).naive_local();

        debug!(
            "Described {} as capture of {} modified {}",
            path.display(),
            patient_id,
            modified_at
        );

        Ok(Self {
            source_path: path.to_path_buf(),
            format: ImageFormat::Jpeg,
            patient_id,
            modified_at,
        })
    }

    /// Where the PDF form of this capture lives: same folder, same stem.
    pub fn document_path(&self) -> PathBuf {
        self.source_path.with_extension("pdf")
    }

    /// Returns the PDF form of this capture, converting it only if the
    /// sibling PDF does not exist yet.
    pub fn to_document_form(&self, converter: &dyn ImageConverter) -> Result<PathBuf, ImageError> {
        let target = self.document_path();
        if target.is_file() {
            debug!("{} already converted", target.display());
            return Ok(target);
        }

        converter.convert(&self.source_path, &target)?;
        Ok(target)
    }
}

fn patient_from_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    CAPTURE_NAME
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Renders an image as a single page PDF sized at [CAPTURE_DPI].
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegPdfConverter;

impl JpegPdfConverter {
    fn render(image: &Path) -> Result<Vec<u8>, String> {
        let decoded = ImageReader::open(image)
            .map_err(|e| e.to_string())?
            .with_guessed_format()
            .map_err(|e| e.to_string())?
            .decode()
            .map_err(|e| e.to_string())?
            .to_rgb8();

        let (width_px, height_px) = decoded.dimensions();
        let width = to_points(width_px);
        let height = to_points(height_px);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width_px as i64,
                "Height" => height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            decoded.into_raw(),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(|e| e.to_string())?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buf = Vec::new();
        doc.save_to(&mut buf).map_err(|e| e.to_string())?;
        Ok(buf)
    }
}

/// Writes `bytes` to `<target>.part` and renames it over `target`. The
/// staged file is removed on any failure, so no half written pdf is left
/// where the next pass would reuse it.
fn write_staged(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let partial = target.with_extension("pdf.part");
    let result = std::fs::write(&partial, bytes).and_then(|()| std::fs::rename(&partial, target));
    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

fn to_points(px: u32) -> i64 {
    ((px as f64 * 72.0 / CAPTURE_DPI).round() as i64).max(1)
}

impl ImageConverter for JpegPdfConverter {
    fn convert(&self, image: &Path, target: &Path) -> Result<(), ImageError> {
        let bytes = Self::render(image).map_err(|reason| ImageError::Conversion {
            path: image.to_path_buf(),
            reason,
        })?;

        write_staged(target, &bytes)?;

        debug!("Converted {} to {}", image.display(), target.display());
        Ok(())
    }
}
