macro_rules! debug {
    ($template:expr) => {
        #[cfg(feature = "logging")]
        log::debug!($template);
    };
    ($template:expr, $($args:expr),+ $(,)?) => {
        #[cfg(feature = "logging")]
        log::debug!($template, $($args),+);
    };
}

pub mod capture;
pub mod concat;
pub mod extractor;

#[cfg(test)]
pub(crate) mod test_pdf;

pub use capture::{ImageDescriptor, JpegPdfConverter};
pub use concat::LopdfConcatenator;
pub use extractor::Extractor;
