pub mod assembler;
pub mod correlator;
pub mod pass;
pub mod poller;
pub mod settings;

#[cfg(test)]
mod fakes;

pub use assembler::{AssembleError, AssembleOutcome, Assembler};
pub use correlator::{Correlator, GroupFailure, GroupOutcome, GroupReport, MergeGroup, MergeRecipe};
pub use pass::{Merger, PassContext, PassError, PassOutcome, scan_folder};
pub use poller::{ControlMessage, Poller};
pub use settings::{MERGE_FOLDER_NAME, POLL_INTERVAL, SETTINGS_FILE_NAME, Settings, SettingsError};
