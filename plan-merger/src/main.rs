use chrono::Local;
use log::{error, info};
use merge_classifier::Classifier;
use merge_extractor::{Extractor, JpegPdfConverter, LopdfConcatenator};
use plan_merger::{
    ControlMessage, MergeRecipe, Merger, POLL_INTERVAL, PassContext, Poller, SETTINGS_FILE_NAME,
    Settings,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc::channel;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf, "{}  {}", Local::now().format("%m/%d %H:%M"), record.args())
        })
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    let settings_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));

    let settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let classifier = match Classifier::radiotherapy() {
        Ok(classifier) => classifier,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let extractor = Extractor::new();
    let merger = Merger {
        classifier: &classifier,
        text_source: &extractor,
        converter: &JpegPdfConverter,
        concatenator: &LopdfConcatenator,
        recipe: MergeRecipe::brachy(),
    };

    let (controller, controller_receiver) = channel::<ControlMessage>(10);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = controller.send(ControlMessage::Stop).await;
        }
    });

    info!(
        "Watching {} every {} seconds.",
        settings.source_folder.display(),
        POLL_INTERVAL.as_secs()
    );

    let result = Poller::new(POLL_INTERVAL)
        .run(
            || {
                let ctx = PassContext::begin(&settings)?;
                merger.run_pass(&ctx).map(|_| ())
            },
            controller_receiver,
        )
        .await;

    match result {
        Ok(passes) => {
            info!("Stopped after {passes} pass(es).");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
