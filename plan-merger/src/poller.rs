use crate::pass::PassError;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::Receiver;

pub enum ControlMessage {
    Stop,
    Pause,
    Resume,
}

/// Runs one pass, then idles for `interval` while listening for control
/// messages, until stopped or a pass fails fatally.
pub struct Poller {
    interval: Duration,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Returns the number of passes that were run.
    pub async fn run<F>(
        &self,
        mut pass: F,
        mut controller: Receiver<ControlMessage>,
    ) -> Result<usize, PassError>
    where
        F: FnMut() -> Result<(), PassError>,
    {
        let mut passes = 0;
        let mut controller_open = true;

        loop {
            match pass() {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("{e}"),
            }
            passes += 1;

            let idle = tokio::time::sleep(self.interval);
            tokio::pin!(idle);

            loop {
                select! {
                    _ = &mut idle => break,

                    msg = controller.recv(), if controller_open => {
                        match msg {
                            Some(ControlMessage::Stop) => {
                                info!("Received stop signal, stop merging.");
                                return Ok(passes);
                            }
                            Some(ControlMessage::Pause) => {
                                info!("Merging paused.");
                                if !Self::wait_for_resume(&mut controller).await {
                                    return Ok(passes);
                                }
                                info!("Merging resumed.");
                                break;
                            }
                            Some(ControlMessage::Resume) => {
                                debug!("Received resume signal while not paused, ignoring");
                            }
                            None => {
                                debug!("Control channel closed, polling until a fatal error");
                                controller_open = false;
                            }
                        }
                    }
                }
            }
        }
    }

    /// `false` when stopped or the channel closed while paused.
    async fn wait_for_resume(controller: &mut Receiver<ControlMessage>) -> bool {
        loop {
            match controller.recv().await {
                Some(ControlMessage::Resume) => return true,
                Some(ControlMessage::Stop) => {
                    info!("Received stop signal while paused, stop merging.");
                    return false;
                }
                Some(ControlMessage::Pause) => {
                    debug!("Already paused, ignoring additional pause signal");
                }
                None => {
                    debug!("Control channel closed while paused");
                    return false;
                }
            }
        }
    }
}
