use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::analysis_fetch;
use crate::config::{Settings, Source};
use crate::fake_feed;
use crate::state::{Delta, ProviderCommand};

/// Worker thread that owns all network traffic.
///
/// Commands are served one at a time; every answer goes back as a `Delta`.
/// The thread exits once the UI drops its command sender.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, settings: Settings) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();

        while let Ok(cmd) = cmd_rx.recv() {
            let delta = match cmd {
                ProviderCommand::FetchEncounters => match settings.source {
                    Source::Demo => Delta::SetEncounters(fake_feed::demo_encounters()),
                    Source::Http => match analysis_fetch::fetch_encounters(&settings.api_url) {
                        Ok(encounters) => Delta::SetEncounters(encounters),
                        Err(err) => {
                            let _ = tx.send(Delta::Log(format!(
                                "[WARN] Encounter list error: {err:#}"
                            )));
                            Delta::SetEncounters(Vec::new())
                        }
                    },
                },
                ProviderCommand::Analyze { request, body } => {
                    let outcome = match settings.source {
                        Source::Demo => {
                            // Keep the loading screen visible for a moment.
                            thread::sleep(Duration::from_millis(600));
                            fake_feed::demo_analysis(&mut rng, &body)
                        }
                        Source::Http => analysis_fetch::post_analyze(&settings.api_url, &body)
                            .map(|response| {
                                let mismatched = response.count_mismatches();
                                if !mismatched.is_empty() {
                                    let _ = tx.send(Delta::Log(format!(
                                        "[WARN] Service counts disagree with details for: {}",
                                        mismatched.join(", ")
                                    )));
                                }
                                response.into_records()
                            }),
                    };
                    Delta::AnalysisSettled { request, outcome }
                }
            };

            if tx.send(delta).is_err() {
                break;
            }
        }
    });
}
