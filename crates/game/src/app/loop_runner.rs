use std::process::ExitCode;

use pilgrimage_engine::run_app;
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::gameplay::WalkthroughReport;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut router,
        mut input,
        mut presenter,
        log,
    } = app;

    let summary = match run_app(config, &mut router, input.as_mut(), &mut presenter) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "run_failed");
            return ExitCode::FAILURE;
        }
    };

    let report = WalkthroughReport::new(&summary, &log.borrow());
    info!(
        end = %report.end,
        ticks = report.ticks,
        frames = summary.frames,
        scenes = report.scenes_entered.len(),
        dropped_backlog_ms = summary.dropped_backlog.as_millis() as u64,
        "walkthrough_finished"
    );
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            error!(error = %err, "report_serialize_failed");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
