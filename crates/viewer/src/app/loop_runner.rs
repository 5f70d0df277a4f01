use std::process::ExitCode;

use agentview_engine::{run_app, Session};
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let session = Session::new(app.session);
    if let Err(err) = run_app(app.config, session) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
