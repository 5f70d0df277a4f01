mod app;

use std::process::ExitCode;

fn main() -> ExitCode {
    let wiring = app::bootstrap::build_app();
    app::loop_runner::run(wiring)
}
