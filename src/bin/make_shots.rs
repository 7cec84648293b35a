use std::process::ExitCode;

fn main() -> ExitCode {
    match shotsplits::app::run_make_shots(std::env::args().skip(1)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("make_shots: {err}");
            ExitCode::from(2)
        }
    }
}
