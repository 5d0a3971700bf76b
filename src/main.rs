use std::process::ExitCode;

fn main() -> ExitCode {
    match voc2tfrecord::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
