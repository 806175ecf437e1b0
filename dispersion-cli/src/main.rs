//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = dispersion_cli::run() {
        eprintln!("dispersion: {err}");
        std::process::exit(1);
    }
}
