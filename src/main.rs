//! Provides the main entry point to the program.
use human_panic::{metadata, setup_panic};

fn main() {
    setup_panic!(metadata!().support("Open an issue on the project's issue tracker"));

    if let Err(err) = heatdemand::cli::run_cli() {
        // Errors may occur before the logger is set up, so print them directly
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
