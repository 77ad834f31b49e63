//! Integration tests for the `example run` command.
use heatdemand::cli::RunOpts;
use heatdemand::cli::example::handle_example_run_command;
use heatdemand::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("HEATDEMAND_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        ..RunOpts::default()
    };
    handle_example_run_command("schleswig_holstein", &opts, Some(Settings::default())).unwrap();
    assert!(tempdir.path().join("summary.csv").is_file());

    // The expanded stock is only written on request
    assert!(!tempdir.path().join("debug_expanded_stock.csv").exists());
}
