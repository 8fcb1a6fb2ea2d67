//! Integration tests for the `example run` command with a sweep.
use mgopt::cli::RunOpts;
use mgopt::cli::example::handle_example_run_command;
use mgopt::settings::Settings;
use tempfile::tempdir;

/// Every variant of the demo sweep should solve
#[test]
fn test_handle_example_run_command_sweep() {
    unsafe { std::env::set_var("MGOPT_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        overwrite: false,
    };
    handle_example_run_command("simple", true, &opts, Some(Settings::default())).unwrap();

    let mut reader = csv::Reader::from_path(tempdir.path().join("summary.csv")).unwrap();
    let names: Vec<String> = reader
        .records()
        .map(|record| record.unwrap()[0].to_string())
        .collect();
    assert_eq!(
        names,
        [
            "base",
            "no_chp",
            "chp_always_on",
            "blackout",
            "expensive_gas",
            "high_spot_price",
            "full_tank",
            "min_import"
        ]
    );
    for name in &names {
        assert!(tempdir.path().join(name).join("economics.csv").is_file());
    }
}
