use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn test_dir(name: &str) -> PathBuf {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    test_dir
}

fn run_bin(test_dir: &Path, args: &[&str]) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_count-bounds"));
    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    Command::new(bin)
        .args(["--work-dir", test_dir_str])
        .args(args)
        .output()
        .expect("failed to execute command")
}

fn assert_success(output: &Output, args: &[&str]) {
    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

fn write_seed(test_dir: &Path, seed: usize, n_rows: usize) {
    let mut contents = String::from("Time A B\n");
    for row in 0..n_rows {
        let time = row as f64 * 1e-5;
        let count_a = 10 * row + seed;
        let count_b = 100 + (row % 3) * seed;
        contents += &format!("{time:e} {count_a} {count_b}\n");
    }

    let file = test_dir.join(format!("counts.{seed:05}.txt"));
    fs::write(file, contents).expect("failed to write seed file");
}

fn read_fragment(test_dir: &Path) -> Vec<serde_json::Value> {
    let text = fs::read_to_string(test_dir.join("test_description_partial.json"))
        .expect("failed to read fragment");
    let body = text.trim();
    let body = body.strip_suffix(',').unwrap_or(body);
    if body.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(&format!("[{body}]")).expect("failed to parse fragment")
}

#[test]
fn basic_workflow() {
    let test_dir = test_dir("basic_workflow");
    for seed in 1..=3 {
        write_seed(&test_dir, seed, 25);
    }

    for args in [&["generate"][..], &["check"][..]] {
        assert_success(&run_bin(&test_dir, args), args);
    }

    let means = fs::read_to_string(test_dir.join("means.dat")).expect("failed to read means");
    let stds = fs::read_to_string(test_dir.join("stds.dat")).expect("failed to read stds");
    assert_eq!(means.lines().count(), 25);
    assert_eq!(stds.lines().count(), 25);
    assert!(means.lines().all(|line| line.split_whitespace().count() == 2));
    assert_eq!(
        means.lines().nth(10),
        Some("1.020000000000000000e+02 1.020000000000000000e+02")
    );

    let checks = read_fragment(&test_dir);
    assert_eq!(checks.len(), 2);
    for (check, idx) in checks.iter().zip([10.0, 20.0]) {
        assert_eq!(check["testType"], "COUNT_MINMAX");
        assert_eq!(check["dataFile"], "counts.txt");
        assert_eq!(check["haveHeader"], true);
        assert_eq!(check["minTime"], check["maxTime"]);
        let time = check["minTime"].as_f64().expect("minTime is not a number");
        assert!((time - idx * 1e-5).abs() < 1e-12);
    }
    assert_eq!(checks[0]["countMinimum"], serde_json::json!([99, 99]));
    assert_eq!(checks[0]["countMaximum"], serde_json::json!([104, 104]));
    assert_eq!(checks[1]["countMinimum"], serde_json::json!([199, 99]));
    assert_eq!(checks[1]["countMaximum"], serde_json::json!([204, 108]));

    assert_success(&run_bin(&test_dir, &["clean"]), &["clean"]);
    assert!(!test_dir.join("means.dat").exists());
    assert!(!test_dir.join("stds.dat").exists());
    assert!(!test_dir.join("test_description_partial.json").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn no_arguments_runs_generate() {
    let test_dir = test_dir("no_arguments_runs_generate");
    for seed in 1..=2 {
        write_seed(&test_dir, seed, 11);
    }

    let bin = PathBuf::from(env!("CARGO_BIN_EXE_count-bounds"));
    let output = Command::new(bin)
        .current_dir(&test_dir)
        .output()
        .expect("failed to execute command");
    assert_success(&output, &[]);

    assert_eq!(read_fragment(&test_dir).len(), 1);

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn two_rows_emit_nothing() {
    let test_dir = test_dir("two_rows_emit_nothing");
    fs::write(test_dir.join("counts.00001.txt"), "Time A\n0 5\n1e-5 7\n")
        .expect("failed to write seed file");
    fs::write(test_dir.join("counts.00002.txt"), "Time A\n0 3\n1e-5 9\n")
        .expect("failed to write seed file");

    assert_success(&run_bin(&test_dir, &[]), &[]);

    let means = fs::read_to_string(test_dir.join("means.dat")).expect("failed to read means");
    let stds = fs::read_to_string(test_dir.join("stds.dat")).expect("failed to read stds");
    assert_eq!(
        means.lines().collect::<Vec<_>>(),
        ["4.000000000000000000e+00", "8.000000000000000000e+00"]
    );
    assert_eq!(
        stds.lines().collect::<Vec<_>>(),
        ["1.000000000000000000e+00", "1.000000000000000000e+00"]
    );

    let fragment = fs::read_to_string(test_dir.join("test_description_partial.json"))
        .expect("failed to read fragment");
    assert!(fragment.is_empty());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn failures_exit_with_error() {
    let test_dir = test_dir("failures_exit_with_error");
    fs::write(test_dir.join("counts.00002.txt"), "Time A\n0 3\n")
        .expect("failed to write seed file");

    let output = run_bin(&test_dir, &["generate"]);
    assert!(!output.status.success(), "missing reference file must fail");

    write_seed(&test_dir, 1, 25);
    let output = run_bin(&test_dir, &["generate"]);
    assert!(!output.status.success(), "seed shape mismatch must fail");

    fs::remove_file(test_dir.join("counts.00002.txt")).expect("failed to remove seed file");
    assert_success(&run_bin(&test_dir, &["generate"]), &["generate"]);

    assert_success(&run_bin(&test_dir, &["check"]), &["check"]);

    let tight = r#"{
  "testType": "COUNT_MINMAX",
  "dataFile": "counts.txt",
  "haveHeader": true,
  "minTime": 0.0001,
  "maxTime": 0.0001,
  "countMinimum": [0, 0],
  "countMaximum": [0, 0]
},
"#;
    fs::write(test_dir.join("test_description_partial.json"), tight)
        .expect("failed to write fragment");
    let output = run_bin(&test_dir, &["check"]);
    assert!(!output.status.success(), "violated bounds must fail");

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn config_file_overrides_defaults() {
    let test_dir = test_dir("config_file_overrides_defaults");
    for seed in 1..=2 {
        write_seed(&test_dir, seed, 25);
    }

    let config_path = test_dir.join("bounds.toml");
    let config_contents = String::new()
        + "checkpoint_stride = 5\n"
        + "n_sigma = 2.0\n"
        + "data_file = \"counts_avg.txt\"\n";
    fs::write(&config_path, config_contents).expect("failed to write config file");

    let config_str = config_path
        .to_str()
        .expect("failed to convert config path to string");
    let args = ["--config", config_str, "generate"];
    assert_success(&run_bin(&test_dir, &args), &args);

    let checks = read_fragment(&test_dir);
    assert_eq!(checks.len(), 4);
    assert!(checks.iter().all(|check| check["dataFile"] == "counts_avg.txt"));

    fs::remove_dir_all(&test_dir).ok();
}
