use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sceneconfig::SceneConfig;
use tempfile::TempDir;

struct Sandbox {
    _root: TempDir,
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config_dir = root.path().join("config");
        let data_dir = root.path().join("data");
        Self {
            _root: root,
            config_dir,
            data_dir,
        }
    }

    fn config_file(&self) -> PathBuf {
        self.config_dir.join("eventhorizon.toml")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_eventhorizon"))
            .env("EVENTHORIZON_CONFIG_DIR", &self.config_dir)
            .env("EVENTHORIZON_DATA_DIR", &self.data_dir)
            .env("RUST_LOG", "error")
            .args(args)
            .output()
            .expect("failed to run eventhorizon")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_config(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn config_where_reports_resolved_locations() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["config", "where"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains(&sandbox.config_file().display().to_string()));
    assert!(text.contains("missing, using defaults"));
    assert!(text.contains("ambient-space.mp3"));
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let sandbox = Sandbox::new();

    let first = sandbox.run(&["config", "init"]);
    assert!(first.status.success());
    assert!(sandbox.config_file().exists());

    let second = sandbox.run(&["config", "init"]);
    assert!(!second.status.success());

    fs::write(sandbox.config_file(), "# edited\n").unwrap();
    let forced = sandbox.run(&["config", "init", "--force"]);
    assert!(forced.status.success());

    let contents = fs::read_to_string(sandbox.config_file()).unwrap();
    assert_eq!(SceneConfig::from_toml_str(&contents).unwrap(), SceneConfig::default());
}

#[test]
fn config_dump_prints_effective_scene() {
    let sandbox = Sandbox::new();
    write_config(
        &sandbox.config_file(),
        "[starfield]\ncount = 64\nseed = 9\n\n[black_hole]\nsize = 1.5\n",
    );

    let output = sandbox.run(&["config", "dump"]);
    assert!(output.status.success());

    let dumped = SceneConfig::from_toml_str(&stdout(&output)).unwrap();
    assert_eq!(dumped.starfield.count, 64);
    assert_eq!(dumped.starfield.seed, Some(9));
    assert_eq!(dumped.black_hole.size, 1.5);
}

#[test]
fn config_dump_honours_explicit_path() {
    let sandbox = Sandbox::new();
    let custom = sandbox.config_dir.join("custom.toml");
    write_config(&custom, "[shells]\ncount = 2\n");

    let output = sandbox.run(&["config", "dump", "--config", custom.to_str().unwrap()]);
    assert!(output.status.success());
    let dumped = SceneConfig::from_toml_str(&stdout(&output)).unwrap();
    assert_eq!(dumped.shells.count, 2);
}

#[test]
fn invalid_config_is_rejected() {
    let sandbox = Sandbox::new();
    write_config(&sandbox.config_file(), "[black_hole]\nsize = -3.0\n");

    let output = sandbox.run(&["config", "dump"]);
    assert!(!output.status.success());
}

#[test]
fn probe_json_reports_support_flag() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["probe", "--json"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(report["supported"].is_boolean());
    assert!(report["software"].is_boolean());
}
