use crate::new_workdir;
use assert_cmd::Command;
use icnsoptim_core::{config::Config, tools::Packer};
use integration_tests::{fake_icns, optimized, Workdir, TEN_IMAGES};
use std::path::PathBuf;

fn icnsoptim(workdir: &Workdir, config: &str) -> Command {
    let config_file = workdir.path().join("config.toml");
    std::fs::write(&config_file, config).unwrap();
    let mut cmd = Command::cargo_bin("test-icnsoptim").unwrap();
    cmd.env_remove("ICNSOPTIM_CONFIG_FILE")
        .arg("--config-file")
        .arg(config_file);
    cmd
}

#[test]
fn should_print_version() {
    Command::cargo_bin("test-icnsoptim")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
}

#[test]
fn should_require_input_files() {
    Command::cargo_bin("test-icnsoptim")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn should_print_effective_config() {
    let workdir = new_workdir();

    let output = icnsoptim(
        &workdir,
        //language=TOML
        r#"
        jobs = 3

        [tools]
        oxipng = "/opt/oxipng"
        "#,
    )
    .args(["--packer", "createicns", "--print-config"])
    .output()
    .unwrap();

    assert!(output.status.success());
    let printed = Config::parse(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!(printed.packer, Packer::Createicns);
    assert_eq!(printed.jobs, 3);
    assert_eq!(printed.tools.oxipng, Some(PathBuf::from("/opt/oxipng")));
    assert_eq!(printed.tools.iconutil, None);
}

#[test]
fn should_fail_for_invalid_config_file() {
    let workdir = new_workdir();

    icnsoptim(&workdir, "jobs = \"many\"")
        .arg("--print-config")
        .assert()
        .failure();
}

#[test]
fn should_fail_when_explicit_tool_is_missing() {
    let workdir = new_workdir();
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    icnsoptim(&workdir, "")
        .arg("--iconutil")
        .arg(workdir.tools_dir().join("no-iconutil"))
        .arg(&icon)
        .assert()
        .failure();

    assert_eq!(std::fs::read_to_string(&icon).unwrap(), fake_icns(TEN_IMAGES));
}

#[test]
fn should_refuse_output_path_for_several_inputs() {
    let workdir = new_workdir();

    icnsoptim(&workdir, "")
        .arg("--output")
        .arg(workdir.path().join("out.icns"))
        .args(["a.icns", "b.icns"])
        .assert()
        .failure();
}

#[test]
fn should_optimize_icon_and_print_summary() {
    let workdir = new_workdir();
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    let output = icnsoptim(
        &workdir,
        &format!("temp-dir = {:?}\n", workdir.temp_dir().to_string_lossy()),
    )
    .arg("--iconutil")
    .arg(workdir.tool("iconutil"))
    .arg("--oxipng")
    .arg(workdir.tool("oxipng"))
    .arg(&icon)
    .output()
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("app.icns: "), "{}", stdout);
    assert!(stdout.contains("% smaller"), "{}", stdout);
    assert_eq!(workdir.read_icon(&icon), optimized(TEN_IMAGES));
    workdir.assert_no_working_dirs();
}

#[test]
fn should_exit_with_failure_when_an_icon_fails() {
    let workdir = new_workdir().with_exit_status("iconutil", 1);
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    icnsoptim(
        &workdir,
        &format!("temp-dir = {:?}\n", workdir.temp_dir().to_string_lossy()),
    )
    .arg("--iconutil")
    .arg(workdir.tool("iconutil"))
    .arg("--oxipng")
    .arg(workdir.tool("oxipng"))
    .arg(&icon)
    .assert()
    .code(1);

    assert_eq!(std::fs::read_to_string(&icon).unwrap(), fake_icns(TEN_IMAGES));
    workdir.assert_no_working_dirs();
}
