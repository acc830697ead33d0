use crate::new_workdir;
use clap::Parser as _;
use icnsoptim::cli::Cli;
use integration_tests::{fake_icns, optimized, Workdir, TEN_IMAGES};
use std::{ffi::OsString, path::PathBuf};

mod binary;

fn config_file(workdir: &Workdir) -> PathBuf {
    let path = workdir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            "jobs = 2\ntemp-dir = {:?}\n",
            workdir.temp_dir().to_string_lossy()
        ),
    )
    .unwrap();
    path
}

fn cli(workdir: &Workdir, args: &[OsString]) -> Cli {
    let mut argv: Vec<OsString> = vec![
        "icnsoptim".into(),
        "--config-file".into(),
        config_file(workdir).into(),
        "--iconutil".into(),
        workdir.tool("iconutil").into(),
        "--oxipng".into(),
        workdir.tool("oxipng").into(),
    ];
    argv.extend(args.iter().cloned());
    Cli::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn should_succeed_when_all_icons_are_optimized() {
    let workdir = new_workdir();
    let first = workdir.icon("first.icns", TEN_IMAGES);
    let second = workdir.icon("second.icns", &TEN_IMAGES[5..]);

    let ok = icnsoptim::run(cli(&workdir, &[first.clone().into(), second.clone().into()]))
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(workdir.read_icon(&first), optimized(TEN_IMAGES));
    assert_eq!(workdir.read_icon(&second), optimized(&TEN_IMAGES[5..]));
    workdir.assert_no_working_dirs();
}

#[tokio::test]
async fn should_continue_after_failed_icon() {
    let workdir = new_workdir();
    let broken = workdir.icons_dir().join("broken.png");
    std::fs::write(&broken, "not an icon").unwrap();
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    let ok = icnsoptim::run(cli(&workdir, &[broken.clone().into(), icon.clone().into()]))
        .await
        .unwrap();

    assert!(!ok);
    assert_eq!(std::fs::read_to_string(&broken).unwrap(), "not an icon");
    assert_eq!(workdir.read_icon(&icon), optimized(TEN_IMAGES));
}

#[tokio::test]
async fn should_write_output_file() {
    let workdir = new_workdir();
    let icon = workdir.icon("app.icns", TEN_IMAGES);
    let output = workdir.path().join("out.icns");

    let ok = icnsoptim::run(cli(
        &workdir,
        &["--output".into(), output.clone().into(), icon.clone().into()],
    ))
    .await
    .unwrap();

    assert!(ok);
    assert_eq!(workdir.read_icon(&output), optimized(TEN_IMAGES));
    assert_eq!(std::fs::read_to_string(&icon).unwrap(), fake_icns(TEN_IMAGES));
}

#[tokio::test]
async fn should_apply_png_failure_flag() {
    let workdir = new_workdir().with_failing_png("icon_16x16.png");
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    let ok = icnsoptim::run(cli(
        &workdir,
        &["--abort-on-png-failure".into(), icon.clone().into()],
    ))
    .await
    .unwrap();

    assert!(!ok);
    assert_eq!(std::fs::read_to_string(&icon).unwrap(), fake_icns(TEN_IMAGES));
    workdir.assert_no_working_dirs();
}
