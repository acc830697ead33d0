use crate::new_workdir;
use icnsoptim_core::{
    config::{Config, PngFailurePolicy, ToolsConfig},
    pipeline::{Error, Optimizer, ToolFailure},
    tools::Packer,
};
use integration_tests::{optimized, Workdir, TEN_IMAGES};

fn config(workdir: &Workdir) -> Config {
    Config {
        jobs: 4,
        temp_dir: Some(workdir.temp_dir()),
        tools: ToolsConfig {
            iconutil: Some(workdir.tool("iconutil")),
            oxipng: Some(workdir.tool("oxipng")),
            createicns: Some(workdir.tool("createicns")),
        },
        ..Default::default()
    }
}

fn optimizer(workdir: &Workdir) -> Optimizer {
    Optimizer::new(&config(workdir)).unwrap()
}

#[tokio::test]
async fn should_optimize_all_images_in_icon() {
    let workdir = new_workdir();
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    let report = optimizer(&workdir).optimize_icon(&icon).await.unwrap();

    assert!(report.replaced);
    assert_eq!(report.pngs, 10);
    assert!(report.png_failures.is_empty());
    assert!(report.optimized_size < report.original_size);
    assert_eq!(workdir.read_icon(&icon), optimized(TEN_IMAGES));
    workdir.assert_no_working_dirs();
}

#[tokio::test]
async fn should_call_tools_with_expected_arguments() {
    let workdir = new_workdir();
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    optimizer(&workdir).optimize_icon(&icon).await.unwrap();

    let iconutil = workdir.invocations("iconutil");
    assert_eq!(iconutil.len(), 2);
    assert_eq!(&iconutil[0][..2], ["-c", "iconset"]);
    assert!(iconutil[0][2].ends_with("app.icns"));
    assert_eq!(iconutil[0][3], "-o");
    assert!(iconutil[0][4].ends_with("app.iconset"));
    assert_eq!(&iconutil[1][..2], ["-c", "icns"]);
    assert!(iconutil[1][2].ends_with("app.iconset"));
    assert!(iconutil[1][4].ends_with("app.icns"));

    let oxipng = workdir.invocations("oxipng");
    assert_eq!(oxipng.len(), 10);
    for args in &oxipng {
        assert_eq!(&args[..args.len() - 1], ["-o", "max", "--strip", "safe"]);
        assert!(args[args.len() - 1].ends_with(".png"));
    }
    assert!(workdir.invocations("createicns").is_empty());
}

#[tokio::test]
async fn should_fail_with_tool_stderr_when_unpacking_fails() {
    let workdir = new_workdir()
        .with_exit_status("iconutil", 1)
        .with_stderr("iconutil", "Invalid Iconset.");
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    let error = optimizer(&workdir).optimize_icon(&icon).await.unwrap_err();

    match error {
        Error::UnpackFailed { failure, .. } => {
            assert_eq!(failure.to_string(), "exited with error status 1: Invalid Iconset.")
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(workdir.read_icon(&icon).len(), 10);
    assert!(workdir.invocations("oxipng").is_empty());
    workdir.assert_no_working_dirs();
}

#[tokio::test]
async fn should_keep_png_that_failed_to_recompress() {
    let workdir = new_workdir().with_failing_png("icon_32x32.png");
    let icon = workdir.icon("app.icns", TEN_IMAGES);

    let report = optimizer(&workdir).optimize_icon(&icon).await.unwrap();

    assert_eq!(report.png_failures.len(), 1);
    assert!(report.png_failures[0].path.ends_with("icon_32x32.png"));
    let images = workdir.read_icon(&icon);
    let failed = images
        .iter()
        .find(|(name, _)| name == "icon_32x32.png")
        .unwrap();
    assert_eq!(failed.1, "32px~~~~");
    assert_eq!(
        images
            .iter()
            .filter(|(_, contents)| !contents.contains('~'))
            .count(),
        9
    );
}

#[tokio::test]
async fn should_leave_icon_alone_when_aborting_on_png_failure() {
    let workdir = new_workdir().with_failing_png("icon_256x256.png");
    let icon = workdir.icon("app.icns", TEN_IMAGES);
    let optimizer = Optimizer::new(&Config {
        png_failure: PngFailurePolicy::Abort,
        ..config(&workdir)
    })
    .unwrap();

    let error = optimizer.optimize_icon(&icon).await.unwrap_err();

    assert!(matches!(error, Error::PngRecompressFailed { ref path, .. } if path.ends_with("icon_256x256.png")));
    assert_eq!(
        std::fs::read_to_string(&icon).unwrap(),
        integration_tests::fake_icns(TEN_IMAGES)
    );
    assert!(workdir.invocations("iconutil").len() == 1);
    workdir.assert_no_working_dirs();
}

#[tokio::test]
async fn should_repack_with_createicns() {
    let workdir = new_workdir();
    let icon = workdir.icon("app.icns", TEN_IMAGES);
    let optimizer = Optimizer::new(&Config {
        packer: Packer::Createicns,
        ..config(&workdir)
    })
    .unwrap();

    optimizer.optimize_icon(&icon).await.unwrap();

    assert_eq!(workdir.invocations("iconutil").len(), 1);
    let createicns = workdir.invocations("createicns");
    assert_eq!(createicns.len(), 1);
    assert!(createicns[0][0].ends_with("app.iconset"));
    assert!(createicns[0][1].ends_with("app.icns"));
    assert_eq!(workdir.read_icon(&icon), optimized(TEN_IMAGES));
}

#[tokio::test]
async fn should_keep_original_when_repacking_fails() {
    let workdir = new_workdir()
        .with_exit_status("createicns", 2)
        .with_stderr("createicns", "out of cheese");
    let icon = workdir.icon("app.icns", TEN_IMAGES);
    let optimizer = Optimizer::new(&Config {
        packer: Packer::Createicns,
        ..config(&workdir)
    })
    .unwrap();

    let error = optimizer.optimize_icon(&icon).await.unwrap_err();

    assert!(matches!(
        error,
        Error::RepackFailed {
            packer: Packer::Createicns,
            failure: ToolFailure::Exit { .. }
        }
    ));
    assert_eq!(
        std::fs::read_to_string(&icon).unwrap(),
        integration_tests::fake_icns(TEN_IMAGES)
    );
    workdir.assert_no_working_dirs();
}

#[tokio::test]
async fn should_write_to_separate_destination() {
    let workdir = new_workdir();
    let icon = workdir.icon("app.icns", TEN_IMAGES);
    let destination = workdir.icons_dir().join("app-small.icns");

    let report = optimizer(&workdir)
        .optimize_icon_to(&icon, &destination)
        .await
        .unwrap();

    assert_eq!(report.destination, destination);
    assert_eq!(workdir.read_icon(&destination), optimized(TEN_IMAGES));
    assert_eq!(
        std::fs::read_to_string(&icon).unwrap(),
        integration_tests::fake_icns(TEN_IMAGES)
    );
}

#[tokio::test]
async fn should_optimize_icons_with_same_name_concurrently() {
    let workdir = new_workdir();
    let first = workdir.icon("app.icns", TEN_IMAGES);
    std::fs::create_dir(workdir.icons_dir().join("other")).unwrap();
    let second = workdir.icon("other/app.icns", &TEN_IMAGES[..4]);
    let optimizer = optimizer(&workdir);

    let (a, b) = tokio::join!(
        optimizer.optimize_icon(&first),
        optimizer.optimize_icon(&second)
    );

    assert_eq!(a.unwrap().pngs, 10);
    assert_eq!(b.unwrap().pngs, 4);
    assert_eq!(workdir.read_icon(&first), optimized(TEN_IMAGES));
    assert_eq!(workdir.read_icon(&second), optimized(&TEN_IMAGES[..4]));
    workdir.assert_no_working_dirs();
}

#[test]
fn should_fail_when_explicit_tool_is_missing() {
    let workdir = new_workdir();
    let mut config = config(&workdir);
    config.tools.oxipng = Some(workdir.tools_dir().join("no-such-oxipng"));

    let error = Optimizer::new(&config).unwrap_err();

    assert!(matches!(error, Error::ToolNotFound(_)));
    assert!(error.to_string().contains("oxipng"));
}
