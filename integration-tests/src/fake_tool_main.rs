use crate::{fake_icns, parse_fake_icns};
use std::{
    error::Error,
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn log_invocation(dir: &Path, tool: &str, args: &[String]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{}.log", tool)))?;
    file.write_all(format!("{}\n", args.join("\t")).as_bytes())
}

fn get_exit_status(dir: &Path, tool: &str) -> Result<i32> {
    let exit_status = std::fs::read_to_string(dir.join(format!("{}.exit-status", tool)))?
        .trim()
        .parse()?;
    Ok(exit_status)
}

fn copy_stderr(dir: &Path, tool: &str) -> std::io::Result<()> {
    let mut file = File::open(dir.join(format!("{}.stderr", tool)))?;
    std::io::copy(&mut file, &mut std::io::stderr())?;
    Ok(())
}

fn failing_pngs(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("oxipng.fail"))
        .map(|s| s.lines().map(|l| l.to_owned()).collect())
        .unwrap_or_default()
}

fn unpack(icns: &Path, iconset: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(icns)?;
    std::fs::create_dir(iconset)?;
    for (name, image) in parse_fake_icns(&contents) {
        std::fs::write(iconset.join(name), image)?;
    }
    Ok(())
}

fn repack(iconset: &Path, icns: &Path) -> Result<()> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(iconset)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let image = std::fs::read_to_string(entry.path())?;
        images.push((name, image));
    }
    images.sort();
    let images = images
        .iter()
        .map(|(name, image)| (name.as_str(), image.as_str()))
        .collect::<Vec<_>>();
    std::fs::write(icns, fake_icns(&images))?;
    Ok(())
}

fn recompress(dir: &Path, png: &Path) -> Result<()> {
    let name = png
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if failing_pngs(dir).contains(&name) {
        std::fs::write(png, "garbage")?;
        return Err(format!("{}: not a PNG file", name).into());
    }
    let image = std::fs::read_to_string(png)?;
    std::fs::write(png, image.replace('~', ""))?;
    Ok(())
}

/// Stands in for iconutil, oxipng or createicns depending on the name it was copied to.
///
/// Every invocation is appended to `<tool>.log` next to the executable. A
/// `<tool>.exit-status` file makes it exit with that status without doing anything, a
/// `<tool>.stderr` file is copied to stderr and `oxipng.fail` lists PNG file names the
/// fake oxipng should fail on.
pub fn fake_tool_main() {
    let exe = std::env::current_exe().unwrap();
    let dir = exe.parent().unwrap().to_owned();
    let tool = exe
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    let _ = log_invocation(&dir, &tool, &args);
    let _ = copy_stderr(&dir, &tool);
    let exit_status = get_exit_status(&dir, &tool).unwrap_or(0);
    if exit_status != 0 {
        std::process::exit(exit_status);
    }

    let str_args = args.iter().map(String::as_str).collect::<Vec<_>>();
    let result = match (tool.as_str(), str_args.as_slice()) {
        ("iconutil", ["-c", "iconset", icns, "-o", iconset]) => {
            unpack(Path::new(icns), Path::new(iconset))
        }
        ("iconutil", ["-c", "icns", iconset, "-o", icns]) => {
            repack(Path::new(iconset), Path::new(icns))
        }
        ("createicns", [iconset, icns]) => repack(Path::new(iconset), Path::new(icns)),
        ("oxipng", [.., png]) => recompress(&dir, Path::new(png)),
        _ => Err(format!("{}: unexpected arguments {:?}", tool, args).into()),
    };
    if let Err(error) = result {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}
