use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// One icns file being optimized, together with the working directory that holds its
/// unpacked iconset and the repacked result.
///
/// The working directory is removed when the bundle is dropped, so every way out of a
/// run cleans up after itself. [`IconBundle::close`] removes it explicitly and reports
/// errors doing so.
#[derive(Debug)]
pub struct IconBundle {
    source_path: PathBuf,
    working_dir: tempfile::TempDir,
    iconset_path: PathBuf,
    output_path: PathBuf,
}

impl IconBundle {
    pub fn new(source_path: &Path, temp_base: &Path) -> std::io::Result<IconBundle> {
        let working_dir = tempfile::Builder::new()
            .prefix("icnsoptim-")
            .tempdir_in(temp_base)?;
        let stem = source_path
            .file_stem()
            .map(|s| s.to_owned())
            .unwrap_or_else(|| OsString::from("icon"));
        let iconset_path = working_dir.path().join(with_extension(&stem, "iconset"));
        let output_path = working_dir.path().join(with_extension(&stem, "icns"));
        Ok(IconBundle {
            source_path: source_path.to_owned(),
            working_dir,
            iconset_path,
            output_path,
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn working_dir(&self) -> &Path {
        self.working_dir.path()
    }

    pub fn iconset_path(&self) -> &Path {
        &self.iconset_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn close(self) -> std::io::Result<()> {
        self.working_dir.close()
    }
}

// `Path::with_extension` would swallow dots in the stem, e.g. `app.v2`
fn with_extension(stem: &std::ffi::OsStr, extension: &str) -> OsString {
    let mut name = stem.to_owned();
    name.push(".");
    name.push(extension);
    name
}
