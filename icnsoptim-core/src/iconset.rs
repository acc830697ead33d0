use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Resolution encoded in a standard iconset file name such as `icon_16x16@2x.png`.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct IconSize {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

impl IconSize {
    pub fn from_file_name(name: &str) -> Option<IconSize> {
        let dims = name.strip_prefix("icon_")?.strip_suffix(".png")?;
        let (dims, scale) = match dims.split_once('@') {
            Some((dims, scale)) => (dims, scale.strip_suffix('x')?.parse().ok()?),
            None => (dims, 1),
        };
        let (width, height) = dims.split_once('x')?;
        Some(IconSize {
            width: width.parse().ok()?,
            height: height.parse().ok()?,
            scale,
        })
    }
}

impl fmt::Display for IconSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if self.scale != 1 {
            write!(f, "@{}x", self.scale)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IconsetEntry {
    pub path: PathBuf,
    /// `None` if the file name doesn't follow the iconset naming convention
    pub size: Option<IconSize>,
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

/// Lists the PNG files directly inside an iconset directory, sorted by path.
pub async fn entries(iconset: &Path) -> std::io::Result<Vec<IconsetEntry>> {
    let mut dir = tokio::fs::read_dir(iconset).await?;
    let mut entries = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || !is_png(&path) {
            continue;
        }
        let size = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(IconSize::from_file_name);
        if size.is_none() {
            tracing::debug!(path = %path.display(), "unusual file name in iconset");
        }
        entries.push(IconsetEntry { path, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}
