use std::{
    fs::{File, Permissions},
    io,
    path::{Path, PathBuf},
};

/// Copies `from` over `destination` so that `destination` is either untouched or
/// completely replaced, never half-written.
///
/// The copy goes to a temporary file next to `destination` which is then renamed over it.
pub(super) async fn replace_file(
    from: &Path,
    destination: &Path,
    permissions: Option<Permissions>,
) -> io::Result<()> {
    let from = from.to_owned();
    let destination = destination.to_owned();
    tokio::task::spawn_blocking(move || replace_file_blocking(&from, &destination, permissions))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

fn replace_file_blocking(
    from: &Path,
    destination: &Path,
    permissions: Option<Permissions>,
) -> io::Result<()> {
    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".icnsoptim-")
        .suffix(".icns")
        .tempfile_in(dir)?;
    let mut source = File::open(from)?;
    io::copy(&mut source, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(destination)?;
    Ok(())
}

/// Whether two paths name the same file, falling back to comparing the paths as given
/// when either can't be resolved.
pub(super) fn is_same_file(a: &Path, b: &Path) -> bool {
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn canonical(path: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(path).ok()
}
