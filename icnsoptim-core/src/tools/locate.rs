use super::{Packer, Tool};
use crate::config::ToolsConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
#[error("could not find {tool} (looked in {})", display_paths(.searched))]
pub struct NotFound {
    pub tool: Tool,
    pub searched: Vec<PathBuf>,
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "no locations".to_owned();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn exe_name(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

fn current_exe_dir() -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    Some(dir.to_owned())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Finds tool executables on the search path, next to the running program, or in
/// well-known system locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    search_path: Vec<PathBuf>,
    bundle_dirs: Vec<PathBuf>,
}

impl Locator {
    pub fn new(search_path: Vec<PathBuf>, bundle_dirs: Vec<PathBuf>) -> Self {
        Locator {
            search_path,
            bundle_dirs,
        }
    }

    /// Uses `PATH` and the directory of the current executable, plus the `Resources`
    /// directory next to it when running from inside an app bundle.
    pub fn from_env() -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        let bundle_dirs = current_exe_dir()
            .map(|dir| vec![dir.clone(), dir.join("..").join("Resources")])
            .unwrap_or_default();
        Locator::new(search_path, bundle_dirs)
    }

    fn system_locations(tool: Tool) -> &'static [&'static str] {
        match tool {
            Tool::Iconutil => &["/usr/bin/iconutil"],
            Tool::Oxipng | Tool::Createicns => &[],
        }
    }

    /// An explicit path wins and is never second-guessed: if it doesn't point at an
    /// executable, the tool is not found.
    pub fn locate(&self, tool: Tool, explicit: Option<&Path>) -> Result<PathBuf, NotFound> {
        if let Some(path) = explicit {
            return if is_executable(path) {
                Ok(path.to_owned())
            } else {
                Err(NotFound {
                    tool,
                    searched: vec![path.to_owned()],
                })
            };
        }

        let name = exe_name(tool.binary_name());
        let candidates = self
            .search_path
            .iter()
            .chain(self.bundle_dirs.iter())
            .map(|dir| dir.join(&name))
            .chain(Self::system_locations(tool).iter().map(PathBuf::from))
            .collect::<Vec<_>>();

        match candidates.iter().find(|p| is_executable(p)) {
            Some(found) => {
                tracing::debug!(%tool, path = %found.display(), "found tool");
                Ok(found.clone())
            }
            None => Err(NotFound {
                tool,
                searched: candidates,
            }),
        }
    }
}

/// Locations of every tool one optimizer run will call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    iconutil: PathBuf,
    oxipng: PathBuf,
    packer: Packer,
    packer_path: PathBuf,
}

impl Tools {
    pub fn new(
        iconutil: impl Into<PathBuf>,
        oxipng: impl Into<PathBuf>,
        packer: Packer,
        packer_path: impl Into<PathBuf>,
    ) -> Self {
        Tools {
            iconutil: iconutil.into(),
            oxipng: oxipng.into(),
            packer,
            packer_path: packer_path.into(),
        }
    }

    pub fn resolve(config: &ToolsConfig, packer: Packer) -> Result<Tools, NotFound> {
        Self::resolve_with(&Locator::from_env(), config, packer)
    }

    pub fn resolve_with(
        locator: &Locator,
        config: &ToolsConfig,
        packer: Packer,
    ) -> Result<Tools, NotFound> {
        let iconutil = locator.locate(Tool::Iconutil, config.iconutil.as_deref())?;
        let oxipng = locator.locate(Tool::Oxipng, config.oxipng.as_deref())?;
        let packer_path = match packer {
            Packer::Iconutil => iconutil.clone(),
            Packer::Createicns => {
                locator.locate(Tool::Createicns, config.createicns.as_deref())?
            }
        };
        Ok(Tools {
            iconutil,
            oxipng,
            packer,
            packer_path,
        })
    }

    pub fn iconutil(&self) -> &Path {
        &self.iconutil
    }

    pub fn oxipng(&self) -> &Path {
        &self.oxipng
    }

    pub fn packer(&self) -> Packer {
        self.packer
    }

    pub fn packer_path(&self) -> &Path {
        &self.packer_path
    }
}
