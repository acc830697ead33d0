use std::path::{Path, PathBuf};

mod fake_tool_main;
pub use fake_tool_main::fake_tool_main;

/// Icons handled by the fake tools are text files of `name:contents` lines, one per
/// image. The fake oxipng strips `~` characters from an image, so an image's "pixels" are
/// whatever is left after removing them.
pub fn fake_icns(images: &[(&str, &str)]) -> String {
    images
        .iter()
        .map(|(name, contents)| format!("{}:{}\n", name, contents))
        .collect()
}

pub fn parse_fake_icns(s: &str) -> Vec<(String, String)> {
    s.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, contents)| (name.to_owned(), contents.to_owned()))
        .collect()
}

/// The images of an icon after the fake oxipng got to all of them, in iconset order.
pub fn optimized(images: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut images = images
        .iter()
        .map(|(name, contents)| (name.to_string(), contents.replace('~', "")))
        .collect::<Vec<_>>();
    images.sort();
    images
}

pub const TEN_IMAGES: &[(&str, &str)] = &[
    ("icon_16x16.png", "16px~~~~~~"),
    ("icon_16x16@2x.png", "32px~~~~~~~~"),
    ("icon_32x32.png", "32px~~~~"),
    ("icon_32x32@2x.png", "64px~~~~~~~~~~"),
    ("icon_128x128.png", "128px~~~~~~"),
    ("icon_128x128@2x.png", "256px~~~"),
    ("icon_256x256.png", "256px~~~~~~~~"),
    ("icon_256x256@2x.png", "512px~~~~~"),
    ("icon_512x512.png", "512px~~~~~~~"),
    ("icon_512x512@2x.png", "1024px~~~~~~~~~~"),
];

fn exe_name(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

/// A scratch directory with fake tools, room for icons, and a temp directory for the
/// optimizer's working directories.
pub struct Workdir {
    dir: tempfile::TempDir,
}

impl Workdir {
    pub const TOOLS: &'static [&'static str] = &["iconutil", "oxipng", "createicns"];

    pub fn new(fake_tool: impl AsRef<Path>) -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let workdir = Workdir { dir };
        std::fs::create_dir(workdir.tools_dir()).unwrap();
        std::fs::create_dir(workdir.icons_dir()).unwrap();
        std::fs::create_dir(workdir.temp_dir()).unwrap();
        for tool in Self::TOOLS {
            // copied rather than linked, the fake tool looks at its own file name
            std::fs::copy(fake_tool.as_ref(), workdir.tool(tool)).unwrap();
        }
        workdir
    }

    pub fn with_exit_status(self, tool: &str, exit_status: i32) -> Self {
        std::fs::write(
            self.tools_dir().join(format!("{}.exit-status", tool)),
            exit_status.to_string(),
        )
        .unwrap();
        self
    }

    pub fn with_stderr(self, tool: &str, stderr: impl AsRef<[u8]>) -> Self {
        std::fs::write(
            self.tools_dir().join(format!("{}.stderr", tool)),
            stderr.as_ref(),
        )
        .unwrap();
        self
    }

    pub fn with_failing_png(self, name: &str) -> Self {
        let path = self.tools_dir().join("oxipng.fail");
        let mut names = std::fs::read_to_string(&path).unwrap_or_default();
        names.push_str(name);
        names.push('\n');
        std::fs::write(path, names).unwrap();
        self
    }

    pub fn icon(&self, name: &str, images: &[(&str, &str)]) -> PathBuf {
        let path = self.icons_dir().join(name);
        std::fs::write(&path, fake_icns(images)).unwrap();
        path
    }

    pub fn read_icon(&self, path: &Path) -> Vec<(String, String)> {
        parse_fake_icns(&std::fs::read_to_string(path).unwrap())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.path().join("tools")
    }

    pub fn icons_dir(&self) -> PathBuf {
        self.path().join("icons")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.path().join("tmp")
    }

    pub fn tool(&self, tool: &str) -> PathBuf {
        self.tools_dir().join(exe_name(tool))
    }

    /// Arguments of every invocation of `tool`, in the order they happened.
    pub fn invocations(&self, tool: &str) -> Vec<Vec<String>> {
        std::fs::read_to_string(self.tools_dir().join(format!("{}.log", tool)))
            .unwrap_or_default()
            .lines()
            .map(|line| line.split('\t').map(|s| s.to_owned()).collect())
            .collect()
    }

    pub fn assert_no_working_dirs(&self) -> &Self {
        let leftovers = std::fs::read_dir(self.temp_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect::<Vec<_>>();
        assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
        self
    }
}
