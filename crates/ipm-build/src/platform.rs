//! Target platforms and the static per-platform table.
//!
//! Every value that differs between Windows and Linux is looked up here or
//! through [`PerPlatform`], never through string keys.

use crate::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
}

const WINDOWS_LIBS: &[&str] = &[
    "mingw32", "SDL2main", "SDL2", "SDL2_image", "m", "glu32", "opengl32", "User32", "Gdi32",
    "Shell32", "glew32", "isolate",
];

const LINUX_LIBS: &[&str] = &[
    "SDL2main", "SDL2", "SDL2_image", "m", "GL", "GLU", "GLEW", "isolate",
];

// Relative to the isolate root.
const INCLUDE_DIRS: &[&[&str]] = &[
    &["src"],
    &["vendor", "GLEW", "include"],
    &["vendor", "SDL2_64bit", "include"],
];

// Relative to the isolate root, followed by the platform's output dir name.
const LIB_DIRS: &[&[&str]] = &[
    &["vendor", "GLEW", "lib"],
    &["vendor", "SDL2_64bit", "lib"],
    &["bin"],
];

const SHARED_LIB_DIRS: &[&[&str]] = &[
    &["vendor", "GLEW", "bin"],
    &["vendor", "SDL2_64bit", "bin"],
    &["bin"],
];

impl Platform {
    /// The platform this binary was compiled for, if supported.
    pub fn host() -> Option<Self> {
        if cfg!(windows) {
            Some(Platform::Windows)
        } else if cfg!(target_os = "linux") {
            Some(Platform::Linux)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }

    pub fn separator(self) -> char {
        match self {
            Platform::Windows => '\\',
            Platform::Linux => '/',
        }
    }

    /// Subdirectory of `bin/` that receives this platform's build output.
    pub fn out_dir_name(self) -> &'static str {
        match self {
            Platform::Windows => "win",
            Platform::Linux => "linux",
        }
    }

    /// File extension of shared runtime libraries (without the dot).
    pub fn shared_lib_extension(self) -> &'static str {
        match self {
            Platform::Windows => "dll",
            Platform::Linux => "so",
        }
    }

    /// Default output binary name for a project.
    pub fn executable_name(self, project_name: &str) -> String {
        match self {
            Platform::Windows => format!("{}.exe", project_name),
            Platform::Linux => project_name.to_string(),
        }
    }

    /// Build the descriptor for this platform, with every directory rooted at
    /// `isolate_root`. The root may use either separator style.
    pub fn descriptor(self, isolate_root: &str) -> PlatformDescriptor {
        let libs = match self {
            Platform::Windows => WINDOWS_LIBS,
            Platform::Linux => LINUX_LIBS,
        };

        PlatformDescriptor {
            libs: libs.iter().map(|s| s.to_string()).collect(),
            include_dirs: self.isolate_dirs(isolate_root, INCLUDE_DIRS, None),
            lib_dirs: self.isolate_dirs(isolate_root, LIB_DIRS, Some(self.out_dir_name())),
            shared_lib_dirs: self.isolate_dirs(
                isolate_root,
                SHARED_LIB_DIRS,
                Some(self.out_dir_name()),
            ),
        }
    }

    /// `<root><sep><parts...>[<sep><suffix>]<sep>` for every entry of `table`.
    fn isolate_dirs(self, root: &str, table: &[&[&str]], suffix: Option<&str>) -> Vec<String> {
        let sep = self.separator();
        let root = normalize_separators(root, sep);

        table
            .iter()
            .map(|parts| {
                let mut path = root.clone();
                for part in parts.iter().copied().chain(suffix) {
                    path.push(sep);
                    path.push_str(part);
                }
                path.push(sep);
                path
            })
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            other => Err(BuildError::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// The `platform` setting of a config: a fixed target or the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformSelector {
    #[default]
    Auto,
    Fixed(Platform),
}

impl PlatformSelector {
    pub fn resolve(self, host: Platform) -> Platform {
        match self {
            PlatformSelector::Auto => host,
            PlatformSelector::Fixed(platform) => platform,
        }
    }
}

impl FromStr for PlatformSelector {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(PlatformSelector::Auto),
            other => other.parse().map(PlatformSelector::Fixed),
        }
    }
}

/// Library and directory defaults for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    /// System and vendor libraries, in link order.
    pub libs: Vec<String>,
    pub include_dirs: Vec<String>,
    pub lib_dirs: Vec<String>,
    /// Directories whose shared libraries are staged next to the binary.
    pub shared_lib_dirs: Vec<String>,
}

/// A value keyed by platform, as found in the config file
/// (`{"windows": ..., "linux": ...}`). Either entry may be absent; asking for
/// an absent entry is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPlatform<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux: Option<T>,
}

impl<T> PerPlatform<T> {
    /// Build a fully populated map from a function of the platform.
    pub fn from_fn(mut f: impl FnMut(Platform) -> T) -> Self {
        Self {
            windows: Some(f(Platform::Windows)),
            linux: Some(f(Platform::Linux)),
        }
    }

    pub fn get(&self, platform: Platform) -> Option<&T> {
        match platform {
            Platform::Windows => self.windows.as_ref(),
            Platform::Linux => self.linux.as_ref(),
        }
    }

    /// Look up `platform`, naming the config `key` in the error.
    pub fn require(&self, key: &'static str, platform: Platform) -> Result<&T> {
        self.get(platform)
            .ok_or_else(|| BuildError::MissingPlatformEntry {
                key,
                platform: platform.to_string(),
            })
    }
}

/// Replace every `/` and `\` with `sep`, dropping trailing separators.
pub fn normalize_separators(path: &str, sep: char) -> String {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !path.is_empty() {
        return sep.to_string();
    }
    trimmed
        .chars()
        .map(|c| if c == '/' || c == '\\' { sep } else { c })
        .collect()
}
