//! Project configuration (`ipm_config.json` format).
//!
//! [`ProjectFile`] mirrors the JSON document. [`ProjectConfig`] is the same
//! project resolved for one target platform, with every path made absolute.

use crate::platform::{PerPlatform, Platform, PlatformSelector};
use crate::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// File name written by `init` and read by default by `build`/`run`.
pub const DEFAULT_CONFIG_NAME: &str = "ipm_config.json";

/// Keys that must be present in every config, checked in this order.
pub const REQUIRED_KEYS: &[&str] = &[
    "build_mode",
    "isolate_path",
    "out",
    "cc",
    "c_files",
    "c_flags",
    "include_path",
    "lib_path",
    "libs",
    "dll_path",
];

/// Build mode, selecting one preprocessor define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    pub fn define(self) -> &'static str {
        match self {
            BuildMode::Debug => "-DISO_BUILD_DEBUG",
            BuildMode::Release => "-DISO_BUILD_RELEASE",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Debug => f.write_str("debug"),
            BuildMode::Release => f.write_str("release"),
        }
    }
}

/// The isolate root: one path for every platform, or one per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IsolatePath {
    Shared(String),
    PerPlatform(PerPlatform<String>),
}

impl IsolatePath {
    pub fn require(&self, platform: Platform) -> Result<&str> {
        match self {
            IsolatePath::Shared(path) => Ok(path.as_str()),
            IsolatePath::PerPlatform(map) => map
                .require("isolate_path", platform)
                .map(String::as_str),
        }
    }
}

/// The config document as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// `auto`, `windows` or `linux`.
    #[serde(default = "default_platform")]
    pub platform: String,

    pub build_mode: BuildMode,

    pub isolate_path: IsolatePath,

    /// Compiler executable, also used as the linker driver.
    pub cc: String,

    /// Output binary name.
    pub out: PerPlatform<String>,

    /// Source files, relative to the project directory.
    pub c_files: Vec<String>,

    pub c_flags: PerPlatform<Vec<String>>,

    pub include_path: PerPlatform<Vec<String>>,

    pub lib_path: PerPlatform<Vec<String>>,

    pub libs: PerPlatform<Vec<String>>,

    /// Directories whose shared libraries are copied next to the binary.
    pub dll_path: PerPlatform<Vec<String>>,
}

fn default_platform() -> String {
    "auto".to_string()
}

impl ProjectFile {
    /// Load a config document from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BuildError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse a config document, reporting the first missing required key.
    pub fn from_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;

        if let Some(object) = value.as_object() {
            if let Some(key) = REQUIRED_KEYS.iter().find(|key| !object.contains_key(**key)) {
                return Err(BuildError::MissingKey(*key));
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// The default config for a new project depending on the isolate
    /// library found at `isolate_root`.
    pub fn default_for(project_name: &str, isolate_root: &str) -> Self {
        let windows = Platform::Windows.descriptor(isolate_root);
        let linux = Platform::Linux.descriptor(isolate_root);
        let table = |platform: Platform| match platform {
            Platform::Windows => &windows,
            Platform::Linux => &linux,
        };

        Self {
            platform: default_platform(),
            build_mode: BuildMode::Debug,
            isolate_path: IsolatePath::Shared(isolate_root.to_string()),
            cc: "gcc".to_string(),
            out: PerPlatform::from_fn(|p| p.executable_name(project_name)),
            c_files: Vec::new(),
            c_flags: PerPlatform::from_fn(|_| vec!["-Wl,-rpath=$ORIGIN".to_string()]),
            include_path: PerPlatform::from_fn(|p| table(p).include_dirs.clone()),
            lib_path: PerPlatform::from_fn(|p| table(p).lib_dirs.clone()),
            libs: PerPlatform::from_fn(|p| table(p).libs.clone()),
            dll_path: PerPlatform::from_fn(|p| table(p).shared_lib_dirs.clone()),
        }
    }

    /// Write the document as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json).map_err(|source| BuildError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A project resolved for a single target platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Directory containing the config file.
    pub project_dir: PathBuf,
    pub platform: Platform,
    pub build_mode: BuildMode,
    pub isolate_path: PathBuf,
    /// `<project_dir>/bin/<win|linux>`.
    pub out_dir: PathBuf,
    /// Full path of the linked binary.
    pub out: PathBuf,
    pub cc: String,
    pub c_files: Vec<PathBuf>,
    /// One object per source, same order.
    pub o_files: Vec<PathBuf>,
    /// Declared flags followed by the build mode define.
    pub c_flags: Vec<String>,
    pub include_path: Vec<PathBuf>,
    pub lib_path: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub dll_path: Vec<PathBuf>,
}

impl ProjectConfig {
    /// Load and resolve the config at `path`. `host` is the platform that
    /// `"platform": "auto"` stands for.
    pub fn load(path: &Path, host: Platform) -> Result<Self> {
        let file = ProjectFile::from_file(path)?;
        let path = absolute(path)?;
        let project_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(Component::RootDir.as_os_str()));

        Self::resolve(file, &project_dir, host)
    }

    /// Specialize `file` for its target platform, rooting relative paths at
    /// `project_dir`.
    pub fn resolve(file: ProjectFile, project_dir: &Path, host: Platform) -> Result<Self> {
        let platform = file.platform.parse::<PlatformSelector>()?.resolve(host);
        let rooted = |paths: &[String]| -> Vec<PathBuf> {
            paths.iter().map(|p| project_dir.join(p)).collect()
        };

        let out_dir = project_dir.join("bin").join(platform.out_dir_name());
        let out = out_dir.join(file.out.require("out", platform)?);

        let c_files = rooted(&file.c_files);
        let o_files = c_files.iter().map(|c| object_path(c)).collect();

        let mut c_flags = file.c_flags.require("c_flags", platform)?.clone();
        c_flags.push(file.build_mode.define().to_string());

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            platform,
            build_mode: file.build_mode,
            isolate_path: project_dir.join(file.isolate_path.require(platform)?),
            out_dir,
            out,
            cc: file.cc,
            c_files,
            o_files,
            c_flags,
            include_path: rooted(file.include_path.require("include_path", platform)?),
            lib_path: rooted(file.lib_path.require("lib_path", platform)?),
            libs: file.libs.require("libs", platform)?.clone(),
            dll_path: rooted(file.dll_path.require("dll_path", platform)?),
        })
    }

    /// Source/object pairs in declaration order.
    pub fn units(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.c_files
            .iter()
            .map(PathBuf::as_path)
            .zip(self.o_files.iter().map(PathBuf::as_path))
    }

    /// Location of the project's compile_commands.json.
    pub fn compile_commands_path(&self) -> PathBuf {
        self.project_dir.join(crate::COMPILE_COMMANDS_FILE)
    }
}

/// `<source>.o`, next to the source.
pub fn object_path(source: &Path) -> PathBuf {
    let mut object = source.as_os_str().to_owned();
    object.push(".o");
    PathBuf::from(object)
}

/// Make `path` absolute against the working directory and resolve `.` and
/// `..` lexically, so one project always yields the same paths.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| BuildError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        cwd.join(path)
    };

    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `pop` leaves the root in place, so `/..` stays `/`.
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROJECT: &str = r#"{
        "platform": "linux",
        "build_mode": "release",
        "isolate_path": "../isolate",
        "cc": "gcc",
        "out": {"windows": "game.exe", "linux": "game"},
        "c_files": ["src/main.c", "src/game.c"],
        "c_flags": {"windows": ["-g"], "linux": ["-Wall", "-O2"]},
        "include_path": {"windows": [], "linux": ["include", "/usr/include/SDL2"]},
        "lib_path": {"windows": [], "linux": ["lib"]},
        "libs": {"windows": ["m"], "linux": ["SDL2", "m"]},
        "dll_path": {"windows": [], "linux": ["vendor/bin"]}
    }"#;

    fn resolve_at(json: &str, host: Platform) -> Result<ProjectConfig> {
        ProjectConfig::resolve(ProjectFile::from_str(json)?, Path::new("/work/game"), host)
    }

    #[test]
    fn test_resolve_paths() {
        let config = resolve_at(PROJECT, Platform::Windows).unwrap();

        assert_eq!(config.platform, Platform::Linux);
        assert_eq!(config.out_dir, PathBuf::from("/work/game/bin/linux"));
        assert_eq!(config.out, PathBuf::from("/work/game/bin/linux/game"));
        assert_eq!(
            config.c_files,
            vec![
                PathBuf::from("/work/game/src/main.c"),
                PathBuf::from("/work/game/src/game.c"),
            ]
        );
        assert_eq!(
            config.o_files,
            vec![
                PathBuf::from("/work/game/src/main.c.o"),
                PathBuf::from("/work/game/src/game.c.o"),
            ]
        );
        // Absolute entries are kept as-is.
        assert_eq!(
            config.include_path,
            vec![
                PathBuf::from("/work/game/include"),
                PathBuf::from("/usr/include/SDL2"),
            ]
        );
        assert_eq!(config.dll_path, vec![PathBuf::from("/work/game/vendor/bin")]);
        assert_eq!(config.libs, vec!["SDL2", "m"]);
    }

    #[test]
    fn test_build_mode_define_appended() {
        let config = resolve_at(PROJECT, Platform::Linux).unwrap();
        assert_eq!(config.c_flags, vec!["-Wall", "-O2", "-DISO_BUILD_RELEASE"]);
        assert_eq!(config.build_mode.to_string(), "release");
        assert_eq!(config.isolate_path, PathBuf::from("/work/game/../isolate"));
    }

    #[test]
    fn test_auto_matches_explicit_platform() {
        let auto = PROJECT.replace(r#""platform": "linux""#, r#""platform": "auto""#);
        assert_eq!(
            resolve_at(&auto, Platform::Linux).unwrap(),
            resolve_at(PROJECT, Platform::Linux).unwrap()
        );

        let explicit_windows = PROJECT.replace(r#""platform": "linux""#, r#""platform": "windows""#);
        assert_eq!(
            resolve_at(&auto, Platform::Windows).unwrap(),
            resolve_at(&explicit_windows, Platform::Linux).unwrap()
        );
    }

    #[test]
    fn test_platform_defaults_to_auto() {
        let without = PROJECT.replace(r#""platform": "linux","#, "");
        let config = resolve_at(&without, Platform::Windows).unwrap();
        assert_eq!(config.platform, Platform::Windows);
        assert_eq!(config.out, PathBuf::from("/work/game/bin/win/game.exe"));
    }

    #[test]
    fn test_unsupported_platform() {
        let json = PROJECT.replace(r#""platform": "linux""#, r#""platform": "macos""#);
        let err = resolve_at(&json, Platform::Linux).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedPlatform(ref p) if p == "macos"));
    }

    #[test]
    fn test_missing_key() {
        let json = PROJECT.replace(r#""cc": "gcc","#, "");
        let err = ProjectFile::from_str(&json).unwrap_err();
        assert!(matches!(err, BuildError::MissingKey("cc")));
    }

    #[test]
    fn test_missing_platform_entry() {
        let json = PROJECT.replace(r#""out": {"windows": "game.exe", "linux": "game"}"#, r#""out": {"windows": "game.exe"}"#);
        let err = resolve_at(&json, Platform::Linux).unwrap_err();
        assert!(matches!(err, BuildError::MissingPlatformEntry { key: "out", .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = ProjectFile::from_str("{ \"cc\": ").unwrap_err();
        assert!(matches!(err, BuildError::ParseJson(_)));
    }

    #[test]
    fn test_isolate_path_per_platform() {
        let json = PROJECT.replace(
            r#""isolate_path": "../isolate""#,
            r#""isolate_path": {"windows": "C:/isolate", "linux": "/opt/isolate"}"#,
        );
        let config = resolve_at(&json, Platform::Linux).unwrap();
        assert_eq!(config.isolate_path, PathBuf::from("/opt/isolate"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_NAME);
        std::fs::write(&path, PROJECT).unwrap();

        let config = ProjectConfig::load(&path, Platform::Linux).unwrap();
        assert_eq!(config.project_dir, dir.path());
        assert_eq!(config.compile_commands_path(), dir.path().join("compile_commands.json"));
        assert_eq!(config.units().count(), 2);
    }

    #[test]
    fn test_load_through_parent_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("x")).unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), PROJECT).unwrap();

        let indirect = dir.path().join("x").join("..").join(DEFAULT_CONFIG_NAME);
        let config = ProjectConfig::load(&indirect, Platform::Linux).unwrap();

        assert_eq!(config.project_dir, dir.path());
        assert_eq!(config.c_files[0], dir.path().join("src/main.c"));
    }

    #[test]
    fn test_normalize_dots() {
        assert_eq!(normalize(Path::new("/work/x/../game/./a.c")), PathBuf::from("/work/game/a.c"));
        assert_eq!(normalize(Path::new("/../game")), PathBuf::from("/game"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ProjectConfig::load(&dir.path().join("nope.json"), Platform::Linux).unwrap_err();
        assert!(matches!(err, BuildError::ConfigNotFound(_)));
    }

    #[test]
    fn test_default_config_round_trips() {
        let file = ProjectFile::default_for("game", "../isolate");
        let json = serde_json::to_string(&file).unwrap();
        let parsed = ProjectFile::from_str(&json).unwrap();

        assert_eq!(parsed, file);
        assert_eq!(parsed.out.get(Platform::Windows).map(String::as_str), Some("game.exe"));
        assert_eq!(
            parsed.include_path.get(Platform::Windows).unwrap()[0],
            "..\\isolate\\src\\"
        );
    }
}
