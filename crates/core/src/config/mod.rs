//! Build configuration discovered once at startup.
//!
//! [`BuildConfiguration`] is the immutable context every component and task
//! receives by reference. It is assembled from command-line options plus a
//! scan of the working directory.

use crate::paths::{self, BIN_EXCLUDES, OBJ_EXCLUDES};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the tools-cache directory under the working directory.
pub const TOOLS_DIR_NAME: &str = "tools";

/// Default build configuration name.
pub const DEFAULT_CONFIGURATION: &str = "Release";

/// Explicit tool locations supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOverrides {
    /// MSBuild executable.
    pub build_tool: Option<PathBuf>,
    /// NuGet executable.
    pub restore_tool: Option<PathBuf>,
    /// vswhere executable.
    pub locator_tool: Option<PathBuf>,
}

/// Options taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build configuration name (`Release`, `Debug`, ...).
    pub configuration: String,
    /// Tool overrides.
    pub overrides: ToolOverrides,
    /// Pass the MSBuild directory to the restore tool.
    pub use_build_tool_for_restore: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            configuration: DEFAULT_CONFIGURATION.to_string(),
            overrides: ToolOverrides::default(),
            use_build_tool_for_restore: false,
        }
    }
}

/// Immutable description of the build being orchestrated.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    working_dir: PathBuf,
    solution: PathBuf,
    test_project: PathBuf,
    bin_paths: Vec<PathBuf>,
    obj_paths: Vec<PathBuf>,
    configuration: String,
    tools_dir: PathBuf,
    overrides: ToolOverrides,
    use_build_tool_for_restore: bool,
}

impl BuildConfiguration {
    /// Scan `working_dir` and combine the findings with `options`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the working directory is missing, or
    /// if no `*.sln` file or no `*Test.csproj` file can be found.
    pub fn discover(working_dir: &Path, options: BuildOptions) -> Result<Self> {
        if !working_dir.is_dir() {
            return Err(Error::configuration(format!(
                "Working directory does not exist: {}",
                working_dir.display()
            )));
        }

        let solution = find_solution(working_dir)?;
        let test_project = find_test_project(working_dir)?;
        let (bins, objs) = find_output_dirs(working_dir);

        let bin_paths = paths::normalize_under(working_dir, &bins, BIN_EXCLUDES);
        let obj_paths = paths::normalize_under(working_dir, &objs, OBJ_EXCLUDES);

        debug!(
            solution = %solution.display(),
            test_project = %test_project.display(),
            bin_dirs = bin_paths.len(),
            obj_dirs = obj_paths.len(),
            "Discovered build layout"
        );

        let overrides = ToolOverrides {
            build_tool: absolutize(working_dir, options.overrides.build_tool),
            restore_tool: absolutize(working_dir, options.overrides.restore_tool),
            locator_tool: absolutize(working_dir, options.overrides.locator_tool),
        };

        Ok(Self {
            working_dir: working_dir.to_path_buf(),
            solution,
            test_project,
            bin_paths,
            obj_paths,
            configuration: options.configuration,
            tools_dir: working_dir.join(TOOLS_DIR_NAME),
            overrides,
            use_build_tool_for_restore: options.use_build_tool_for_restore,
        })
    }

    /// Working directory all other paths are rooted in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The solution file.
    #[must_use]
    pub fn solution(&self) -> &Path {
        &self.solution
    }

    /// The test project file.
    #[must_use]
    pub fn test_project(&self) -> &Path {
        &self.test_project
    }

    /// Binary-output directories to clean, in discovery order.
    #[must_use]
    pub fn bin_paths(&self) -> &[PathBuf] {
        &self.bin_paths
    }

    /// Intermediate-output directories to clean, in discovery order.
    #[must_use]
    pub fn obj_paths(&self) -> &[PathBuf] {
        &self.obj_paths
    }

    /// Build configuration name.
    #[must_use]
    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// Whether this is a `Release` build.
    #[must_use]
    pub fn is_release(&self) -> bool {
        self.configuration == DEFAULT_CONFIGURATION
    }

    /// Tools-cache root.
    #[must_use]
    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    /// User-supplied tool locations.
    #[must_use]
    pub fn overrides(&self) -> &ToolOverrides {
        &self.overrides
    }

    /// Whether restore should be pointed at the resolved MSBuild.
    #[must_use]
    pub fn use_build_tool_for_restore(&self) -> bool {
        self.use_build_tool_for_restore
    }
}

fn absolutize(root: &Path, path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty()).map(|p| {
        if p.is_absolute() {
            p
        } else {
            root.join(p)
        }
    })
}

/// First `*.sln` directly inside `root`, by file name.
fn find_solution(root: &Path) -> Result<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "sln")
        })
        .map(walkdir::DirEntry::into_path)
        .ok_or_else(|| {
            Error::configuration_with_help(
                format!("No solution file (*.sln) found in {}", root.display()),
                "Run from a directory whose parent contains the solution, or pass --working",
            )
        })
}

/// First `*Test.csproj` anywhere under `root`.
fn find_test_project(root: &Path) -> Result<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with("Test.csproj"))
        })
        .map(walkdir::DirEntry::into_path)
        .ok_or_else(|| {
            Error::configuration(format!(
                "No test project (*Test.csproj) found under {}",
                root.display()
            ))
        })
}

/// All `bin` and `obj` directories under `root`, nested ones included.
fn find_output_dirs(root: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut bins = Vec::new();
    let mut objs = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_dir())
    {
        match entry.file_name().to_str() {
            Some("bin") => bins.push(entry.into_path()),
            Some("obj") => objs.push(entry.into_path()),
            _ => {}
        }
    }

    (bins, objs)
}
