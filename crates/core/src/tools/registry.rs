//! Registry of resolved tool paths.
//!
//! The registry is built once, at the end of setup, and is read-only for
//! the rest of the run. There are no setters.

use std::collections::BTreeMap;
use std::path::Path;

use super::ToolPath;

/// The tools a build run needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    /// MSBuild.
    BuildTool,
    /// NuGet.
    RestoreTool,
    /// vswhere.
    Locator,
}

impl Tool {
    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BuildTool => "msbuild",
            Self::RestoreTool => "nuget",
            Self::Locator => "vswhere",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Final resolved paths of every tool, for the duration of one run.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<Tool, ToolPath>,
}

impl ToolRegistry {
    /// Record the resolved paths of all tools at once.
    #[must_use]
    pub fn new(build_tool: ToolPath, restore_tool: ToolPath, locator: ToolPath) -> Self {
        let tools = BTreeMap::from([
            (Tool::BuildTool, build_tool),
            (Tool::RestoreTool, restore_tool),
            (Tool::Locator, locator),
        ]);
        Self { tools }
    }

    /// Resolution state of `tool`.
    #[must_use]
    pub fn tool(&self, tool: Tool) -> &ToolPath {
        static UNRESOLVED: ToolPath = ToolPath(None);
        self.tools.get(&tool).unwrap_or(&UNRESOLVED)
    }

    /// Resolved path of `tool`, if any.
    #[must_use]
    pub fn get(&self, tool: Tool) -> Option<&Path> {
        self.tool(tool).path()
    }

    /// MSBuild.
    #[must_use]
    pub fn build_tool(&self) -> &ToolPath {
        self.tool(Tool::BuildTool)
    }

    /// NuGet.
    #[must_use]
    pub fn restore_tool(&self) -> &ToolPath {
        self.tool(Tool::RestoreTool)
    }

    /// vswhere.
    #[must_use]
    pub fn locator(&self) -> &ToolPath {
        self.tool(Tool::Locator)
    }

    /// Iterate over resolved tools.
    pub fn iter(&self) -> impl Iterator<Item = (Tool, &Path)> {
        self.tools
            .iter()
            .filter_map(|(tool, path)| path.path().map(|p| (*tool, p)))
    }

    /// Number of resolved tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no tool was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of resolved tools.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|(tool, _)| tool.name()).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
