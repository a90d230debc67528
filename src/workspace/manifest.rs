//! Declarative description of the workspace file tools
//!
//! Each capability maps to exactly one helper sub-command. Parameters are handed to
//! the helper untouched.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    List,
    Read,
    Write,
    Copy,
    Input,
}

/// Parameter accepted by a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: &'static str,
    pub description: &'static str,
}

impl Param {
    /// Environment variable the helper reads this parameter from
    pub fn env_var(&self) -> String {
        self.name.to_ascii_uppercase()
    }
}

const FILENAME: Param = Param {
    name: "filename",
    description: "Path of the file, relative to the workspace root",
};
const CONTENT: Param = Param {
    name: "content",
    description: "Full content to write to the file",
};
const TO_FILENAME: Param = Param {
    name: "to_filename",
    description: "Destination path, relative to the workspace root",
};
const INPUT: Param = Param {
    name: "input",
    description: "Raw tool input to parse",
};

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::List,
        Capability::Read,
        Capability::Write,
        Capability::Copy,
        Capability::Input,
    ];

    /// Helper sub-command name
    pub fn subcommand(&self) -> &'static str {
        match self {
            Capability::List => "list",
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Copy => "copy",
            Capability::Input => "input",
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            Capability::List => "list_workspace_files",
            Capability::Read => "read_file_from_workspace",
            Capability::Write => "write_file_to_workspace",
            Capability::Copy => "copy_file_in_workspace",
            Capability::Input => "parse_workspace_input",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Capability::List => "Lists all files in the user's workspace",
            Capability::Read => "Reads the contents of a file in the user's workspace",
            Capability::Write => {
                "Writes content to a file in the user's workspace, replacing any existing content"
            }
            Capability::Copy => "Copies a file to a new path in the user's workspace",
            Capability::Input => "Parses tool input into a workspace file reference",
        }
    }

    pub fn params(&self) -> &'static [Param] {
        match self {
            Capability::List => &[],
            Capability::Read => &[FILENAME],
            Capability::Write => &[FILENAME, CONTENT],
            Capability::Copy => &[FILENAME, TO_FILENAME],
            Capability::Input => &[INPUT],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    /// `None` for aggregate tools that are rendered rather than dispatched
    pub subcommand: Option<&'static str>,
    pub shares: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub tools: Vec<ToolDefinition>,
}

pub const INSTRUCTIONS_TOOL: &str = "workspace_files_instructions";

/// The full tool manifest: one entry per capability plus the instructions tool
pub fn manifest() -> Manifest {
    let mut tools: Vec<ToolDefinition> = Capability::ALL
        .iter()
        .map(|c| ToolDefinition {
            name: c.tool_name(),
            description: c.description(),
            params: c.params(),
            subcommand: Some(c.subcommand()),
            shares: Vec::new(),
        })
        .collect();

    tools.push(ToolDefinition {
        name: INSTRUCTIONS_TOOL,
        description: "Describes the workspace file tools and lists the files currently in the workspace",
        params: &[],
        subcommand: None,
        shares: Capability::ALL.iter().map(|c| c.tool_name()).collect(),
    });

    Manifest { tools }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_has_every_capability_and_instructions() {
        let manifest = manifest();
        assert_eq!(manifest.tools.len(), 6);

        let subcommands: Vec<_> = manifest.tools.iter().filter_map(|t| t.subcommand).collect();
        assert_eq!(subcommands, vec!["list", "read", "write", "copy", "input"]);

        let instructions = manifest.tools.last().unwrap();
        assert_eq!(instructions.name, INSTRUCTIONS_TOOL);
        assert_eq!(instructions.shares.len(), 5);
    }

    #[test]
    fn test_params_per_capability() {
        let names = |c: Capability| c.params().iter().map(|p| p.name).collect::<Vec<_>>();
        assert!(names(Capability::List).is_empty());
        assert_eq!(names(Capability::Read), vec!["filename"]);
        assert_eq!(names(Capability::Write), vec!["filename", "content"]);
        assert_eq!(names(Capability::Copy), vec!["filename", "to_filename"]);
        assert_eq!(names(Capability::Input), vec!["input"]);
    }

    #[test]
    fn test_param_env_var() {
        assert_eq!(TO_FILENAME.env_var(), "TO_FILENAME");
    }

    #[test]
    fn test_manifest_serializes() {
        let json = serde_json::to_value(manifest()).unwrap();
        assert_eq!(json["tools"][1]["params"][0]["name"], "filename");
        assert!(json["tools"][5]["subcommand"].is_null());
    }
}
