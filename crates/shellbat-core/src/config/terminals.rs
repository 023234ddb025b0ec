use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A terminal that can be opened on a location.
///
/// `{0}` in the command lines is replaced by the location path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalEntry {
    pub key: CompactString,
    #[serde(default)]
    pub display_name: CompactString,
    pub command_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_directory_command: Option<String>,
    #[serde(default)]
    pub is_wsl: bool,
    #[serde(default)]
    pub supports_shell_sync: bool,
}

impl TerminalEntry {
    /// Command line with the location substituted
    pub fn command_for(&self, location: &str) -> String {
        self.command_line.replace("{0}", location)
    }
}

fn terminal(key: &str, display_name: &str, command_line: &str, cd: &str) -> TerminalEntry {
    TerminalEntry {
        key: key.into(),
        display_name: display_name.into(),
        command_line: command_line.to_string(),
        change_directory_command: Some(cd.to_string()),
        is_wsl: false,
        supports_shell_sync: false,
    }
}

/// Terminals offered when none are configured
pub fn default_terminals() -> Vec<TerminalEntry> {
    vec![
        terminal(
            "pwsh",
            "PowerShell",
            "pwsh.exe -NoExit -Command \"Set-Location -LiteralPath '{0}'\"",
            "Set-Location -LiteralPath '{0}'",
        ),
        terminal(
            "powershell",
            "Windows PowerShell",
            "powershell.exe -NoExit -Command \"Set-Location -LiteralPath '{0}'\"",
            "Set-Location -LiteralPath '{0}'",
        ),
        TerminalEntry {
            supports_shell_sync: true,
            ..terminal("cmd", "Command Prompt", "cmd.exe /k \"cd /d {0}\"", "cd /d {0}")
        },
        TerminalEntry {
            is_wsl: true,
            ..terminal("bash", "Bash", "%windir%\\system32\\bash.exe", "cd '{0}'")
        },
    ]
}
