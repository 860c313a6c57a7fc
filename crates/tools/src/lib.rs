//! Built-in tool implementations for Ferrochat.
//!
//! Tools give the agent the ability to act: run shell commands and do
//! arithmetic. The tool set is closed-world: everything is registered
//! explicitly here at process start; there is no runtime discovery.

pub mod calc;
pub mod shell;

use ferrochat_core::tool::ToolRegistry;

/// Create the default tool registry with all built-in tools.
///
/// Security default: the shell tool only accepts common safe commands.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    let safe_commands = vec![
        "ls".into(),
        "cat".into(),
        "head".into(),
        "tail".into(),
        "echo".into(),
        "pwd".into(),
        "date".into(),
        "whoami".into(),
        "wc".into(),
        "grep".into(),
        "find".into(),
        "which".into(),
        "git".into(),
        "cargo".into(),
    ];
    registry.register(Box::new(shell::ShellTool::new(safe_commands)));
    registry.register(Box::new(calc::CalcTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtin_tools() {
        let registry = default_registry();
        assert!(registry.get("shell").is_some());
        assert!(registry.get("calc").is_some());
        assert_eq!(registry.definitions().len(), 2);
    }
}
