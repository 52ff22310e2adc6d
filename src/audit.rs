//! Pre-flight scan for trees that are valid but incomplete

use crate::commands::tree::CommandTree;

/// Collect a message for every command that can do nothing when invoked, and for
/// every option bound to a group its command never declared.
#[must_use]
pub fn audit(tree: &CommandTree) -> Vec<String> {
    let mut messages = Vec::new();
    for command in tree.commands() {
        if !command.has_action() && !command.requires_subcommand {
            messages.push(format!(
                "Command '{}' has no action and does not require a subcommand",
                command.id
            ));
        }
        for option in command.options() {
            if let Some(group) = &option.group
                && command.group(group).is_none()
            {
                messages.push(format!(
                    "Option '{}' of command '{}' references undeclared group '{group}'",
                    option.id, command.id
                ));
            }
        }
    }
    messages
}
