//! Plain-text help for a single command

use anstyle::{AnsiColor, Style};

use crate::commands::option::CommandOption;
use crate::commands::tree::CommandTree;

const INDENT: &str = "  ";
const DETAIL_INDENT: &str = "      ";

fn option_usage(option: &CommandOption) -> String {
    let mut line = format!("{INDENT}--{}", option.id);
    if let Some(shortcut) = option.shortcut {
        line.push_str(&format!(", -{shortcut}"));
    }
    for parameter in option.parameters() {
        if parameter.required {
            line.push_str(&format!(" <{}>", parameter.id));
        } else {
            line.push_str(&format!(" [{}]", parameter.id));
        }
    }
    line
}

/// Render the help text of a command. Unknown ids render as an empty string.
#[must_use]
pub fn render(tree: &CommandTree, id: &str) -> String {
    let Some(command) = tree.get(id) else {
        return String::new();
    };
    let mut lines = Vec::new();

    if let Some(title) = &tree.title {
        match &tree.version {
            Some(version) => lines.push(format!("{title} {version}")),
            None => lines.push(title.clone()),
        }
        lines.push(String::new());
    }

    let mut usage = format!("Usage: {} [options]", tree.path(id).join(" "));
    if !command.subcommands().is_empty() {
        usage.push_str(if command.requires_subcommand {
            " <subcommand>"
        } else {
            " [subcommand]"
        });
    }
    lines.push(usage);
    lines.push(String::new());
    lines.push(command.description.clone());
    lines.push(String::new());

    lines.push("Options:".to_string());
    for option in command.options() {
        lines.push(option_usage(option));
        match &option.group {
            Some(group) => lines.push(format!(
                "{DETAIL_INDENT}{} (group: {group})",
                option.description
            )),
            None => lines.push(format!("{DETAIL_INDENT}{}", option.description)),
        }
    }

    let mut subcommands = tree.subcommands(id).peekable();
    if subcommands.peek().is_some() {
        lines.push(String::new());
        lines.push("Subcommands:".to_string());
        for sub in subcommands {
            lines.push(format!("{INDENT}{}", sub.name()));
            lines.push(format!("{DETAIL_INDENT}{}", sub.description));
        }
    }

    lines.join("\n")
}

/// Render an error line, in bold red when the console supports colour
#[must_use]
pub fn render_error(message: &str, color: bool) -> String {
    let line = format!("Error: {message}");
    if color {
        let style = Style::new().bold().fg_color(Some(AnsiColor::Red.into()));
        format!("{style}{line}{style:#}")
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command::CommandBuilder;
    use crate::commands::option::OptionBuilder;
    use crate::commands::parameter::ParameterBuilder;

    fn make_tree() -> CommandTree {
        let verbose = OptionBuilder::new("verbose")
            .description("Print every step")
            .shortcut('v')
            .build()
            .unwrap();
        let root = CommandBuilder::new("calc")
            .description("Simple calculator")
            .option(verbose)
            .build()
            .unwrap();
        let precision = OptionBuilder::new("precision")
            .description("Digits after the point")
            .group("format")
            .parameter(
                ParameterBuilder::new("digits")
                    .order(1)
                    .required(true)
                    .build()
                    .unwrap(),
            )
            .parameter(ParameterBuilder::new("mode").order(2).build().unwrap())
            .build()
            .unwrap();
        let add = CommandBuilder::new("calc.add")
            .description("Add two numbers")
            .group("format")
            .option(precision)
            .build()
            .unwrap();
        let mut tree = CommandTree::new(root);
        tree.insert_subcommand("calc", add).unwrap();
        tree
    }

    #[test]
    fn test_root_help() {
        let help = render(&make_tree(), "calc");
        insta::assert_snapshot!(help, @r"
        Usage: calc [options] [subcommand]

        Simple calculator

        Options:
          --help, -h
              Show help for this command
          --verbose, -v
              Print every step

        Subcommands:
          add
              Add two numbers
        ");
    }

    #[test]
    fn test_subcommand_help_lists_parameters() {
        let help = render(&make_tree(), "calc.add");
        assert!(help.starts_with("Usage: calc add [options]\n"));
        assert!(help.contains("  --precision <digits> [mode]\n"));
        assert!(help.contains("Digits after the point (group: format)"));
        assert!(!help.contains("Subcommands:"));
    }

    #[test]
    fn test_title_header() {
        let mut tree = make_tree();
        tree.title = Some("Calculator".to_string());
        tree.version = Some("1.2.0".to_string());
        assert!(render(&tree, "calc").starts_with("Calculator 1.2.0\n\nUsage: calc"));
    }

    #[test]
    fn test_unknown_command_renders_nothing() {
        assert_eq!(render(&make_tree(), "nope"), "");
    }

    #[test]
    fn test_render_error() {
        assert_eq!(render_error("boom", false), "Error: boom");
        let colored = render_error("boom", true);
        assert!(colored.contains("Error: boom"));
        assert!(colored.starts_with('\u{1b}'));
    }
}
