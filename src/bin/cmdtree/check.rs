use std::process::ExitCode;

use cmdtree::audit::audit;
use cmdtree::commands::tree::CommandTree;
use cmdtree::load_schema;

fn print_outline(tree: &CommandTree, id: &str, depth: usize) {
    let Some(command) = tree.get(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let name = if depth == 0 { command.id.as_str() } else { command.name() };
    println!("{indent}{name} — {}", command.description);
    for option in command.options().filter(|o| !o.is_help()) {
        println!("{indent}    --{} ({} parameters)", option.id, option.parameters().len());
    }
    for sub in command.subcommands() {
        print_outline(tree, sub, depth + 1);
    }
}

/// Load the schema, print the tree and list audit findings.
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded.
pub fn run(schema: Option<&str>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (tree, path) = load_schema(schema)?;
    println!("{}: {} commands", path.display(), tree.len());
    print_outline(&tree, tree.root_id(), 0);

    let findings = audit(&tree);
    if !findings.is_empty() {
        println!();
        for finding in &findings {
            println!("Warning: {finding}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
