use std::process::ExitCode;

use clap::Args;

use cmdtree::commands::command::{Action, ActionError};
use cmdtree::console::{Console, StdConsole};
use cmdtree::engine::{Invocation, RunSettings};
use cmdtree::load_schema;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip the audit report before running
    #[arg(long)]
    no_audit: bool,

    /// Start parsing at this command id instead of the root
    #[arg(long)]
    entry: Option<String>,

    /// Arguments to execute (put them after `--` when the first one is an option)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Print the invoked command with its selected options and bound values
fn echo(invocation: &Invocation<'_>, console: &mut dyn Console) -> Result<(), ActionError> {
    console.write_line(invocation.id());
    for option in invocation.selected_options() {
        let values: Vec<String> = option
            .parameters()
            .iter()
            .filter_map(|p| p.data().map(|data| format!("{}={data}", p.id)))
            .collect();
        if values.is_empty() {
            console.write_line(&format!("  --{}", option.id));
        } else {
            console.write_line(&format!("  --{} {}", option.id, values.join(" ")));
        }
    }
    Ok(())
}

/// Bind the echo action to every command and execute the arguments.
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded.
pub fn run(args: &RunArgs, schema: Option<&str>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (mut tree, _) = load_schema(schema)?;
    let action = Action::new(echo);
    let ids: Vec<String> = tree.commands().map(|c| c.id.clone()).collect();
    for id in &ids {
        tree.bind_action(id, action.clone())?;
    }

    let settings = RunSettings {
        audit: !args.no_audit,
        entry: args.entry.clone(),
    };
    let report = tree.execute_with(&args.args, &mut StdConsole, &settings);
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
