use std::sync::Arc;

use parking_lot::Mutex;

use cmdtree::commands::tree::CommandTree;
use cmdtree::config_file::{Schema, SchemaError};
use cmdtree::console::BufferConsole;
use cmdtree::engine::{ExecutionError, ParseError, RunSettings};
use cmdtree::load_schema;

const CALC_YAML: &str = r"
title: Calculator
version: 2.1.0
commands:
  - id: calc
    description: Simple calculator
    root: true
    require_subcommand: true
  - id: calc.add
    description: Add two numbers
    groups: [format]
    options:
      - id: operands
        description: Numbers to add
        shortcut: o
        parameters:
          - {id: left, order: 1, required: true, min_length: 1, max_length: 9, pattern: '^\d+$'}
          - {id: right, order: 2, required: true, pattern: '^\d+$'}
      - id: json
        description: JSON output
        group: format
      - id: plain
        description: Plain output
        group: format
  - id: calc.add.float
    description: Add floating point numbers
  - id: calc.sub
    description: Subtract two numbers
";

const CALC_JSON: &str = r#"{
  "title": "Calculator",
  "version": "2.1.0",
  "commands": [
    {"id": "calc", "description": "Simple calculator", "root": true, "require_subcommand": true},
    {
      "id": "calc.add",
      "description": "Add two numbers",
      "groups": ["format"],
      "options": [
        {
          "id": "operands",
          "description": "Numbers to add",
          "shortcut": "o",
          "parameters": [
            {"id": "left", "order": 1, "required": true, "min_length": 1, "max_length": 9, "pattern": "^\\d+$"},
            {"id": "right", "order": 2, "required": true, "pattern": "^\\d+$"}
          ]
        },
        {"id": "json", "description": "JSON output", "group": "format"},
        {"id": "plain", "description": "Plain output", "group": "format"}
      ]
    },
    {"id": "calc.add.float", "description": "Add floating point numbers"},
    {"id": "calc.sub", "description": "Subtract two numbers"}
  ]
}"#;

fn write_schema(dir: &std::path::Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

fn load_calc(dir: &std::path::Path) -> CommandTree {
    let path = write_schema(dir, "calc.yaml", CALC_YAML);
    load_schema(Some(&path)).unwrap().0
}

type Log = Arc<Mutex<Vec<String>>>;

/// Bind an action to every command that records its id and the selected options
fn bind_all(tree: &mut CommandTree) -> Log {
    let log: Log = Arc::default();
    let ids: Vec<String> = tree.commands().map(|c| c.id.clone()).collect();
    for id in ids {
        let log = log.clone();
        tree.bind(&id, move |invocation, _| {
            let mut entry = invocation.id().to_string();
            for option in invocation.selected_options() {
                entry.push_str(&format!(" --{}", option.id));
                for parameter in option.parameters() {
                    if let Some(data) = parameter.data() {
                        entry.push_str(&format!(" {}={data}", parameter.id));
                    }
                }
            }
            log.lock().push(entry);
            Ok(())
        })
        .unwrap();
    }
    log
}

#[test]
fn test_yaml_and_json_schemas_agree() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = write_schema(dir.path(), "cli.yaml", CALC_YAML);
    let json = write_schema(dir.path(), "cli.json", CALC_JSON);
    let (from_yaml, _) = load_schema(Some(&yaml)).unwrap();
    let (from_json, _) = load_schema(Some(&json)).unwrap();
    let operands = from_json.get("calc.add").unwrap().option("operands").unwrap();
    let left = operands.parameter("left").unwrap();
    assert_eq!((left.min_length, left.max_length), (1, 9));
    assert_eq!(left.pattern(), Some(r"^\d+$"));

    assert_eq!(from_yaml.len(), from_json.len());
    assert_eq!(from_yaml.title, from_json.title);
    assert_eq!(from_yaml.version, from_json.version);
    for command in from_yaml.commands() {
        let other = from_json.get(&command.id).unwrap();
        assert_eq!(command.parent(), other.parent());
        assert_eq!(command.description, other.description);
        assert_eq!(command.requires_subcommand, other.requires_subcommand);
        assert_eq!(command.options().count(), other.options().count());
        for option in command.options() {
            let counterpart = other.option(&option.id).unwrap();
            assert_eq!(option.shortcut, counterpart.shortcut);
            assert_eq!(option.group, counterpart.group);
            assert_eq!(option.description, counterpart.description);
            assert_eq!(option.parameters().len(), counterpart.parameters().len());
            for (parameter, twin) in option.parameters().iter().zip(counterpart.parameters()) {
                assert_eq!(parameter.id, twin.id);
                assert_eq!(parameter.order, twin.order);
                assert_eq!(parameter.required, twin.required);
                assert_eq!(parameter.min_length, twin.min_length);
                assert_eq!(parameter.max_length, twin.max_length);
                assert_eq!(parameter.pattern(), twin.pattern());
            }
        }
        for group in command.groups() {
            assert_eq!(group.members(), other.group(&group.id).unwrap().members());
        }
    }
}

#[test]
fn test_execute_subcommand_with_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    let log = bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let report = tree.execute(&["add", "--operands", "12", "30", "--json"], &mut console);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.executed, ["calc", "calc.add"]);
    assert_eq!(
        *log.lock(),
        ["calc", "calc.add --json --operands left=12 right=30"]
    );
}

#[test]
fn test_named_parameters_and_shortcut() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    let log = bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let report = tree.execute(&["add", "-o", "right:5", "left:7"], &mut console);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(log.lock().last().unwrap(), "calc.add --operands left=7 right=5");
}

#[test]
fn test_group_selection_is_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    let log = bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let report = tree.execute(&["add", "--json", "--plain"], &mut console);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(log.lock().last().unwrap(), "calc.add --plain");
}

#[test]
fn test_missing_required_parameter_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    let log = bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let report = tree.execute(&["add", "--operands", "1"], &mut console);
    match &report.error {
        Some(ExecutionError::Parse(ParseError::MissingParameters { option, parameters })) => {
            assert_eq!(option, "operands");
            assert_eq!(parameters, &["right"]);
        }
        other => panic!("Expected MissingParameters, got: {other:?}"),
    }
    assert!(log.lock().is_empty());
    assert_eq!(report.help_for.as_deref(), Some("calc.add"));
    let output = console.output();
    assert!(output.contains("Error: Required parameters [right] is missing for option: operands"));
    assert!(output.contains("Usage: calc add [options] [subcommand]"));
}

#[test]
fn test_pattern_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let report = tree.execute(&["add", "--operands", "one", "2"], &mut console);
    assert!(matches!(
        report.error,
        Some(ExecutionError::Parse(ParseError::InvalidValue { .. }))
    ));
}

#[test]
fn test_root_requires_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let report = tree.execute::<&str>(&[], &mut console);
    match report.error {
        Some(ExecutionError::Parse(ParseError::SubcommandRequired(id))) => assert_eq!(id, "calc"),
        other => panic!("Expected SubcommandRequired, got: {other:?}"),
    }
    assert!(console.output().contains("Usage: calc [options] <subcommand>"));
}

#[test]
fn test_help_for_nested_command() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    let log = bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let report = tree.execute(&["add", "float", "-h"], &mut console);
    assert!(report.is_success());
    assert!(log.lock().is_empty());
    assert_eq!(report.help_for.as_deref(), Some("calc.add.float"));
    let output = console.output();
    assert!(output.starts_with("Calculator 2.1.0\n"));
    assert!(output.contains("Usage: calc add float [options]"));
    assert!(output.contains("Add floating point numbers"));
}

#[test]
fn test_state_resets_between_executions() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    let log = bind_all(&mut tree);
    let mut console = BufferConsole::new();

    let first = tree.execute(&["add", "--operands", "1", "2", "--json"], &mut console);
    assert!(first.is_success());
    let second = tree.execute(&["add"], &mut console);
    assert!(second.is_success());
    assert_eq!(log.lock().last().unwrap(), "calc.add");
    let add = tree.get("calc.add").unwrap();
    assert!(add.selected_options().next().is_none());
    assert_eq!(add.option("operands").unwrap().value("left"), None);
}

#[test]
fn test_entry_command_and_audit() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = load_calc(dir.path());
    let mut console = BufferConsole::new();
    tree.bind("calc.sub", |invocation, console| {
        console.write_line(&format!("ran {}", invocation.id()));
        Ok(())
    })
    .unwrap();

    let settings = RunSettings {
        audit: true,
        entry: Some("calc.sub".to_string()),
    };
    let report = tree.execute_with::<&str>(&[], &mut console, &settings);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.executed, ["calc.sub"]);
    assert_eq!(
        report.audit,
        [
            "Command 'calc.add' has no action and does not require a subcommand",
            "Command 'calc.add.float' has no action and does not require a subcommand",
        ]
    );
    let output = console.output();
    assert!(output.contains(
        "Warning: Command 'calc.add' has no action and does not require a subcommand"
    ));
    assert!(output.ends_with("ran calc.sub\n"));
}

#[test]
fn test_duplicate_ids_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_schema(
        dir.path(),
        "cli.yaml",
        r"
commands:
  - {id: app, description: Application, root: true}
  - {id: app.run, description: Run things}
  - {id: app.run, description: Run things again}
",
    );
    match load_schema(Some(&path)) {
        Err(SchemaError::DuplicateIds(ids)) => assert_eq!(ids, ["app.run"]),
        other => panic!("Expected DuplicateIds, got: {other:?}"),
    }
}

#[test]
fn test_orphans_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_schema(
        dir.path(),
        "cli.json",
        r#"{"commands": [
            {"id": "app", "description": "Application", "root": true},
            {"id": "tool.run", "description": "Belongs elsewhere"}
        ]}"#,
    );
    match load_schema(Some(&path)) {
        Err(SchemaError::Orphans(ids)) => assert_eq!(ids, ["tool.run"]),
        other => panic!("Expected Orphans, got: {other:?}"),
    }
}

#[test]
fn test_cycle_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_schema(
        dir.path(),
        "cli.yml",
        r"
commands:
  - {id: app, description: Application, root: true}
  - {id: app.a, description: First link, parent: app.b}
  - {id: app.b, description: Second link, parent: app.a}
",
    );
    assert!(matches!(load_schema(Some(&path)), Err(SchemaError::Cycle(_))));
}

#[test]
fn test_invalid_id_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_schema(
        dir.path(),
        "cli.yaml",
        "commands:\n  - {id: App_Main, description: Application, root: true}\n",
    );
    let error = load_schema(Some(&path)).unwrap_err();
    assert!(error.to_string().starts_with("Invalid command 'App_Main'"));
}

#[test]
fn test_schema_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("project").join("src");
    std::fs::create_dir_all(&nested).unwrap();
    write_schema(dir.path(), ".cmdtree.yml", CALC_YAML);

    let found = Schema::find_schema_from(&nested).unwrap();
    assert_eq!(found, dir.path().join(".cmdtree.yml"));
    let tree = cmdtree::loader::load(Schema::from_file(&found).unwrap()).unwrap();
    assert_eq!(tree.root_id(), "calc");
}

#[test]
fn test_json_preferred_over_yaml_in_same_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path(), ".cmdtree.yaml", CALC_YAML);
    write_schema(dir.path(), ".cmdtree.json", CALC_JSON);
    assert_eq!(
        Schema::find_schema_from(dir.path()).unwrap(),
        dir.path().join(".cmdtree.json")
    );
}
