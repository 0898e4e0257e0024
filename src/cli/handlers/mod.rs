use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::{
    CheckArgs, Cli, Commands, ConfigAction, ConfigCmd, EmitArgs, NewArgs, ResolveArgs,
};
use crate::cli::output::{
    PairReport, ResolveReport, StatementReport, print_check_result, print_resolve_report,
};
use crate::expr::eval::{DescriptionEvaluator, Evaluator, Resolution, ResolveCtx};
use crate::io::config_io::{self, ConfigError};
use crate::io::lock::{LockError, ProgramLock};
use crate::io::program_io::{self, PROGRAM_EXTENSION, ProgramIoError};
use crate::model::component::ComponentKind;
use crate::model::program::Program;
use crate::ops::check::{check_program, path_display};
use crate::parse::program_serializer::{serialize_program, statement_line};

/// Error type for CLI handlers
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    ProgramIo(#[from] ProgramIoError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Usage(String),
}

use CliError::Usage;

/// Dispatch a parsed command line.
pub fn dispatch(cli: Cli) -> Result<(), CliError> {
    let json = cli.json;
    match cli.command {
        Some(Commands::New(args)) => cmd_new(args),
        Some(Commands::Check(args)) => cmd_check(args, json),
        Some(Commands::Emit(args)) => cmd_emit(args),
        Some(Commands::Resolve(args)) => cmd_resolve(args, json),
        Some(Commands::Config(cmd)) => cmd_config(cmd),
        None => Err(Usage("no command".into())),
    }
}

fn cmd_new(args: NewArgs) -> Result<(), CliError> {
    let mut path = PathBuf::from(&args.file);
    if path.extension().and_then(|e| e.to_str()) != Some(PROGRAM_EXTENSION) {
        path.set_extension(PROGRAM_EXTENSION);
    }
    if path.exists() && !args.force {
        return Err(Usage(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let config = config_io::load_or_default(path.parent().unwrap_or(Path::new(".")));
    let tasks = args.tasks.unwrap_or(config.program.default_tasks);
    if tasks == 0 || tasks > config.program.max_tasks {
        return Err(Usage(format!(
            "task count must be between 1 and {}",
            config.program.max_tasks
        )));
    }

    let program = Program::new(tasks);
    let _lock = ProgramLock::acquire_default(&path)?;
    program_io::save_program(&path, &program)?;
    println!("created {}", path.display());
    Ok(())
}

fn cmd_check(args: CheckArgs, json: bool) -> Result<(), CliError> {
    let path = PathBuf::from(&args.file);
    let (program, issues) = program_io::load_program(&path)?;
    let config = config_io::load_or_default(path.parent().unwrap_or(Path::new(".")));
    let eval = DescriptionEvaluator::new();
    let result = check_program(&program, &issues, &eval, config.program.max_tasks);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_check_result(&result);
    }
    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_emit(args: EmitArgs) -> Result<(), CliError> {
    let path = PathBuf::from(&args.file);
    let (program, issues) = program_io::load_program(&path)?;
    for issue in &issues {
        eprintln!("warning: line {}: {}", issue.line, issue.message);
    }
    if args.write {
        let _lock = ProgramLock::acquire_default(&path)?;
        program_io::save_program(&path, &program)?;
        println!("rewrote {}", path.display());
    } else {
        print!("{}", serialize_program(&program));
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs, json: bool) -> Result<(), CliError> {
    let path = PathBuf::from(&args.file);
    let (program, _issues) = program_io::load_program(&path)?;
    let eval = DescriptionEvaluator::new();

    let mut statements = Vec::new();
    for (comp_path, component) in program.flatten() {
        let ComponentKind::Statement(stmt) = &component.kind else {
            continue;
        };
        let bindings = program.scope_at(&comp_path);
        let ctx = ResolveCtx {
            task_count: program.task_count,
            bindings: &bindings,
        };
        let group = stmt.group();
        let pairs = match eval.resolve(group.source(), group.target(), &ctx) {
            Resolution::Pairs(pairs) => PairReport::from_pairs(&pairs),
            Resolution::Unknown => None,
        };
        statements.push(StatementReport {
            path: path_display(&comp_path),
            line: statement_line(stmt),
            not_static: pairs.is_none(),
            pairs,
        });
    }

    let report = ResolveReport {
        task_count: program.task_count,
        statements,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_resolve_report(&report);
    }
    Ok(())
}

fn cmd_config(cmd: ConfigCmd) -> Result<(), CliError> {
    let cwd = std::env::current_dir()?;
    match cmd.action {
        ConfigAction::Get { key } => {
            let Some(config_path) = config_io::discover_config(&cwd) else {
                return Err(Usage("no weft.toml found".into()));
            };
            let (_, doc) = config_io::read_config(&config_path)?;
            let Some((section, field)) = key.split_once('.') else {
                return Err(Usage(format!("unknown config key `{key}`")));
            };
            match doc.get(section).and_then(|s| s.get(field)) {
                Some(item) => println!("{}", item.to_string().trim()),
                None => return Err(Usage(format!("`{key}` is not set"))),
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let config_path =
                config_io::discover_config(&cwd).unwrap_or_else(|| cwd.join("weft.toml"));
            let mut doc = if config_path.exists() {
                config_io::read_config(&config_path)?.1
            } else {
                toml_edit::DocumentMut::new()
            };
            config_io::set_config_value(&mut doc, &key, &value)?;
            config_io::write_config(&config_path, &doc)?;
            println!("set {key} = {value} in {}", config_path.display());
            Ok(())
        }
    }
}

/// Resolve the file to open in the TUI: the given path, or the most
/// recently opened program that still exists.
pub fn tui_target(file: Option<&str>) -> Result<PathBuf, CliError> {
    if let Some(file) = file {
        let path = PathBuf::from(file);
        if !path.exists() {
            return Err(Usage(format!("{} does not exist", path.display())));
        }
        return Ok(path);
    }
    let recent = crate::io::state::read_recent_from(&crate::io::state::recent_path());
    for entry in &recent.entries {
        let path = PathBuf::from(&entry.path);
        if fs::metadata(&path).is_ok() {
            return Ok(path);
        }
    }
    Err(Usage(
        "no program file given and no recent files (try `wf new demo.wft`)".into(),
    ))
}
