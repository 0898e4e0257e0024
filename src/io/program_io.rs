use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::model::program::Program;
use crate::parse::program_parser::{ParseIssue, parse_program};
use crate::parse::program_serializer::serialize_program;

/// The fixed extension for program files.
pub const PROGRAM_EXTENSION: &str = "wft";

/// Error type for program file I/O
#[derive(Debug, thiserror::Error)]
pub enum ProgramIoError {
    #[error("not a weft program: expected a `.{PROGRAM_EXTENSION}` file, got {path}")]
    BadExtension { path: PathBuf },
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// True when the path carries the program extension.
pub fn is_program_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PROGRAM_EXTENSION)
}

/// Read and parse a program file. Rejects paths without the `.wft`
/// extension; parsing itself is lenient and returns issues alongside.
pub fn load_program(path: &Path) -> Result<(Program, Vec<ParseIssue>), ProgramIoError> {
    if !is_program_file(path) {
        return Err(ProgramIoError::BadExtension {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| ProgramIoError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(parse_program(&text))
}

/// Serialize and save a program atomically: write to a temp file in the
/// same directory, then rename over the target.
pub fn save_program(path: &Path, program: &Program) -> Result<(), ProgramIoError> {
    let text = serialize_program(program);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ProgramIoError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| ProgramIoError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    tmp.persist(path).map_err(|e| ProgramIoError::WriteError {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
