//! Directory loader: every `*.csv` statement in a folder, in file-name order.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::parsers::statement_csv::parse_statement;
use crate::types::Statement;

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// Statement files directly inside `dir`, sorted by name
pub fn statement_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, IngestError> {
    let dir = dir.as_ref();
    let io_err = |source: std::io::Error| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_csv(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load and parse every statement in `dir`.
///
/// Any unreadable file or malformed row fails the whole load.
pub fn load_statements(dir: impl AsRef<Path>) -> Result<Vec<Statement>, IngestError> {
    let files = statement_files(dir.as_ref())?;
    if files.is_empty() {
        warn!(dir = %dir.as_ref().display(), "no statement files found");
    }

    let mut statements = Vec::with_capacity(files.len());
    for path in files {
        let transactions = parse_statement(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if transactions.is_empty() {
            warn!(file = %name, "statement has no rows");
        } else {
            debug!(file = %name, rows = transactions.len(), "loaded statement");
        }
        statements.push(Statement { name, transactions });
    }

    Ok(statements)
}
