use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("reading {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{source_name}: malformed CSV")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("{source_name}: header has no '{column}' column")]
    MissingColumn {
        source_name: String,
        column: &'static str,
    },

    #[error("{source_name}:{line}: invalid date '{value}'")]
    InvalidDate {
        source_name: String,
        line: u64,
        value: String,
    },
}
