//! fs-results: sweep result tables, CSV persistence and static plots.

pub mod csv;
pub mod plot;
pub mod table;

pub use csv::{read_csv, write_csv};
pub use plot::{PlotOptions, plot_barh, plot_xy, select_top_k};
pub use table::{CONVERGED_COLUMN, Record, ResultTable, Row};

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("Schema mismatch: missing [{}], unexpected [{}]", missing.join(", "), extra.join(", "))]
    SchemaMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Unknown column: {name}")]
    UnknownColumn { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("Nothing to plot: {what}")]
    EmptyTable { what: String },
}
