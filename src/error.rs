use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("Render error: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

#[cfg(feature = "python")]
impl From<DashError> for pyo3::PyErr {
    fn from(err: DashError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
