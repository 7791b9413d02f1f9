use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to render chart: {0}")]
    Render(String),

    #[error("Unknown chart kind: {0}")]
    UnknownKind(String),
}
