use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Malformed grid code: {code:?} (expected 2 non-digit characters + 6 digits)")]
    MalformedCode { code: String },

    #[error("Grid index out of range: row {row}, col {col} (max 999)")]
    IndexOutOfRange { row: u32, col: u32 },

    #[error("Malformed band label: {label:?}")]
    MalformedBandLabel { label: String },

    /// 보정 샘플에서 제외되는 레코드 단위 오류
    #[error("Unknown reference point: {id:?}")]
    MissingReference { id: String },

    #[error("No calibration data: {0}")]
    NoCalibrationData(String),

    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),
}

impl From<serde_yaml::Error> for GridError {
    fn from(err: serde_yaml::Error) -> Self {
        GridError::ConfigParse(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
