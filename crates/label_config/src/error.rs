use thiserror::Error;

/// The first schema violation found in a persisted or user-supplied configuration.
///
/// `lane` and `index` are zero-based positions inside the offending key's lane list.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not a JSON object")]
    NotAnObject,
    #[error("configuration has no `labelSetting`")]
    MissingLabelSetting,
    #[error("`labelSetting` must be an object mapping URL prefixes to lanes")]
    LabelSettingNotAnObject,
    #[error("`{key}` is not an http(s) URL prefix")]
    InvalidPrefix { key: String },
    #[error("lanes for `{key}` must be an array")]
    LanesNotAnArray { key: String },
    #[error("lane {lane} for `{key}` must be an array of labels")]
    LaneNotAnArray { key: String, lane: usize },
    #[error("lane {lane} for `{key}` is empty")]
    EmptyLane { key: String, lane: usize },
    #[error("label {index} of lane {lane} for `{key}` is not a string")]
    LabelNotAString { key: String, lane: usize, index: usize },
    #[error("label {index} of lane {lane} for `{key}` is empty")]
    EmptyLabel { key: String, lane: usize, index: usize },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
