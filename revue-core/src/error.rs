use thiserror::Error;

use crate::dataset::DatasetError;

#[derive(Error, Debug)]
pub enum RevueError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_errors_convert() {
        let err: RevueError = DatasetError::MissingColumn("time".into()).into();
        assert!(matches!(err, RevueError::Dataset(DatasetError::MissingColumn(_))));
        assert_eq!(
            err.to_string(),
            "Dataset error: dataset is missing required column 'time'"
        );

        let err: RevueError = config::ConfigError::NotFound("http.port".into()).into();
        assert!(err.to_string().starts_with("Config error:"));
    }
}
