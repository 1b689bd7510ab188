use thiserror::Error;

/// Errors that abort an import run.
///
/// Unknown tour names, zero-guest bookings and incomplete calendar events are
/// not errors: they are counted in the `ImportResult` instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV header is missing required column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<&'static str> },

    #[error("failed to fetch calendar feed{}: {message}", status_suffix(.status))]
    Fetch { status: Option<u16>, message: String },

    #[error("invalid tour taxonomy: {0}")]
    Config(String),

    #[error("unknown timezone '{0}'")]
    Timezone(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_columns() {
        let err = ImportError::MissingColumns {
            missing: vec!["start time", "# guests"],
        };
        assert_eq!(
            err.to_string(),
            "CSV header is missing required column(s): start time, # guests"
        );
    }

    #[test]
    fn test_fetch_message_includes_status() {
        let err = ImportError::Fetch {
            status: Some(503),
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch calendar feed (HTTP 503): Service Unavailable"
        );
    }
}
