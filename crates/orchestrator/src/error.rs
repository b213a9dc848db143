use jobwatch_core::JobCategory;

/// Why the initial load of the registry did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitialLoadError {
    /// Some categories still failed after every retry. Their last error is
    /// kept in `message`.
    #[error("initial load failed for {}: {message}", format_categories(.categories))]
    Failed {
        categories: Vec<JobCategory>,
        message: String,
    },

    /// Shutdown began before the load finished.
    #[error("initial load cancelled")]
    Cancelled,
}

fn format_categories(categories: &[JobCategory]) -> String {
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
