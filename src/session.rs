//! Analysis session: upload, configure, inspect, analyze
//!
//! The session is the explicit replacement for process-wide state. It owns
//! the current dataset and configuration with overwrite semantics:
//! uploading replaces the dataset, configuring replaces the configuration,
//! and nothing is kept from earlier calls.
//!
//! [`AnalysisSession::analyze`] captures an `Arc` snapshot of the dataset
//! and a copy of the configuration before running, so the engine always sees
//! one consistent input. Sharing a session across threads is up to the
//! caller (wrap it in a lock).
//!
//! ```rust
//! use virtual_twins::session::AnalysisSession;
//!
//! let mut session = AnalysisSession::new();
//! let csv = "age,arm,score\n34,treated,1.5\n51,control,2.25\n";
//! let summary = session.upload_csv(Some("Pilot"), "pilot.csv", csv.as_bytes())?;
//! assert_eq!(summary.shape, (2, 3));
//!
//! session.configure("score", "arm")?;
//! assert_eq!(session.project_info().outcome_column.as_deref(), Some("score"));
//! # Ok::<(), virtual_twins::Error>(())
//! ```

use crate::dataset::{Dataset, PREVIEW_ROWS};
use crate::engine::Engine;
use crate::result::AnalysisResult;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

/// Title used when an upload carries none
pub const DEFAULT_PROJECT_TITLE: &str = "Untitled Project";

/// Outcome and intervention column names for the next run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfiguration {
    /// Column to predict
    pub outcome_column: String,
    /// Column whose values define the partitions
    pub intervention_column: String,
}

impl AnalysisConfiguration {
    /// Create a configuration
    ///
    /// # Errors
    /// Returns `Error::Configuration` if either name is blank
    pub fn new(outcome_column: impl Into<String>, intervention_column: impl Into<String>) -> Result<Self> {
        let outcome_column = outcome_column.into();
        let intervention_column = intervention_column.into();
        if outcome_column.trim().is_empty() || intervention_column.trim().is_empty() {
            return Err(Error::Configuration(
                "Both outcome and intervention columns must be specified".to_string(),
            ));
        }
        Ok(Self {
            outcome_column,
            intervention_column,
        })
    }

    /// Check that both columns exist in `dataset`
    ///
    /// # Errors
    /// Returns `Error::Configuration` naming the missing column
    pub fn check_against(&self, dataset: &Dataset) -> Result<()> {
        dataset.require_column("Outcome", &self.outcome_column)?;
        dataset.require_column("Intervention", &self.intervention_column)?;
        Ok(())
    }
}

/// Response to a successful upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    /// Status message
    pub message: String,
    /// Project title
    pub project_title: String,
    /// Uploaded file name
    pub filename: String,
    /// Column names in order
    pub columns: Vec<String>,
    /// `(rows, columns)`
    pub shape: (usize, usize),
    /// First rows as JSON records
    pub preview: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Project metadata exposed to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Uploaded file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// `(rows, columns)` of the current dataset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<(usize, usize)>,
    /// When the current dataset was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Configured outcome column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome_column: Option<String>,
    /// Configured intervention column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_column: Option<String>,
}

/// Current dataset, configuration and project metadata
#[derive(Debug, Default)]
pub struct AnalysisSession {
    engine: Engine,
    dataset: Option<Arc<Dataset>>,
    configuration: Option<AnalysisConfiguration>,
    info: ProjectInfo,
}

impl AnalysisSession {
    /// Session with the default engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with a custom engine
    #[must_use]
    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    /// Replace the current dataset
    ///
    /// # Errors
    /// Returns `Error::Ingest` if `filename` is empty
    pub fn upload(
        &mut self,
        project_title: Option<&str>,
        filename: &str,
        dataset: Dataset,
    ) -> Result<UploadSummary> {
        if filename.trim().is_empty() {
            return Err(Error::Ingest("No file selected".to_string()));
        }
        let title = project_title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_PROJECT_TITLE)
            .to_string();

        let summary = UploadSummary {
            message: "File uploaded successfully".to_string(),
            project_title: title.clone(),
            filename: filename.to_string(),
            columns: dataset.column_names(),
            shape: dataset.shape(),
            preview: dataset.preview(PREVIEW_ROWS)?,
        };

        tracing::info!(
            project = %title,
            filename,
            rows = summary.shape.0,
            columns = summary.shape.1,
            "dataset uploaded"
        );

        self.info.title = Some(title);
        self.info.filename = Some(filename.to_string());
        self.info.shape = Some(summary.shape);
        self.info.uploaded_at = Some(Utc::now());
        self.dataset = Some(Arc::new(dataset));

        Ok(summary)
    }

    /// Parse CSV and replace the current dataset
    ///
    /// # Errors
    /// Returns `Error::Ingest` if the CSV cannot be parsed; the previous
    /// dataset is kept in that case
    pub fn upload_csv<R: Read>(
        &mut self,
        project_title: Option<&str>,
        filename: &str,
        reader: R,
    ) -> Result<UploadSummary> {
        if filename.trim().is_empty() {
            return Err(Error::Ingest("No file selected".to_string()));
        }
        let dataset = Dataset::from_csv_reader(reader).map_err(|e| match e {
            Error::Ingest(msg) => Error::Ingest(format!("Error processing file: {msg}")),
            other => other,
        })?;
        self.upload(project_title, filename, dataset)
    }

    /// Replace the configuration
    ///
    /// Both names must be non-blank. If a dataset is loaded, both columns
    /// must exist in it.
    ///
    /// # Errors
    /// Returns `Error::Configuration`; the previous configuration is kept
    pub fn configure(
        &mut self,
        outcome_column: &str,
        intervention_column: &str,
    ) -> Result<AnalysisConfiguration> {
        let configuration = AnalysisConfiguration::new(outcome_column, intervention_column)?;
        if let Some(dataset) = &self.dataset {
            configuration.check_against(dataset)?;
        }

        tracing::info!(
            outcome = %configuration.outcome_column,
            intervention = %configuration.intervention_column,
            "configuration saved"
        );

        self.info.outcome_column = Some(configuration.outcome_column.clone());
        self.info.intervention_column = Some(configuration.intervention_column.clone());
        self.configuration = Some(configuration.clone());
        Ok(configuration)
    }

    /// Current configuration
    #[must_use]
    pub const fn configuration(&self) -> Option<&AnalysisConfiguration> {
        self.configuration.as_ref()
    }

    /// Snapshot of the current dataset
    #[must_use]
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.clone()
    }

    /// Project metadata
    #[must_use]
    pub const fn project_info(&self) -> &ProjectInfo {
        &self.info
    }

    /// Engine used by [`analyze`](Self::analyze)
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run the analysis on the current dataset and configuration
    ///
    /// # Errors
    /// - `Error::EmptyDataset` if nothing was uploaded
    /// - `Error::Configuration` if nothing was configured
    /// - any engine error
    pub fn analyze(&self) -> Result<AnalysisResult> {
        let dataset = self.dataset.clone().ok_or(Error::EmptyDataset)?;
        let configuration = self.configuration.clone().ok_or_else(|| {
            Error::Configuration(
                "No analysis configuration: set outcome and intervention columns first"
                    .to_string(),
            )
        })?;

        self.engine.analyze(
            &dataset,
            &configuration.outcome_column,
            &configuration.intervention_column,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn small() -> Dataset {
        Dataset::from_columns(vec![
            Column::numeric("y", vec![1.0, 2.0]),
            Column::categorical("arm", vec!["a", "b"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_configuration_rejects_blank() {
        assert!(AnalysisConfiguration::new("", "arm").is_err());
        assert!(AnalysisConfiguration::new("y", "  ").is_err());
        assert!(AnalysisConfiguration::new("y", "arm").is_ok());
    }

    #[test]
    fn test_upload_defaults_title() {
        let mut session = AnalysisSession::new();
        let summary = session.upload(None, "data.csv", small()).unwrap();
        assert_eq!(summary.project_title, DEFAULT_PROJECT_TITLE);
        let summary = session.upload(Some("  "), "data.csv", small()).unwrap();
        assert_eq!(summary.project_title, DEFAULT_PROJECT_TITLE);
    }

    #[test]
    fn test_upload_requires_filename() {
        let mut session = AnalysisSession::new();
        assert!(matches!(
            session.upload(Some("P"), "", small()),
            Err(Error::Ingest(_))
        ));
        assert!(session.dataset().is_none());
    }

    #[test]
    fn test_configure_checks_loaded_dataset() {
        let mut session = AnalysisSession::new();
        session.upload(Some("P"), "d.csv", small()).unwrap();
        assert!(session.configure("y", "arm").is_ok());
        assert!(session.configure("y", "dose").is_err());
        // Failed configure keeps the previous one
        assert_eq!(
            session.configuration().map(|c| c.intervention_column.as_str()),
            Some("arm")
        );
    }

    #[test]
    fn test_configure_before_upload_is_allowed() {
        let mut session = AnalysisSession::new();
        assert!(session.configure("y", "arm").is_ok());
    }

    #[test]
    fn test_snapshot_survives_reupload() {
        let mut session = AnalysisSession::new();
        session.upload(Some("P"), "a.csv", small()).unwrap();
        let snapshot = session.dataset().unwrap();
        let bigger = Dataset::from_columns(vec![Column::numeric("y", vec![1.0, 2.0, 3.0])]).unwrap();
        session.upload(Some("P"), "b.csv", bigger).unwrap();
        assert_eq!(snapshot.num_rows(), 2);
        assert_eq!(session.dataset().unwrap().num_rows(), 3);
    }

    #[test]
    fn test_project_info_serialization_skips_unset() {
        let session = AnalysisSession::new();
        let json = serde_json::to_value(session.project_info()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
