//! Session workflow: upload, configure, analyze

use virtual_twins::dataset::{Column, Dataset};
use virtual_twins::session::DEFAULT_PROJECT_TITLE;
use virtual_twins::{AnalysisSession, Engine, Error};

fn trial_csv(rows: usize) -> String {
    let mut csv = String::from("patient_age,arm,response\n");
    for i in 0..rows {
        let arm = if i % 2 == 0 { "treated" } else { "control" };
        csv.push_str(&format!("{},{arm},{}\n", 30 + i, i * 3));
    }
    csv
}

fn fast_session() -> AnalysisSession {
    let engine = Engine::builder()
        .benchmark_estimators(10)
        .subgroup_estimators(10)
        .build()
        .unwrap();
    AnalysisSession::with_engine(engine)
}

#[test]
fn test_analyze_without_dataset() {
    let session = AnalysisSession::new();
    assert!(matches!(session.analyze(), Err(Error::EmptyDataset)));
}

#[test]
fn test_analyze_without_configuration() {
    let mut session = AnalysisSession::new();
    session
        .upload_csv(Some("Trial"), "trial.csv", trial_csv(30).as_bytes())
        .unwrap();
    assert!(matches!(session.analyze(), Err(Error::Configuration(_))));
}

#[test]
fn test_configure_before_upload_is_accepted() {
    let mut session = AnalysisSession::new();
    let config = session.configure("response", "arm").unwrap();
    assert_eq!(config.outcome_column, "response");
    assert!(matches!(session.analyze(), Err(Error::EmptyDataset)));
}

#[test]
fn test_blank_configuration_rejected() {
    let mut session = AnalysisSession::new();
    let err = session.configure("response", "").unwrap_err();
    assert!(err
        .to_string()
        .contains("Both outcome and intervention columns must be specified"));
    assert!(session.configuration().is_none());
}

#[test]
fn test_upload_summary() {
    let mut session = AnalysisSession::new();
    let summary = session
        .upload_csv(None, "trial.csv", trial_csv(12).as_bytes())
        .unwrap();

    assert_eq!(summary.project_title, DEFAULT_PROJECT_TITLE);
    assert_eq!(summary.filename, "trial.csv");
    assert_eq!(summary.columns, vec!["patient_age", "arm", "response"]);
    assert_eq!(summary.shape, (12, 3));
    assert_eq!(summary.preview.len(), 5);
    assert_eq!(summary.preview[0]["arm"], "treated");
}

#[test]
fn test_full_workflow() {
    let mut session = fast_session();
    session
        .upload_csv(Some("Trial"), "trial.csv", trial_csv(60).as_bytes())
        .unwrap();
    session.configure("response", "arm").unwrap();

    let result = session.analyze().unwrap();
    assert_eq!(result.sample_count(), 60);
    assert_eq!(result.partition_count(), 2);
    assert_eq!(result.trained_partitions(), 2);

    let info = session.project_info();
    assert_eq!(info.title.as_deref(), Some("Trial"));
    assert_eq!(info.shape, Some((60, 3)));
    assert_eq!(info.outcome_column.as_deref(), Some("response"));
    assert!(info.uploaded_at.is_some());
}

#[test]
fn test_reupload_replaces_dataset() {
    let mut session = fast_session();
    session
        .upload_csv(Some("Trial"), "trial.csv", trial_csv(30).as_bytes())
        .unwrap();
    session.configure("response", "arm").unwrap();

    let replacement = Dataset::from_columns(vec![
        Column::numeric("dose", (0..40_i32).map(f64::from).collect()),
        Column::categorical("arm", vec!["x"; 40]),
        Column::numeric("response", (0..40_i32).map(f64::from).collect()),
    ])
    .unwrap();
    session.upload(Some("Second"), "second.csv", replacement).unwrap();

    let result = session.analyze().unwrap();
    assert_eq!(result.sample_count(), 40);
    assert_eq!(result.partition_count(), 1);
}

#[test]
fn test_bad_csv_keeps_previous_dataset() {
    let mut session = AnalysisSession::new();
    session
        .upload_csv(Some("Trial"), "trial.csv", trial_csv(10).as_bytes())
        .unwrap();

    let broken = "a,b\n1,2\n3\n";
    assert!(session
        .upload_csv(Some("Broken"), "broken.csv", broken.as_bytes())
        .is_err());
    assert_eq!(session.dataset().unwrap().num_rows(), 10);
    assert_eq!(session.project_info().title.as_deref(), Some("Trial"));
}

#[test]
fn test_empty_filename_rejected() {
    let mut session = AnalysisSession::new();
    let err = session
        .upload_csv(None, " ", trial_csv(10).as_bytes())
        .unwrap_err();
    assert!(matches!(err, Error::Ingest(_)));
}

#[test]
fn test_project_info_json_omits_unset_fields() {
    let mut session = AnalysisSession::new();
    session.configure("response", "arm").unwrap();
    let json = serde_json::to_value(session.project_info()).unwrap();
    assert_eq!(json["outcome_column"], "response");
    assert!(json.get("title").is_none());
    assert!(json.get("uploaded_at").is_none());
}
