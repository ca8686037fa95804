use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use career_match::config::{
    AppConfig, AppEnvironment, DataConfig, ServerConfig, TelemetryConfig,
};
use career_match::scoring::{
    CalibrationRequest, Category, CsvDirectorySource, DataSource, EngineConfig, EngineError,
    RatingEntry, RecommendationService, ThresholdOrigin, UserProfile,
};

/// Fresh per-test directory under the system temp dir.
fn data_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "career-match-{name}-{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create data dir");
    dir
}

/// Levels on a 0-7 scale, as published in the source tables.
const SKILLS_CSV: &str = "\
O*NET-SOC Code,Title,Element ID,Element Name,Scale ID,Scale Name,Data Value,N
15-1252.00,Software Developers,2.B.3.e,Programming,LV,Level,5.95,8
15-1252.00,Software Developers,2.B.3.e,Programming,IM,Importance,90,8
15-1252.00,Software Developers,2.A.1.e,Mathematics,LV,Level,5.60,8
15-1252.00,Software Developers,2.A.1.e,Mathematics,IM,Importance,70,8
15-1252.00,Software Developers,2.A.2.a,Critical Thinking,LV,Level,5.25,8
15-1252.00,Software Developers,2.A.2.a,Critical Thinking,IM,Importance,75,8
15-1252.00,Software Developers,2.B.4.g,Systems Analysis,LV,Level,5.04,8
15-1252.00,Software Developers,2.B.4.g,Systems Analysis,IM,Importance,70,8
35-1011.00,Chefs,2.B.3.e,Programming,LV,Level,0.35,8
35-1011.00,Chefs,2.B.3.e,Programming,IM,Importance,10,8
35-1011.00,Chefs,2.A.1.e,Mathematics,LV,Level,2.10,8
35-1011.00,Chefs,2.A.1.e,Mathematics,IM,Importance,30,8
35-1011.00,Chefs,2.A.2.a,Critical Thinking,LV,Level,3.15,8
35-1011.00,Chefs,2.A.2.a,Critical Thinking,IM,Importance,50,8
35-1011.00,Chefs,2.B.4.g,Systems Analysis,LV,Level,1.40,8
35-1011.00,Chefs,2.B.4.g,Systems Analysis,IM,Importance,20,8
15-2041.00,Statisticians,2.B.3.e,Programming,LV,Level,4.20,8
15-2041.00,Statisticians,2.B.3.e,Programming,IM,Importance,60,8
15-2041.00,Statisticians,2.A.1.e,Mathematics,LV,Level,7.00,8
15-2041.00,Statisticians,2.A.1.e,Mathematics,IM,Importance,90,8
15-2041.00,Statisticians,2.A.2.a,Critical Thinking,LV,Level,5.60,8
15-2041.00,Statisticians,2.A.2.a,Critical Thinking,IM,Importance,80,8
15-2041.00,Statisticians,2.B.4.g,Systems Analysis,LV,Level,4.55,8
15-2041.00,Statisticians,2.B.4.g,Systems Analysis,IM,Importance,60,8
27-3042.00,Technical Writers,2.B.3.e,Programming,LV,Level,2.10,8
27-3042.00,Technical Writers,2.B.3.e,Programming,IM,Importance,30,8
27-3042.00,Technical Writers,2.A.1.e,Mathematics,LV,Level,2.45,8
27-3042.00,Technical Writers,2.A.1.e,Mathematics,IM,Importance,30,8
27-3042.00,Technical Writers,2.A.2.a,Critical Thinking,LV,Level,4.20,8
27-3042.00,Technical Writers,2.A.2.a,Critical Thinking,IM,Importance,60,8
27-3042.00,Technical Writers,2.B.4.g,Systems Analysis,LV,Level,2.80,8
27-3042.00,Technical Writers,2.B.4.g,Systems Analysis,IM,Importance,35,8
";

fn developer_profile() -> UserProfile {
    UserProfile::default().with(
        Category::Skills,
        vec![
            RatingEntry::new("Programming", 90.0),
            RatingEntry::new("Mathematics", 85.0),
            RatingEntry::new("Critical Thinking", 80.0),
            RatingEntry::new("Systems Analysis", 75.0),
        ],
    )
}

fn app_config(dir: PathBuf) -> AppConfig {
    AppConfig {
        environment: AppEnvironment::Test,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "warn".to_string(),
        },
        data: DataConfig {
            dir,
            validation_dataset: "outcomes".to_string(),
            covariance_cache_capacity: 16,
        },
    }
}

#[test]
fn csv_tables_are_read_and_rescaled() {
    let dir = data_dir("rescale");
    fs::write(dir.join("elements-skills-csv.csv"), SKILLS_CSV).expect("write skills");

    let source = CsvDirectorySource::new(&dir);
    let rows = source
        .element_rows(Category::Skills.dataset())
        .expect("rows parsed");
    assert_eq!(rows.len(), 32);

    let service = RecommendationService::new(Arc::new(source), EngineConfig::default());
    let skills = service
        .score_category(Category::Skills, &developer_profile())
        .expect("skills scored");

    let developer = &skills["Software Developers"];
    assert_eq!(developer.overlap, 4);
    let metrics = developer.metrics.expect("blended metrics");
    // 5.95 on a 7.0 maximum becomes 85 on the 0-100 scale.
    assert!(metrics.fit > 0.95, "fit was {}", metrics.fit);

    let recommendation = service.recommend(&developer_profile()).expect("recommendation");
    assert_eq!(recommendation.matches[0].title, "Software Developers");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_table_is_reported_as_unavailable() {
    let dir = data_dir("missing");
    let service = RecommendationService::from_app_config(&app_config(dir.clone()));

    match service.recommend(&developer_profile()) {
        Err(EngineError::DataUnavailable(error)) => {
            assert_eq!(error.dataset, "elements-skills-csv");
            assert!(error.reason.contains("failed to open"));
        }
        other => panic!("expected data unavailable, got {other:?}"),
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn validation_csv_drives_threshold_search() {
    let dir = data_dir("validation");
    fs::write(dir.join("elements-skills-csv.csv"), SKILLS_CSV).expect("write skills");

    let mut validation = String::from("occupation,label,user_skills\n");
    for i in 0..10 {
        let level = 66 + 3 * i;
        let items = format!(
            "[{{\"\"name\"\":\"\"Programming\"\",\"\"rating\"\":{level}}},\
{{\"\"name\"\":\"\"Mathematics\"\",\"\"rating\"\":{level}}},\
{{\"\"name\"\":\"\"Critical Thinking\"\",\"\"rating\"\":{level}}},\
{{\"\"name\"\":\"\"Systems Analysis\"\",\"\"rating\"\":{level}}}]"
        );
        let label = if i >= 5 { 1 } else { 0 };
        validation.push_str(&format!("Software Developers,{label},\"{items}\"\n"));
    }
    validation.push_str("Software Developers,maybe,\"[]\"\n");
    fs::write(dir.join("outcomes.csv"), validation).expect("write validation");

    let service = RecommendationService::from_app_config(&app_config(dir.clone()));
    assert_eq!(service.validation_dataset(), "outcomes");

    let request = CalibrationRequest {
        dataset_name: Some("outcomes".to_string()),
        importance_candidates: Some(vec![85.0]),
        ratio_candidates: Some(vec![0.7]),
        ..CalibrationRequest::default()
    };
    let snapshot = service.calibrate(&request).expect("calibration");
    assert_eq!(snapshot.threshold_origin, ThresholdOrigin::ValidationSearch);
    assert_eq!(snapshot.importance_critical_threshold, 85.0);
    assert_eq!(snapshot.min_requirement_ratio, 0.7);

    let _ = fs::remove_dir_all(&dir);
}
