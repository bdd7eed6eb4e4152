//! End-to-end analysis runs: settings in, sealed report sets out.

use std::path::Path;
use std::sync::Arc;

use covreg_core::{
    ConfigurationTable, CoverageTool, CovregError, EmptyReportPolicy, ModuleKey, RegistryPhase,
    TestScope,
};
use covreg_sensors::{sensors_for, AnalysisRun, Module, SensorStatus, Settings};
use tracing_test::traced_test;

fn vbnet_module(key: &str, base: &Path, settings: Settings) -> Module {
    Module::new(ModuleKey::new(key), base, settings).with_language("vbnet")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_modules_share_one_registry() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("App/obj/output-vbnet")).unwrap();

    let table = Arc::new(ConfigurationTable::builtin());
    let app = vbnet_module(
        "App.vbproj",
        root.path(),
        Settings::new()
            .with("sonar.vbnet.opencover.reportsPaths", "cov/a.xml,cov/shared.xml")
            .with("sonar.vbnet.analyzer.projectOutPaths", "App/obj")
            .with("sonar.vbnet.roslyn.reportFilePaths", "App/roslyn.json"),
    );
    let lib = vbnet_module(
        "Lib.vbproj",
        root.path(),
        Settings::new()
            .with("sonar.vbnet.opencover.reportsPaths", "cov/shared.xml,cov/b.xml")
            .with("sonar.vbnet.vscoveragexml.it.reportsPaths", "it/run.coveragexml"),
    );

    let sensors = sensors_for(&table, "vbnet").unwrap();
    let mut run = AnalysisRun::new(Arc::clone(&table));
    let reports = run.execute(&[app, lib], &sensors).await;
    assert_eq!(reports.len(), 6);
    assert!(reports.iter().all(|r| r.status == SensorStatus::Finished));

    let collector = Arc::clone(run.collector("vbnet").unwrap());
    let report = run.finish(&["vbnet"]).unwrap();
    assert!(report.success());
    assert_eq!(collector.phase(), RegistryPhase::Sealed);

    assert_eq!(report.coverage.len(), 2);
    let unit = &report.coverage[0];
    assert_eq!(unit.scope, TestScope::Unit);
    let opencover: Vec<_> = unit
        .paths(CoverageTool::OpenCover)
        .iter()
        .map(|p| p.relative_to(root.path()).unwrap().to_path_buf())
        .collect();
    // Both modules finish in any order; the shared report appears once.
    assert_eq!(opencover.len(), 3);
    assert_eq!(
        opencover
            .iter()
            .filter(|p| p.as_path() == Path::new("cov/shared.xml"))
            .count(),
        1
    );

    let integration = &report.coverage[1];
    assert_eq!(integration.paths(CoverageTool::VisualStudioXml).len(), 1);
    assert!(integration.paths(CoverageTool::OpenCover).is_empty());

    let analyzer = &report.analyzer["vbnet"];
    assert_eq!(analyzer.protobuf_dirs.len(), 1);
    assert_eq!(analyzer.roslyn_reports.len(), 1);
    assert_eq!(analyzer.roslyn_reports[0].module.as_str(), "App.vbproj");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn languages_keep_separate_reports() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("Vb/obj/output-vbnet")).unwrap();
    std::fs::create_dir_all(root.path().join("Cs/obj/output-cs")).unwrap();

    let table = Arc::new(ConfigurationTable::builtin());
    let vb = vbnet_module(
        "Vb.vbproj",
        root.path(),
        Settings::new()
            .with("sonar.vbnet.opencover.reportsPaths", "vb.xml")
            .with("sonar.vbnet.analyzer.projectOutPaths", "Vb/obj")
            .with("sonar.vbnet.roslyn.reportFilePaths", "Vb/roslyn.json"),
    );
    let cs = Module::new(
        ModuleKey::new("Cs.csproj"),
        root.path(),
        Settings::new()
            .with("sonar.cs.opencover.reportsPaths", "cs.xml")
            .with("sonar.cs.analyzer.projectOutPaths", "Cs/obj")
            .with("sonar.cs.roslyn.reportFilePaths", "Cs/roslyn.json"),
    )
    .with_language("cs");

    let mut sensors = sensors_for(&table, "vbnet").unwrap();
    sensors.extend(sensors_for(&table, "cs").unwrap());
    let mut run = AnalysisRun::new(Arc::clone(&table));
    let reports = run.execute(&[vb, cs], &sensors).await;
    assert!(reports
        .iter()
        .all(|r| !matches!(r.status, SensorStatus::Failed { .. })));

    let report = run.finish(&["vbnet", "cs"]).unwrap();
    assert_eq!(report.coverage.len(), 4);

    for set in report.coverage.iter().filter(|set| set.scope == TestScope::Unit) {
        let (expected_key, expected_file) = match set.language.as_str() {
            "vbnet" => ("sonar.vbnet.opencover.reportsPaths", "vb.xml"),
            "cs" => ("sonar.cs.opencover.reportsPaths", "cs.xml"),
            other => panic!("unexpected language {other}"),
        };
        let opencover = set
            .reports
            .iter()
            .find(|r| r.tool == CoverageTool::OpenCover)
            .unwrap();
        assert_eq!(opencover.property_key, expected_key);
        assert_eq!(opencover.paths.len(), 1);
        assert_eq!(
            opencover.paths[0].relative_to(root.path()),
            Some(Path::new(expected_file))
        );
    }

    let vb_analyzer = &report.analyzer["vbnet"];
    assert_eq!(vb_analyzer.protobuf_dirs.len(), 1);
    assert!(vb_analyzer.protobuf_dirs[0].as_path().ends_with("Vb/obj/output-vbnet"));
    assert_eq!(vb_analyzer.roslyn_reports.len(), 1);
    assert_eq!(vb_analyzer.roslyn_reports[0].module.as_str(), "Vb.vbproj");

    let cs_analyzer = &report.analyzer["cs"];
    assert_eq!(cs_analyzer.protobuf_dirs.len(), 1);
    assert!(cs_analyzer.protobuf_dirs[0].as_path().ends_with("Cs/obj/output-cs"));
    assert_eq!(cs_analyzer.roslyn_reports.len(), 1);
    assert_eq!(cs_analyzer.roslyn_reports[0].module.as_str(), "Cs.csproj");
}

#[tokio::test]
async fn finish_rejects_unregistered_language() {
    let table = Arc::new(ConfigurationTable::builtin());
    let run = AnalysisRun::new(table);
    assert!(run.collector("cobol").is_none());
    assert!(matches!(
        run.finish(&["cobol"]),
        Err(CovregError::UnknownLanguage(_))
    ));
}

#[tokio::test]
async fn sensors_for_other_language_are_skipped() {
    let table = Arc::new(ConfigurationTable::builtin());
    let module = Module::new(
        ModuleKey::new("Only.csproj"),
        "/src",
        Settings::new().with("sonar.vbnet.opencover.reportsPaths", "a.xml"),
    )
    .with_language("cs");

    let mut run = AnalysisRun::new(Arc::clone(&table));
    let sensors = sensors_for(&table, "vbnet").unwrap();
    let reports = run.execute(&[module], &sensors).await;
    assert!(reports.iter().all(|r| r.status == SensorStatus::Skipped));

    let report = run.finish(&["vbnet"]).unwrap();
    assert!(report.coverage.iter().all(|set| set.is_empty()));
}

#[tokio::test]
async fn strict_run_without_reports_fails() {
    let table = Arc::new(ConfigurationTable::builtin());
    let mut run =
        AnalysisRun::new(Arc::clone(&table)).with_policy(EmptyReportPolicy::Strict);
    let sensors = sensors_for(&table, "vbnet").unwrap();
    run.execute(&[vbnet_module("App", Path::new("/src"), Settings::new())], &sensors)
        .await;

    let err = run.finish(&["vbnet"]).unwrap_err();
    assert!(matches!(err, CovregError::EmptyReportSet { .. }));
}

#[tokio::test]
async fn invalid_property_entries_do_not_block_valid_ones() {
    let table = Arc::new(ConfigurationTable::builtin());
    let module = vbnet_module(
        "App",
        Path::new("/src/sln"),
        Settings::new().with(
            "sonar.vbnet.dotcover.reportsPaths",
            "good.html,../../../../../../escape.html",
        ),
    );

    let mut run = AnalysisRun::new(Arc::clone(&table));
    let sensors = sensors_for(&table, "vbnet").unwrap();
    let reports = run.execute(&[module], &sensors).await;
    let unit = reports
        .iter()
        .find(|r| r.sensor == "VB.NET Unit Tests Coverage Report Import")
        .unwrap();
    assert_eq!(unit.outcome.contributed, 1);
    assert_eq!(unit.outcome.rejected, 1);

    let report = run.finish(&["vbnet"]).unwrap();
    assert_eq!(report.coverage[0].paths(CoverageTool::DotCover).len(), 1);
}

#[tokio::test]
async fn report_serializes_to_json() {
    let table = Arc::new(ConfigurationTable::builtin());
    let mut run = AnalysisRun::new(Arc::clone(&table));
    let sensors = sensors_for(&table, "vbnet").unwrap();
    run.execute(
        &[vbnet_module(
            "App",
            Path::new("/src"),
            Settings::new().with("sonar.vbnet.ncover3.reportsPaths", "r.nccov"),
        )],
        &sensors,
    )
    .await;
    let report = run.finish(&["vbnet"]).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["sensors"][0]["status"], "finished");
    assert_eq!(json["coverage"][0]["scope"], "unit");
}

#[traced_test]
#[tokio::test]
async fn run_emits_lifecycle_events() {
    let table = Arc::new(ConfigurationTable::builtin());
    let mut run = AnalysisRun::new(Arc::clone(&table));
    let sensors = sensors_for(&table, "vbnet").unwrap();
    run.execute(
        &[
            vbnet_module(
                "App",
                Path::new("/src"),
                Settings::new().with("sonar.vbnet.opencover.reportsPaths", "a.xml"),
            ),
            Module::new(ModuleKey::new("Cs"), "/src", Settings::new()).with_language("cs"),
        ],
        &sensors,
    )
    .await;
    run.finish(&["vbnet"]).unwrap();

    assert!(logs_contain("run.started"));
    assert!(logs_contain("sensor.finished"));
    assert!(logs_contain("sensor.skipped"));
    assert!(logs_contain("run.finished"));
}
