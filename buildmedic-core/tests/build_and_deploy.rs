use buildmedic_core::{BuildManager, ManagerError, ManagerSettings, Ports};
use buildmedic_env::MapEnv;
use buildmedic_exec::{CommandOutput, ScriptedRunner};
use buildmedic_monitor::FixedClock;
use buildmedic_signing::SigningConfig;
use buildmedic_store::InMemoryStateStore;
use buildmedic_types::build::{Environment, Platform};
use buildmedic_types::files;
use buildmedic_types::metrics::ErrorCategory;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Sandbox {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
    sdk: Utf8PathBuf,
    tmp: Utf8PathBuf,
    store: Arc<InMemoryStateStore>,
}

fn write(path: &Utf8Path, text: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(path, text).expect("write");
}

fn sandbox() -> Sandbox {
    let temp = tempfile::tempdir().expect("temp dir");
    let base = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    let root = base.join("app");
    let sdk = base.join("sdk");
    let tmp = base.join("tmp");
    for dir in [
        root.join("node_modules/react"),
        root.join("node_modules/react-native"),
        sdk.join("platforms/android-34"),
        sdk.join("build-tools/34.0.0"),
        tmp.clone(),
    ] {
        std::fs::create_dir_all(&dir).expect("mkdir");
    }
    write(
        &root.join("package.json"),
        r#"{"dependencies": {"react": "18.2.0", "react-native": "0.72.4"}}"#,
    );
    write(&root.join("android/app/debug.keystore"), "ks");
    write(&root.join("android/app/build/outputs/apk/debug/app-debug.apk"), "apk");
    Sandbox {
        _temp: temp,
        root,
        sdk,
        tmp,
        store: Arc::new(InMemoryStateStore::new()),
    }
}

fn healthy(runner: ScriptedRunner) -> ScriptedRunner {
    runner
        .on("node --version", CommandOutput::ok("v20.11.0\n"))
        .on("npm --version", CommandOutput::ok("10.2.4\n"))
        .on(
            "java -version",
            CommandOutput::ok("").with_stderr("openjdk version \"17.0.9\" 2023-10-17\n"),
        )
        .on(
            "adb devices",
            CommandOutput::ok("List of devices attached\nemulator-5554\tdevice\n\n"),
        )
        .on("adb shell pm list packages", CommandOutput::ok(""))
}

impl Sandbox {
    fn manager(&self, runner: &Arc<ScriptedRunner>, host: MapEnv) -> BuildManager {
        let settings = ManagerSettings {
            project_root: self.root.clone(),
            signing: SigningConfig {
                package_name: "com.shop.app".to_string(),
                ..SigningConfig::default()
            },
            temp_dir: Some(self.tmp.clone()),
            ..ManagerSettings::default()
        };
        let ports = Ports {
            runner: runner.clone(),
            host: Arc::new(host),
            store: self.store.clone(),
            clock: Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).single().expect("valid date"),
            )),
        };
        BuildManager::new(&settings, ports).expect("manager")
    }

    fn host(&self) -> MapEnv {
        MapEnv::new()
            .set("ANDROID_HOME", self.sdk.as_str())
            .set("JAVA_HOME", "/usr/lib/jvm/17")
    }
}

#[test]
fn successful_build_is_recorded() {
    let sb = sandbox();
    let runner = Arc::new(healthy(
        ScriptedRunner::new()
            .on("./gradlew assembleDebug", CommandOutput::ok("BUILD SUCCESSFUL"))
            .on("adb install", CommandOutput::ok("Success")),
    ));
    let mut mgr = sb.manager(&runner, sb.host());

    let outcome = mgr
        .build_and_deploy(Platform::Android, Environment::Development)
        .expect("build succeeds");

    assert!(outcome.success);
    assert_eq!(outcome.artifact_size, Some(3));
    assert_eq!(mgr.monitor().builds().len(), 1);
    assert!(!mgr.monitor().builds()[0].is_failure());
    assert!(runner.called("adb shell pm list packages com.shop.app"));
    assert!(sb.store.get(files::METRICS).is_some());
}

#[test]
fn remediated_failure_is_retried_exactly_once() {
    let sb = sandbox();
    let runner = Arc::new(healthy(
        ScriptedRunner::new()
            .on_sequence(
                "./gradlew assembleDebug",
                vec![
                    CommandOutput::failed(1, "java.lang.OutOfMemoryError: Java heap space"),
                    CommandOutput::ok("BUILD SUCCESSFUL"),
                ],
            )
            .on("./gradlew --stop", CommandOutput::ok(""))
            .on("adb install", CommandOutput::ok("Success")),
    ));
    let mut mgr = sb.manager(&runner, sb.host());

    let outcome = mgr
        .build_and_deploy(Platform::Android, Environment::Development)
        .expect("retry succeeds");

    assert!(outcome.success);
    assert_eq!(runner.count("./gradlew assembleDebug"), 2);
    assert_eq!(runner.count("./gradlew --stop"), 1);
    assert_eq!(mgr.resolver().history().len(), 1);
    assert!(mgr.resolver().history()[0].success);
    // Only the final outcome is recorded.
    assert_eq!(mgr.monitor().builds().len(), 1);
    let props = std::fs::read_to_string(sb.root.join("android/gradle.properties")).expect("read");
    assert!(props.contains("org.gradle.parallel=false\n"));
}

#[test]
fn failed_remediation_is_not_retried() {
    let sb = sandbox();
    let runner = Arc::new(healthy(
        ScriptedRunner::new()
            .on(
                "./gradlew assembleDebug",
                CommandOutput::failed(1, "java.lang.OutOfMemoryError: Java heap space"),
            )
            .on("./gradlew --stop", CommandOutput::failed(1, "no daemon")),
    ));
    let mut mgr = sb.manager(&runner, sb.host());

    let err = mgr
        .build_and_deploy(Platform::Android, Environment::Development)
        .expect_err("build fails");

    assert!(matches!(err, ManagerError::BuildFailed { .. }));
    assert_eq!(runner.count("./gradlew assembleDebug"), 1);
    let builds = mgr.monitor().builds();
    assert_eq!(builds.len(), 1);
    assert!(builds[0].is_failure());
    assert_eq!(mgr.monitor().metrics().errors[&ErrorCategory::MemoryIssues].count, 1);
}

#[test]
fn manual_patterns_fail_with_the_raw_error() {
    let sb = sandbox();
    let runner = Arc::new(healthy(ScriptedRunner::new().on(
        "./gradlew assembleRelease",
        CommandOutput::failed(1, "SDK location not found. Define a valid SDK location"),
    )));
    let mut mgr = sb.manager(&runner, sb.host());

    let err = mgr
        .build_and_deploy(Platform::Android, Environment::Staging)
        .expect_err("build fails");

    assert_eq!(
        err.to_string(),
        "android staging build failed: SDK location not found. Define a valid SDK location"
    );
    assert_eq!(runner.count("./gradlew assembleRelease"), 1);
    assert!(mgr.resolver().history().is_empty());
    assert_eq!(
        mgr.monitor().metrics().errors[&ErrorCategory::EnvironmentIssues].count,
        1
    );
}

#[test]
fn invalid_environment_aborts_before_building() {
    let sb = sandbox();
    let runner = Arc::new(healthy(ScriptedRunner::new()));
    let mut mgr = sb.manager(&runner, MapEnv::new());

    let err = mgr
        .build_and_deploy(Platform::Android, Environment::Development)
        .expect_err("environment invalid");

    match err {
        ManagerError::EnvironmentInvalid { errors } => assert!(!errors.is_empty()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!runner.called("./gradlew"));
    assert!(mgr.monitor().builds().is_empty());
}

#[test]
fn report_writes_json_and_markdown() {
    let sb = sandbox();
    let runner = Arc::new(ScriptedRunner::new());
    let mgr = sb.manager(&runner, sb.host());

    let report = mgr.report();

    assert_eq!(report.summary.total_builds, 0);
    assert_eq!(report.health_score, 100.0);
    assert!(sb.store.get(files::HEALTH_REPORT).is_some());
    let md = sb.store.get(files::HEALTH_REPORT_MD).expect("markdown");
    assert!(md.starts_with("# buildmedic health report\n"));
}

#[test]
fn diagnose_classifies_without_running_anything() {
    let sb = sandbox();
    let runner = Arc::new(ScriptedRunner::new());
    let mgr = sb.manager(&runner, sb.host());

    let d = mgr.diagnose("INSTALL_FAILED_UPDATE_INCOMPATIBLE: Package signatures do not match");
    let pattern = d.pattern.expect("matched");
    assert_eq!(pattern.id, "signature_mismatch");
    assert!(pattern.automated);
    assert!(d.suggestions.is_empty());

    let d = mgr.diagnose("something odd");
    assert!(d.pattern.is_none());
    assert!(!d.suggestions.is_empty());
    assert!(runner.calls().is_empty());
}

#[test]
fn missing_project_root_is_an_internal_error() {
    let settings = ManagerSettings {
        project_root: Utf8PathBuf::from("/definitely/not/here"),
        ..ManagerSettings::default()
    };
    let ports = Ports {
        runner: Arc::new(ScriptedRunner::new()),
        host: Arc::new(MapEnv::new()),
        store: Arc::new(InMemoryStateStore::new()),
        clock: Arc::new(FixedClock::new(Utc::now())),
    };
    let err = BuildManager::new(&settings, ports).err().expect("error");
    assert!(matches!(err, ManagerError::Internal(_)));
    assert!(err.to_string().contains("is not a directory"));
}
