use buildmedic_exec::{CommandOutput, ScriptedRunner};
use buildmedic_signing::{InstallOutcome, SignatureManager, SigningConfig};
use buildmedic_types::build::{Environment, Platform};
use buildmedic_workflow::{WorkflowAutomation, WorkflowSettings};
use camino::Utf8PathBuf;
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Project {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Project {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        std::fs::create_dir_all(root.join("android/app")).expect("mkdir");
        std::fs::create_dir_all(root.join("ios")).expect("mkdir");
        Self { _temp: temp, root }
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, contents).expect("write");
    }

    fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root.join(rel)).expect("read")
    }

    fn run(&self, runner: &Arc<ScriptedRunner>, platform: Platform, env: Environment) -> buildmedic_workflow::BuildOutcome {
        let workflow = WorkflowAutomation::new(runner.clone(), self.root.clone(), WorkflowSettings::default());
        let signing = SignatureManager::new(
            runner.clone(),
            self.root.clone(),
            SigningConfig {
                package_name: "com.shop.app".to_string(),
                ..SigningConfig::default()
            },
        );
        workflow.build(platform, env, &signing)
    }
}

#[test]
fn development_android_build_installs_the_apk() {
    let p = Project::new();
    p.write("android/app/build/outputs/apk/debug/app-debug.apk", "apk!");
    p.write("android/gradle.properties", "org.gradle.jvmargs=-Xmx2048m\n");
    let runner = Arc::new(
        ScriptedRunner::new()
            .on("./gradlew assembleDebug", CommandOutput::ok("BUILD SUCCESSFUL"))
            .on("adb install", CommandOutput::ok("Performing Streamed Install\nSuccess")),
    );

    let out = p.run(&runner, Platform::Android, Environment::Development);

    assert!(out.success, "{:?}", out.error);
    assert_eq!(out.error, None);
    let artifact = out.artifact.expect("artifact");
    assert_eq!(artifact.file_name(), Some("app-debug.apk"));
    assert_eq!(out.artifact_size, Some(4));
    assert_eq!(out.installed, Some(InstallOutcome::Installed));
    assert_eq!(
        runner.calls(),
        vec![
            "./gradlew assembleDebug".to_string(),
            format!("adb install -r {artifact}"),
        ]
    );
    assert_eq!(
        p.read("android/gradle.properties"),
        "org.gradle.jvmargs=-Xmx2048m\n\
         buildmedic.environment=development\n\
         buildmedic.buildVariant=debug\n\
         buildmedic.signingConfig=debug\n\
         buildmedic.minifyEnabled=false\n\
         buildmedic.shrinkResources=false\n"
    );
}

#[test]
fn signature_conflict_during_install_is_retried_after_uninstall() {
    let p = Project::new();
    p.write("android/app/build/outputs/apk/debug/app-debug.apk", "apk");
    let runner = Arc::new(
        ScriptedRunner::new()
            .on("./gradlew assembleDebug", CommandOutput::ok(""))
            .on_sequence(
                "adb install",
                vec![
                    CommandOutput::failed(1, "Failure [INSTALL_FAILED_UPDATE_INCOMPATIBLE: signatures do not match]"),
                    CommandOutput::ok("Success"),
                ],
            )
            .on("adb uninstall", CommandOutput::ok("Success")),
    );

    let out = p.run(&runner, Platform::Android, Environment::Development);

    assert!(out.success);
    assert_eq!(out.installed, Some(InstallOutcome::ReinstalledAfterUninstall));
    assert_eq!(runner.count("adb install"), 2);
    assert!(runner.called("adb uninstall com.shop.app"));
}

#[test]
fn failed_gradle_build_returns_raw_error_text() {
    let p = Project::new();
    let runner = Arc::new(ScriptedRunner::new().on(
        "./gradlew assembleDebug",
        CommandOutput::failed(1, "> java.lang.OutOfMemoryError: Java heap space"),
    ));

    let out = p.run(&runner, Platform::Android, Environment::Development);

    assert!(!out.success);
    assert!(out.error.as_deref().expect("error").contains("OutOfMemoryError"));
    assert_eq!(out.artifact, None);
    assert!(!runner.called("adb"));
}

#[test]
fn missing_artifact_is_a_failed_build() {
    let p = Project::new();
    let runner = Arc::new(ScriptedRunner::new().on("./gradlew assembleRelease", CommandOutput::ok("")));

    let out = p.run(&runner, Platform::Android, Environment::Staging);

    assert!(!out.success);
    assert!(out.error.as_deref().expect("error").starts_with("no .apk artifact found"));
}

#[test]
fn release_android_builds_are_not_installed() {
    let p = Project::new();
    p.write("android/app/build/outputs/apk/release/app-release.apk", "apk");
    let runner = Arc::new(ScriptedRunner::new().on("./gradlew assembleRelease", CommandOutput::ok("")));

    let out = p.run(&runner, Platform::Android, Environment::Production);

    assert!(out.success);
    assert_eq!(out.installed, None);
    assert!(!runner.called("adb"));
    assert!(p.read("android/gradle.properties").contains("buildmedic.shrinkResources=true\n"));
}

#[test]
fn ios_build_writes_xcconfig_and_finds_app_bundle() {
    let p = Project::new();
    std::fs::create_dir_all(p.root.join("ios/build/Build/Products/Release-iphoneos/App.app"))
        .expect("mkdir");
    let runner = Arc::new(ScriptedRunner::new().on("xcodebuild", CommandOutput::ok("** BUILD SUCCEEDED **")));

    let out = p.run(&runner, Platform::Ios, Environment::Production);

    assert!(out.success, "{:?}", out.error);
    assert_eq!(out.artifact.expect("artifact").file_name(), Some("App.app"));
    assert_eq!(out.artifact_size, None);
    assert_eq!(
        p.read("ios/buildmedic.xcconfig"),
        "BUILDMEDIC_ENVIRONMENT = production\nCODE_SIGN_IDENTITY = iPhone Distribution\n"
    );
    let call = &runner.calls()[0];
    assert!(call.contains("-configuration Release"));
    assert!(call.ends_with(" build"));
}
