use buildmedic_exec::{CommandOutput, ScriptedRunner};
use buildmedic_signing::{
    ConflictResolution, InstallOutcome, SignatureManager, SigningConfig, SigningError,
};
use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const PKG: &str = "com.shop.app";
const LOCAL_SHA1: &str = "\t SHA1: AA:BB:CC:DD:EE:FF:00:11:22:33:44:55:66:77:88:99:AA:BB:CC:DD\n";
const OTHER_SHA1: &str = "\t SHA1: 11:11:11:11:11:11:11:11:11:11:11:11:11:11:11:11:11:11:11:11\n";

struct Project {
    _temp: tempfile::TempDir,
    root: Utf8PathBuf,
}

fn project(with_keystore: bool) -> Project {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    std::fs::create_dir_all(root.join("android/app")).expect("mkdir");
    if with_keystore {
        std::fs::write(root.join("android/app/debug.keystore"), b"ks").expect("keystore");
    }
    Project { _temp: temp, root }
}

fn config() -> SigningConfig {
    SigningConfig {
        package_name: PKG.to_string(),
        ..SigningConfig::default()
    }
}

fn manager(runner: &Arc<ScriptedRunner>, root: &Utf8Path) -> SignatureManager {
    SignatureManager::new(runner.clone(), root, config())
}

fn installed_runner(device_sha1: &str) -> ScriptedRunner {
    ScriptedRunner::new()
        .on(
            "adb shell pm list packages",
            CommandOutput::ok(format!("package:{PKG}.debug\npackage:{PKG}\n")),
        )
        .on(
            "adb shell pm path",
            CommandOutput::ok("package:/data/app/com.shop.app-1/base.apk\n"),
        )
        .on("adb pull", CommandOutput::ok("1 file pulled"))
        .on("adb uninstall", CommandOutput::ok("Success"))
        .on("keytool -list", CommandOutput::ok(format!("Alias name: androiddebugkey\n{LOCAL_SHA1}")))
        .on("keytool -printcert", CommandOutput::ok(format!("Owner: CN=x\n{device_sha1}")))
}

#[test]
fn generates_keystore_only_when_missing() {
    let p = project(false);
    let runner = Arc::new(ScriptedRunner::new().on("keytool -genkeypair", CommandOutput::ok("")));
    let m = manager(&runner, &p.root);

    assert!(m.ensure_debug_keystore().expect("generate"));
    let call = &runner.calls()[0];
    assert!(call.contains("-alias androiddebugkey"));
    assert!(call.contains("android/app/debug.keystore"));

    std::fs::write(m.keystore_path(), b"ks").expect("keystore");
    assert!(!m.ensure_debug_keystore().expect("present"));
    assert_eq!(runner.count("keytool -genkeypair"), 1);
}

#[test]
fn keytool_failure_is_reported() {
    let p = project(false);
    let runner = Arc::new(
        ScriptedRunner::new().on("keytool -genkeypair", CommandOutput::failed(1, "keytool error")),
    );
    let err = manager(&runner, &p.root)
        .ensure_debug_keystore()
        .expect_err("should fail");
    assert!(matches!(err, SigningError::KeystoreGeneration { .. }));
}

#[test]
fn installed_check_requires_exact_package() {
    let p = project(true);
    let runner = Arc::new(ScriptedRunner::new().on(
        "adb shell pm list packages",
        CommandOutput::ok(format!("package:{PKG}.debug\n")),
    ));
    assert!(!manager(&runner, &p.root).is_app_installed());
    assert_eq!(
        manager(&runner, &p.root).resolve_conflicts().expect("resolve"),
        ConflictResolution::NotInstalled
    );
}

#[test]
fn matching_signatures_leave_app_alone() {
    let p = project(true);
    let runner = Arc::new(installed_runner(LOCAL_SHA1));
    let outcome = manager(&runner, &p.root).resolve_conflicts().expect("resolve");
    assert_eq!(outcome, ConflictResolution::Match);
    assert!(!runner.called("adb uninstall"));
}

#[test]
fn differing_signatures_uninstall() {
    let p = project(true);
    let runner = Arc::new(installed_runner(OTHER_SHA1));
    let outcome = manager(&runner, &p.root).resolve_conflicts().expect("resolve");
    assert_eq!(outcome, ConflictResolution::Uninstalled);
    assert!(runner.called(&format!("adb uninstall {PKG}")));
}

#[test]
fn missing_fingerprint_skips_verification() {
    let p = project(true);
    let runner = Arc::new(installed_runner(OTHER_SHA1).on(
        "adb pull",
        CommandOutput::failed(1, "remote object does not exist"),
    ));
    let outcome = manager(&runner, &p.root).resolve_conflicts().expect("resolve");
    assert_eq!(outcome, ConflictResolution::Unverifiable);
    assert!(!runner.called("adb uninstall"));
}

#[test]
fn signature_conflict_on_install_retries_once() {
    let p = project(true);
    let runner = Arc::new(
        installed_runner(LOCAL_SHA1).on_sequence(
            "adb install",
            vec![
                CommandOutput::failed(
                    1,
                    "Failure [INSTALL_FAILED_UPDATE_INCOMPATIBLE: Package signatures do not match]",
                ),
                CommandOutput::ok("Success"),
            ],
        ),
    );
    let outcome = manager(&runner, &p.root)
        .install_with_signature_handling(Utf8Path::new("app-debug.apk"))
        .expect("install");
    assert_eq!(outcome, InstallOutcome::ReinstalledAfterUninstall);
    assert_eq!(runner.count("adb install"), 2);
    assert_eq!(runner.count("adb uninstall"), 1);
}

#[test]
fn retry_failure_is_surfaced() {
    let p = project(true);
    let runner = Arc::new(installed_runner(LOCAL_SHA1).on_sequence(
        "adb install",
        vec![
            CommandOutput::ok("Failure [INSTALL_FAILED_UPDATE_INCOMPATIBLE]"),
            CommandOutput::failed(1, "Failure [INSTALL_FAILED_INSUFFICIENT_STORAGE]"),
        ],
    ));
    let err = manager(&runner, &p.root)
        .install_with_signature_handling(Utf8Path::new("app-debug.apk"))
        .expect_err("retry fails");
    match err {
        SigningError::RetryFailed { message, .. } => {
            assert!(message.contains("INSUFFICIENT_STORAGE"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(runner.count("adb install"), 2);
}

#[test]
fn unrelated_install_failure_is_not_retried() {
    let p = project(true);
    let runner = Arc::new(installed_runner(LOCAL_SHA1).on(
        "adb install",
        CommandOutput::failed(1, "adb: device offline"),
    ));
    let err = manager(&runner, &p.root)
        .install_with_signature_handling(Utf8Path::new("app-debug.apk"))
        .expect_err("fails");
    match err {
        SigningError::InstallFailed { message } => assert_eq!(message, "adb: device offline"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(runner.count("adb install"), 1);
    assert!(!runner.called("adb uninstall"));
}

#[test]
fn keystore_configuration_is_read_from_build_gradle() {
    let p = project(true);
    let runner = Arc::new(ScriptedRunner::new());
    let m = manager(&runner, &p.root);
    assert!(!m.validate_keystore_configuration());

    std::fs::write(
        p.root.join("android/app/build.gradle"),
        r#"android {
    signingConfigs {
        debug {
            storeFile file('debug.keystore')
            storePassword 'android'
            keyAlias 'androiddebugkey'
        }
    }
}
"#,
    )
    .expect("gradle");
    assert!(m.validate_keystore_configuration());

    std::fs::write(
        p.root.join("android/app/build.gradle"),
        r#"android {
    signingConfigs {
        release {
            storeFile file('release.keystore')
        }
        debug {
            storeFile file('debug.keystore')
        }
    }
}
"#,
    )
    .expect("gradle");
    assert!(m.validate_keystore_configuration());

    std::fs::write(
        p.root.join("android/app/build.gradle"),
        "signingConfigs {\n  debug {\n    storeFile file(\"release.keystore\")\n  }\n}\n",
    )
    .expect("gradle");
    assert!(!m.validate_keystore_configuration());
}

#[test]
fn report_combines_probes() {
    let p = project(true);
    let runner = Arc::new(installed_runner(LOCAL_SHA1));
    let report = manager(&runner, &p.root).report();
    assert!(report.keystore_exists);
    assert!(report.app_installed);
    assert_eq!(
        report.debug_fingerprint.as_deref(),
        Some("aabbccddeeff00112233445566778899aabbccdd")
    );
    assert!(report.signature_match);
    assert!(!report.configuration_valid);
}
