//! Static build profiles per (environment, platform).

use buildmedic_types::build::Environment;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AndroidProfile {
    /// Gradle build type, e.g. `debug`.
    pub variant: &'static str,
    pub signing_config: &'static str,
    pub minify: bool,
    pub shrink_resources: bool,
}

impl AndroidProfile {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                variant: "debug",
                signing_config: "debug",
                minify: false,
                shrink_resources: false,
            },
            Environment::Staging => Self {
                variant: "release",
                signing_config: "release",
                minify: true,
                shrink_resources: false,
            },
            Environment::Production => Self {
                variant: "release",
                signing_config: "release",
                minify: true,
                shrink_resources: true,
            },
        }
    }

    /// `assembleDebug`, `assembleRelease`, ...
    pub fn assemble_task(&self) -> String {
        let mut chars = self.variant.chars();
        match chars.next() {
            Some(first) => format!("assemble{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => "assemble".to_string(),
        }
    }

    /// Entries upserted into `android/gradle.properties`.
    pub fn properties(&self, environment: Environment) -> Vec<(String, String)> {
        vec![
            ("buildmedic.environment".into(), environment.as_str().into()),
            ("buildmedic.buildVariant".into(), self.variant.into()),
            ("buildmedic.signingConfig".into(), self.signing_config.into()),
            ("buildmedic.minifyEnabled".into(), self.minify.to_string()),
            ("buildmedic.shrinkResources".into(), self.shrink_resources.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IosProfile {
    /// Xcode build configuration, e.g. `Debug`.
    pub configuration: &'static str,
    pub code_sign_identity: &'static str,
}

impl IosProfile {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                configuration: "Debug",
                code_sign_identity: "iPhone Developer",
            },
            Environment::Staging | Environment::Production => Self {
                configuration: "Release",
                code_sign_identity: "iPhone Distribution",
            },
        }
    }

    /// Entries upserted into `ios/buildmedic.xcconfig`.
    pub fn settings(&self, environment: Environment) -> Vec<(String, String)> {
        vec![
            ("BUILDMEDIC_ENVIRONMENT".into(), environment.as_str().into()),
            ("CODE_SIGN_IDENTITY".into(), self.code_sign_identity.into()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_task_capitalizes_variant() {
        let p = AndroidProfile::for_environment(Environment::Development);
        assert_eq!(p.assemble_task(), "assembleDebug");
        let p = AndroidProfile::for_environment(Environment::Production);
        assert_eq!(p.assemble_task(), "assembleRelease");
        assert!(p.minify && p.shrink_resources);
    }

    #[test]
    fn only_production_shrinks_resources() {
        let shrinking: Vec<Environment> = Environment::ALL
            .into_iter()
            .filter(|e| AndroidProfile::for_environment(*e).shrink_resources)
            .collect();
        assert_eq!(shrinking, vec![Environment::Production]);
    }

    #[test]
    fn ios_release_configs_use_distribution_identity() {
        let p = IosProfile::for_environment(Environment::Staging);
        assert_eq!(p.configuration, "Release");
        assert_eq!(
            p.settings(Environment::Staging)[1],
            ("CODE_SIGN_IDENTITY".to_string(), "iPhone Distribution".to_string())
        );
    }
}
