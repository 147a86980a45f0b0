use std::path::PathBuf;
use std::time::Duration;

use takeoff_core::job::ExtractionKind;

use crate::retry::RetryConfig;

/// Cloud API configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    /// API host (default: `https://developer.api.autodesk.com`).
    pub base_url: String,
    /// Bearer token used for every call. Token refresh is out of scope.
    pub access_token: String,
    /// Public base URL of this server, used to build workitem callback
    /// URLs (default: `http://localhost:3000`).
    pub webhook_url: String,
    pub design_automation: DesignAutomationConfig,
    pub retry: RetryConfig,
}

/// Naming of the design automation resources this app owns.
#[derive(Debug, Clone)]
pub struct DesignAutomationConfig {
    /// Prefix of every app bundle and activity id.
    pub nickname: String,
    /// Alias the activities are published under (e.g. `dev`, `prod`).
    pub alias: String,
    /// Activity running the asset extractor.
    pub activity_name: String,
    /// Activity running the quantity take-off extractor.
    pub qto_activity_name: String,
    /// Local folder holding the `<name>.zip` app bundle packages.
    pub bundles_folder: PathBuf,
}

impl DesignAutomationConfig {
    pub fn activity_for(&self, kind: ExtractionKind) -> &str {
        match kind {
            ExtractionKind::Assets => &self.activity_name,
            ExtractionKind::QuantityTakeoff => &self.qto_activity_name,
        }
    }

    /// `nickname.name+alias`.
    pub fn qualified_id(&self, name: &str) -> String {
        format!("{}.{}+{}", self.nickname, name, self.alias)
    }
}

impl Default for DesignAutomationConfig {
    fn default() -> Self {
        Self {
            nickname: String::new(),
            alias: "dev".into(),
            activity_name: "ExtractAssetsActivity".into(),
            qto_activity_name: "RevitQtoActivity".into(),
            bundles_folder: PathBuf::from("bundles"),
        }
    }
}

impl ForgeConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                               | Default                              |
    /// |---------------------------------------|--------------------------------------|
    /// | `FORGE_BASE_URL`                      | `https://developer.api.autodesk.com` |
    /// | `FORGE_ACCESS_TOKEN`                  | (required)                           |
    /// | `FORGE_CLIENT_ID`                     | empty                                |
    /// | `FORGE_WEBHOOK_URL`                   | `http://localhost:3000`              |
    /// | `DESIGN_AUTOMATION_NICKNAME`          | `FORGE_CLIENT_ID`                    |
    /// | `DESIGN_AUTOMATION_ALIAS`             | `dev`                                |
    /// | `DESIGN_AUTOMATION_ACTIVITY_NAME`     | `ExtractAssetsActivity`              |
    /// | `DESIGN_AUTOMATION_QTO_ACTIVITY_NAME` | `RevitQtoActivity`                   |
    /// | `DESIGN_AUTOMATION_BUNDLES_FOLDER`    | `bundles`                            |
    /// | `FORGE_MAX_RETRIES`                   | `7`                                  |
    /// | `FORGE_BACKOFF_MS`                    | `4000`                               |
    /// | `FORGE_REQUEST_TIMEOUT_MS`            | `25000`                              |
    pub fn from_env() -> Self {
        let base_url = std::env::var("FORGE_BASE_URL")
            .unwrap_or_else(|_| "https://developer.api.autodesk.com".into());

        let access_token =
            std::env::var("FORGE_ACCESS_TOKEN").expect("FORGE_ACCESS_TOKEN must be set");

        let client_id = std::env::var("FORGE_CLIENT_ID").unwrap_or_default();

        let webhook_url =
            std::env::var("FORGE_WEBHOOK_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        let defaults = DesignAutomationConfig::default();
        let design_automation = DesignAutomationConfig {
            nickname: std::env::var("DESIGN_AUTOMATION_NICKNAME").unwrap_or(client_id),
            alias: std::env::var("DESIGN_AUTOMATION_ALIAS").unwrap_or(defaults.alias),
            activity_name: std::env::var("DESIGN_AUTOMATION_ACTIVITY_NAME")
                .unwrap_or(defaults.activity_name),
            qto_activity_name: std::env::var("DESIGN_AUTOMATION_QTO_ACTIVITY_NAME")
                .unwrap_or(defaults.qto_activity_name),
            bundles_folder: std::env::var("DESIGN_AUTOMATION_BUNDLES_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.bundles_folder),
        };

        let max_retries: u32 = std::env::var("FORGE_MAX_RETRIES")
            .unwrap_or_else(|_| "7".into())
            .parse()
            .expect("FORGE_MAX_RETRIES must be a valid u32");

        let backoff_ms: u64 = std::env::var("FORGE_BACKOFF_MS")
            .unwrap_or_else(|_| "4000".into())
            .parse()
            .expect("FORGE_BACKOFF_MS must be a valid u64");

        let request_timeout_ms: u64 = std::env::var("FORGE_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "25000".into())
            .parse()
            .expect("FORGE_REQUEST_TIMEOUT_MS must be a valid u64");

        Self {
            base_url,
            access_token,
            webhook_url,
            design_automation,
            retry: RetryConfig {
                max_retries,
                backoff_delay: Duration::from_millis(backoff_ms),
                request_timeout: Duration::from_millis(request_timeout_ms),
                ..Default::default()
            },
        }
    }
}
