//! Design automation (headless Revit) API: engines, app bundles,
//! activities and workitem submission.

use std::io::ErrorKind;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use takeoff_core::catalog::JobSubmitter;
use takeoff_core::error::CoreError;
use takeoff_core::job::ExtractionKind;
use takeoff_core::types::JobId;

use crate::api::{ForgeApi, ForgeApiError};
use crate::config::DesignAutomationConfig;
use crate::messages::WorkitemResponse;
use crate::storage::ObjectLocation;

const DA_PATH: &str = "/da/us-east/v3";

/// Server path receiving the `result.json` upload, followed by `/{key}`.
pub const RESULTS_CALLBACK_PATH: &str = "/api/forge/callback/designautomation/results";
/// Server path receiving the completion callback, followed by `/{key}`.
pub const COMPLETE_CALLBACK_PATH: &str = "/api/forge/callback/designautomation";

/// One page of a design automation list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    #[serde(default)]
    data: Vec<String>,
    #[serde(default)]
    pagination_token: Option<String>,
}

/// Version record returned when an app bundle or a new version of one is
/// created.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppBundleVersion {
    version: u32,
    upload_parameters: UploadParameters,
}

/// Pre-signed target for the bundle zip.
#[derive(Debug, Deserialize)]
struct UploadParameters {
    #[serde(rename = "endpointURL")]
    endpoint_url: String,
    #[serde(rename = "formData", default)]
    form_data: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppBundleCreation {
    /// Fully qualified id, `nickname.name+alias`.
    pub app_bundle: String,
    /// Version the alias now points at.
    pub version: u32,
}

/// Whether `create_activity` made anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityState {
    Created,
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityCreation {
    /// Fully qualified id, `nickname.name+alias`.
    pub activity: String,
    pub status: ActivityState,
}

/// Client for the design automation service.
#[derive(Clone)]
pub struct DesignAutomationApi {
    api: ForgeApi,
    config: DesignAutomationConfig,
    webhook_url: String,
}

impl DesignAutomationApi {
    /// * `webhook_url` - public base URL of the takeoff server, used for
    ///   the workitem result and completion callbacks.
    pub fn new(api: ForgeApi, config: DesignAutomationConfig, webhook_url: impl Into<String>) -> Self {
        Self {
            api,
            config,
            webhook_url: webhook_url.into().trim_end_matches('/').to_string(),
        }
    }

    // ---- engines & activities ----

    /// Revit engine ids, sorted.
    pub async fn revit_engines(&self) -> Result<Vec<String>, ForgeApiError> {
        let mut engines: Vec<String> = self
            .list_all("engines")
            .await?
            .into_iter()
            .filter(|engine| engine.contains("Revit"))
            .collect();
        engines.sort();
        Ok(engines)
    }

    /// Activities owned by this nickname, without the nickname prefix and
    /// without `$LATEST` aliases.
    pub async fn defined_activities(&self) -> Result<Vec<String>, ForgeApiError> {
        let prefix = format!("{}.", self.config.nickname);
        Ok(self
            .list_all("activities")
            .await?
            .into_iter()
            .filter(|id| id.starts_with(&self.config.nickname) && !id.contains("$LATEST"))
            .map(|id| id.strip_prefix(&prefix).map(str::to_string).unwrap_or(id))
            .collect())
    }

    /// Create `<file_name>Activity` bound to `<file_name>AppBundle`, plus
    /// its alias, unless it already exists.
    pub async fn create_activity(
        &self,
        file_name: &str,
        engine: &str,
    ) -> Result<ActivityCreation, ForgeApiError> {
        let app_bundle_name = format!("{file_name}AppBundle");
        let activity_name = format!("{file_name}Activity");
        let qualified_activity = self.config.qualified_id(&activity_name);

        let existing = self.list_all("activities").await?;
        if existing.contains(&qualified_activity) {
            return Ok(ActivityCreation {
                activity: qualified_activity,
                status: ActivityState::Existing,
            });
        }

        let spec = activity_spec(
            &activity_name,
            &self.config.qualified_id(&app_bundle_name),
            &app_bundle_name,
            engine,
        );
        self.api
            .post_unit(&format!("{DA_PATH}/activities"), &spec)
            .await?;

        let alias = json!({ "id": self.config.alias, "version": 1 });
        self.api
            .post_unit(&format!("{DA_PATH}/activities/{activity_name}/aliases"), &alias)
            .await?;

        tracing::info!(activity = %qualified_activity, engine, "Created design automation activity");
        Ok(ActivityCreation {
            activity: qualified_activity,
            status: ActivityState::Created,
        })
    }

    // ---- app bundles ----

    /// `.zip` packages in the local bundles folder, sorted.
    pub async fn local_app_bundles(&self) -> Result<Vec<String>, ForgeApiError> {
        let mut entries = tokio::fs::read_dir(&self.config.bundles_folder).await?;
        let mut packages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".zip") {
                packages.push(name);
            }
        }
        packages.sort();
        Ok(packages)
    }

    /// Publish `<file_name>.zip` from the bundles folder as
    /// `<file_name>AppBundle`.
    ///
    /// A bundle that already exists gets a new version and its alias is
    /// moved to it; otherwise the bundle and its alias are created at
    /// version 1. The zip is then uploaded to the returned pre-signed
    /// endpoint.
    pub async fn create_app_bundle(
        &self,
        file_name: &str,
        engine: &str,
    ) -> Result<AppBundleCreation, ForgeApiError> {
        let zip_name = format!("{file_name}.zip");
        let package_path = self.config.bundles_folder.join(&zip_name);
        let contents = match tokio::fs::read(&package_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ForgeApiError::InvalidRequest(format!(
                    "{} does not exist",
                    package_path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let app_bundle_name = format!("{file_name}AppBundle");
        let qualified_app_bundle = self.config.qualified_id(&app_bundle_name);
        let alias = &self.config.alias;

        let existing = self.list_all("appbundles").await?;
        let created: AppBundleVersion = if existing.contains(&qualified_app_bundle) {
            let version: AppBundleVersion = self
                .api
                .post_json(
                    &format!("{DA_PATH}/appbundles/{app_bundle_name}/versions"),
                    &json!({ "engine": engine, "description": app_bundle_name }),
                )
                .await?;
            self.api
                .patch_unit(
                    &format!("{DA_PATH}/appbundles/{app_bundle_name}/aliases/{alias}"),
                    &json!({ "version": version.version }),
                )
                .await?;
            version
        } else {
            let version: AppBundleVersion = self
                .api
                .post_json(
                    &format!("{DA_PATH}/appbundles"),
                    &json!({
                        "id": app_bundle_name,
                        "package": app_bundle_name,
                        "engine": engine,
                        "description": "Export asset information from Revit",
                    }),
                )
                .await?;
            self.api
                .post_unit(
                    &format!("{DA_PATH}/appbundles/{app_bundle_name}/aliases"),
                    &json!({ "id": alias, "version": version.version }),
                )
                .await?;
            version
        };

        let form = upload_form(&created.upload_parameters, zip_name, contents);
        self.api
            .upload_form(&created.upload_parameters.endpoint_url, form)
            .await?;

        tracing::info!(
            app_bundle = %qualified_app_bundle,
            version = created.version,
            engine,
            "Published design automation app bundle",
        );
        Ok(AppBundleCreation {
            app_bundle: qualified_app_bundle,
            version: created.version,
        })
    }

    pub async fn delete_app_bundle(&self, name: &str) -> Result<(), ForgeApiError> {
        self.api
            .delete(&format!("{DA_PATH}/appbundles/{}", urlencoding::encode(name)))
            .await
    }

    pub async fn delete_activity(&self, name: &str) -> Result<(), ForgeApiError> {
        self.api
            .delete(&format!("{DA_PATH}/activities/{}", urlencoding::encode(name)))
            .await
    }

    // ---- workitems ----

    /// Start a workitem running the activity for `kind` against the model
    /// at storage URN `target`.
    ///
    /// The result upload and completion callback both point back at the
    /// server under `callback_key`.
    pub async fn submit_workitem(
        &self,
        kind: ExtractionKind,
        target: &str,
        parameters: &serde_json::Value,
        callback_key: &str,
    ) -> Result<WorkitemResponse, ForgeApiError> {
        let location = ObjectLocation::parse(target)?;
        let activity_id = self.config.qualified_id(self.config.activity_for(kind));

        let body = json!({
            "activityId": activity_id,
            "arguments": {
                "inputFile": {
                    "url": location.object_url(self.api.base_url()),
                    "headers": { "Authorization": format!("Bearer {}", self.api.access_token()) },
                },
                "inputJson": { "url": data_url(parameters) },
                "outputJson": {
                    "verb": "put",
                    "url": format!("{}{RESULTS_CALLBACK_PATH}/{callback_key}", self.webhook_url),
                },
                "onComplete": {
                    "verb": "post",
                    "url": format!("{}{COMPLETE_CALLBACK_PATH}/{callback_key}", self.webhook_url),
                },
            },
        });

        let response: WorkitemResponse = self
            .api
            .post_json(&format!("{DA_PATH}/workitems"), &body)
            .await?;
        tracing::info!(
            workitem_id = %response.id,
            activity = %activity_id,
            status = %response.status,
            "Workitem submitted",
        );
        Ok(response)
    }

    // ---- private helpers ----

    /// Follow `paginationToken` until the list is exhausted.
    async fn list_all(&self, resource: &str) -> Result<Vec<String>, ForgeApiError> {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let path = match &token {
                Some(t) => format!("{DA_PATH}/{resource}?page={}", urlencoding::encode(t)),
                None => format!("{DA_PATH}/{resource}"),
            };
            let page: Page = self.api.get_json(&path).await?;
            items.extend(page.data);
            match page.pagination_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl JobSubmitter for DesignAutomationApi {
    async fn submit(
        &self,
        kind: ExtractionKind,
        target: &str,
        parameters: &serde_json::Value,
    ) -> Result<JobId, CoreError> {
        let key = uuid::Uuid::new_v4().simple().to_string();
        let response = self.submit_workitem(kind, target, parameters, &key).await?;
        Ok(JobId::new(response.id))
    }
}

/// Inline JSON argument: `data:application/json,<percent-encoded json>`.
fn data_url(value: &serde_json::Value) -> String {
    format!("data:application/json,{}", urlencoding::encode(&value.to_string()))
}

/// The pre-signed form fields followed by the package as `file`.
fn upload_form(params: &UploadParameters, zip_name: String, contents: Vec<u8>) -> Form {
    let form = params.form_data.iter().fold(Form::new(), |form, (key, value)| {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        form.text(key.clone(), text)
    });
    form.part("file", Part::bytes(contents).file_name(zip_name))
}

fn activity_spec(
    activity_name: &str,
    qualified_app_bundle: &str,
    app_bundle_name: &str,
    engine: &str,
) -> serde_json::Value {
    json!({
        "id": activity_name,
        "appbundles": [qualified_app_bundle],
        "commandLine": [format!(
            "$(engine.path)\\\\revitcoreconsole.exe /i \"$(args[inputFile].path)\" /al \"$(appbundles[{app_bundle_name}].path)\""
        )],
        "engine": engine,
        "parameters": {
            "inputFile": { "verb": "get", "description": "input revit file", "required": true },
            "inputJson": { "verb": "get", "description": "input Json parameters", "localName": "params.json" },
            "outputJson": { "verb": "put", "description": "output result file", "localName": "result.json" },
        },
    })
}
