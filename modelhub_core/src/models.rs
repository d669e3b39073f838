use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_CONFIG_PATH: &str = "models.yaml";

/// The single repository location the catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub config_path: String,
}

impl Binding {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        config_path: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            config_path: config_path.into(),
        }
    }

    /// Cache key covering all four fields.
    ///
    /// Each field is length-prefixed so values containing `/` cannot collide
    /// (`a/b` + `c` and `a` + `b/c` produce different signatures).
    pub fn signature(&self) -> String {
        [&self.owner, &self.repo, &self.branch, &self.config_path]
            .iter()
            .map(|field| format!("{}:{field}", field.len()))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}:{}",
            self.owner, self.repo, self.branch, self.config_path
        )
    }
}

/// Input to `CatalogService::connect`. Branch and config path are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    #[serde(alias = "repoOwner")]
    pub owner: String,
    #[serde(alias = "repoName")]
    pub repo: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub config_path: Option<String>,
}

impl ConnectRequest {
    /// Validate required fields and fill defaults.
    pub fn into_binding(self) -> Result<Binding> {
        let owner = self.owner.trim().to_string();
        let repo = self.repo.trim().to_string();
        if owner.is_empty() || repo.is_empty() {
            return Err(Error::InvalidInput(
                "repo owner and repo name are required".to_string(),
            ));
        }
        let branch = non_blank(self.branch).unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        let config_path =
            non_blank(self.config_path).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Ok(Binding {
            owner,
            repo,
            branch,
            config_path,
        })
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Lifecycle stage of a model. Unknown inputs normalize to `Development`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    #[default]
    Development,
    Staging,
    Production,
    Archived,
}

impl ModelStatus {
    /// Exact, case-sensitive match against the four canonical names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "development" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "production" => Some(Self::Production),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
}

/// Repository paths of files that belong to a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_card: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_file: Option<String>,
}

impl ModelFiles {
    /// Named paths that are set, in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("modelCard", &self.model_card),
            ("trainingScript", &self.training_script),
            ("featureScript", &self.feature_script),
            ("inferenceScript", &self.inference_script),
            ("modelFile", &self.model_file),
        ]
        .into_iter()
        .filter_map(|(name, path)| path.as_deref().map(|p| (name, p)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_path: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub columns: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub added_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub datasets: Vec<Dataset>,
}

/// A normalized catalog record. Produced by `catalog::parse_catalog`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub framework: String,
    pub status: ModelStatus,
    pub owner: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ModelMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<ModelFiles>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<ModelVersion>,
}

/// Read a string field; `null` reads as empty. YAML plain scalars such as
/// `1.10` or `42` keep their source text. JSON numbers are rejected.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` reads as an empty sequence.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
