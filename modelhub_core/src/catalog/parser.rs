//! Catalog file parsing.
//!
//! A catalog is a list of model records, written either as a bare sequence or
//! as an object with a `models` field, in JSON or YAML. Each syntax family has
//! a fixed, ordered list of shape interpreters; the first one that parses and
//! yields a sequence wins.

use crate::models::{
    Model, ModelFiles, ModelMetrics, ModelStatus, ModelVersion, lenient_string, lenient_vec,
};
use crate::{Error, Result};
use serde::Deserialize;

const UNKNOWN: &str = "Unknown";
const UNNAMED: &str = "Unnamed Model";

/// Which parser a catalog file goes through, chosen from its path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyntaxFamily {
    Json,
    Yaml,
}

impl SyntaxFamily {
    /// `.yaml` / `.yml` (any case) select YAML; everything else is JSON.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            Self::Yaml
        } else {
            Self::Json
        }
    }

    fn interpreters(self) -> &'static [Interpreter] {
        match self {
            Self::Json => JSON_INTERPRETERS,
            Self::Yaml => YAML_INTERPRETERS,
        }
    }
}

/// Record as written in the file, before defaults are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModel {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    version: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    framework: String,
    #[serde(default, deserialize_with = "lenient_string")]
    status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    owner: String,
    #[serde(default, deserialize_with = "lenient_string")]
    created_at: String,
    #[serde(default, deserialize_with = "lenient_string")]
    updated_at: String,
    #[serde(default)]
    metrics: Option<ModelMetrics>,
    #[serde(default)]
    files: Option<ModelFiles>,
    #[serde(default, deserialize_with = "lenient_vec")]
    versions: Vec<ModelVersion>,
}

#[derive(Debug, Deserialize)]
struct Wrapped {
    #[serde(default)]
    models: Option<Vec<RawModel>>,
}

/// Outcome of one shape interpretation: `Ok(Some)` accepts, `Ok(None)` is a
/// miss, `Err` carries the syntax error.
type Interpretation = std::result::Result<Option<Vec<RawModel>>, String>;

struct Interpreter {
    shape: &'static str,
    interpret: fn(&[u8]) -> Interpretation,
}

const JSON_INTERPRETERS: &[Interpreter] = &[
    Interpreter {
        shape: "bare array",
        interpret: json_bare,
    },
    Interpreter {
        shape: "models object",
        interpret: json_wrapped,
    },
];

const YAML_INTERPRETERS: &[Interpreter] = &[
    Interpreter {
        shape: "bare sequence",
        interpret: yaml_bare,
    },
    Interpreter {
        shape: "models mapping",
        interpret: yaml_wrapped,
    },
];

// An empty JSON array is a valid empty catalog.
fn json_bare(content: &[u8]) -> Interpretation {
    serde_json::from_slice::<Option<Vec<RawModel>>>(content).map_err(|e| e.to_string())
}

fn json_wrapped(content: &[u8]) -> Interpretation {
    serde_json::from_slice::<Wrapped>(content)
        .map(|w| w.models)
        .map_err(|e| e.to_string())
}

// An empty YAML sequence is a miss, unlike JSON. See DESIGN.md.
fn yaml_bare(content: &[u8]) -> Interpretation {
    serde_yaml::from_slice::<Option<Vec<RawModel>>>(content)
        .map(|models| models.filter(|m| !m.is_empty()))
        .map_err(|e| e.to_string())
}

fn yaml_wrapped(content: &[u8]) -> Interpretation {
    serde_yaml::from_slice::<Wrapped>(content)
        .map(|w| w.models)
        .map_err(|e| e.to_string())
}

/// Parse catalog bytes into normalized models.
///
/// `path_hint` selects the syntax family and is echoed in errors.
#[tracing::instrument(level = "debug", skip(content), fields(bytes = content.len()))]
pub fn parse_catalog(content: &[u8], path_hint: &str) -> Result<Vec<Model>> {
    if content.is_empty() {
        return Err(Error::EmptyContent {
            path: path_hint.to_string(),
        });
    }

    let family = SyntaxFamily::from_path(path_hint);
    let mut last_error = None;
    for interpreter in family.interpreters() {
        match (interpreter.interpret)(content) {
            Ok(Some(raw)) => {
                tracing::debug!(
                    ?family,
                    shape = interpreter.shape,
                    count = raw.len(),
                    "catalog parsed"
                );
                return Ok(normalize(raw));
            }
            Ok(None) => {}
            Err(e) => last_error = Some(format!("{}: {e}", interpreter.shape)),
        }
    }

    Err(Error::Parse {
        path: path_hint.to_string(),
        detail: last_error.unwrap_or_else(|| "no models sequence found".to_string()),
    })
}

fn normalize(raw: Vec<RawModel>) -> Vec<Model> {
    raw.into_iter()
        .enumerate()
        .map(|(index, r)| normalize_model(index, r))
        .collect()
}

fn normalize_model(index: usize, raw: RawModel) -> Model {
    fn or_default(value: String, default: &str) -> String {
        if value.is_empty() {
            default.to_string()
        } else {
            value
        }
    }

    let id = if raw.id.is_empty() {
        format!("model-{index}")
    } else {
        raw.id
    };

    Model {
        id,
        name: or_default(raw.name, UNNAMED),
        version: or_default(raw.version, UNKNOWN),
        description: raw.description,
        framework: or_default(raw.framework, UNKNOWN),
        status: ModelStatus::parse(&raw.status).unwrap_or_default(),
        owner: or_default(raw.owner, UNKNOWN),
        created_at: or_default(raw.created_at, UNKNOWN),
        updated_at: or_default(raw.updated_at, UNKNOWN),
        metrics: raw.metrics,
        files: raw.files,
        versions: raw.versions,
    }
}
