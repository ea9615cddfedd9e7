use crate::adapters::report::OutputFormat;
use crate::core::resolver::ResolverOptions;
use crate::domain::model::PlateSpec;
use crate::domain::ports::PlateGeometryLookup;
use crate::utils::error::{PickListError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Run configuration loaded from TOML. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub resolver: ResolverConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
    /// Plate geometry keyed by plate type.
    pub labware: BTreeMap<String, PlateSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub check_geometry: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_geometry: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub path: Option<String>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

impl RunConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PickListError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PickListError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LABWARE_DROP})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            max_depth: self.resolver.max_depth,
        }
    }

    /// Plate geometry to validate against, if any is configured and enabled.
    pub fn geometry(&self) -> Option<&dyn PlateGeometryLookup> {
        if self.validation.check_geometry && !self.labware.is_empty() {
            Some(&self.labware as &dyn PlateGeometryLookup)
        } else {
            None
        }
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        if let Some(max_depth) = self.resolver.max_depth {
            validation::validate_positive_number("resolver.max_depth", max_depth, 1)?;
        }

        if let Some(path) = &self.output.path {
            validation::validate_path("output.path", path)?;
        }

        for (plate_type, spec) in &self.labware {
            validation::validate_non_empty_string("labware", plate_type)?;
            if let Some(drop_volume) = spec.drop_volume {
                validation::validate_positive_float(
                    &format!("labware.{}.drop_volume", plate_type),
                    drop_volume,
                )?;
            }
        }

        Ok(())
    }
}
