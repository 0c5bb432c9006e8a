use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".modfence.toml";
pub const DEFAULT_SNAPSHOT_FILE: &str = "modfence.units.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Validated project configuration. Declarations here merge over the
/// tag-derived ones in the snapshot; config wins where both declare the
/// same thing.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub detection: DetectionConfig,
    /// Per-module declarations keyed by logical module name.
    pub modules: BTreeMap<String, ModuleConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct DetectionConfig {
    pub strategy: StrategyKind,
    /// Extra scan roots, scanned with the primary strategy.
    pub roots: Vec<String>,
    /// Explicit module base namespaces contributed directly.
    pub bases: Vec<String>,
    /// Depth bound for the annotated scan, relative to each scan root.
    pub max_depth: Option<usize>,
}

/// Detection strategy selector. The two built-ins are closed; anything
/// else names an externally registered candidate source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    DirectChildren,
    ExplicitlyAnnotated,
    Custom(String),
}

impl StrategyKind {
    pub fn parse(value: &str) -> Self {
        match value {
            "direct-children" => Self::DirectChildren,
            "explicitly-annotated" => Self::ExplicitlyAnnotated,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectChildren => write!(f, "direct-children"),
            Self::ExplicitlyAnnotated => write!(f, "explicitly-annotated"),
            Self::Custom(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleConfig {
    /// Explicit base namespace. Also contributes the base to detection.
    pub namespace: Option<String>,
    pub open: Option<bool>,
    /// `Some` overrides any tag-declared expressions, even when empty.
    pub allowed_dependencies: Option<Vec<String>>,
    pub interfaces: Vec<InterfaceConfig>,
}

#[derive(Debug, Clone)]
pub struct InterfaceConfig {
    pub name: String,
    /// Declaration namespace; the module base when omitted.
    pub namespace: Option<String>,
    pub recursive: bool,
    pub include: Option<String>,
    pub exclude: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    detection: Option<RawDetection>,
    modules: Option<BTreeMap<String, RawModule>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawDetection {
    strategy: Option<String>,
    roots: Option<Vec<String>>,
    modules: Option<Vec<String>>,
    max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawModule {
    namespace: Option<String>,
    open: Option<bool>,
    allowed_dependencies: Option<Vec<String>>,
    interfaces: Option<Vec<RawInterface>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawInterface {
    name: String,
    namespace: Option<String>,
    recursive: Option<bool>,
    include: Option<String>,
    exclude: Option<String>,
}

impl Config {
    pub fn load(project_path: &Path) -> Result<Self, ConfigError> {
        let config_path = project_path.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;

        let detection = match raw.detection {
            Some(d) => DetectionConfig {
                strategy: d
                    .strategy
                    .as_deref()
                    .map(StrategyKind::parse)
                    .unwrap_or_default(),
                roots: d.roots.unwrap_or_default(),
                bases: d.modules.unwrap_or_default(),
                max_depth: d.max_depth,
            },
            None => DetectionConfig::default(),
        };

        let modules = match raw.modules {
            Some(map) => map
                .into_iter()
                .map(|(name, raw_m)| {
                    let interfaces = raw_m
                        .interfaces
                        .unwrap_or_default()
                        .into_iter()
                        .map(|raw_i| InterfaceConfig {
                            name: raw_i.name,
                            namespace: raw_i.namespace,
                            recursive: raw_i.recursive.unwrap_or(false),
                            include: raw_i.include,
                            exclude: raw_i.exclude,
                        })
                        .collect();

                    let module = ModuleConfig {
                        namespace: raw_m.namespace,
                        open: raw_m.open,
                        allowed_dependencies: raw_m.allowed_dependencies,
                        interfaces,
                    };
                    (name, module)
                })
                .collect(),
            None => BTreeMap::new(),
        };

        Ok(Self { detection, modules })
    }
}

/// Starter configuration written by `modfence init`.
pub fn generate_config_template() -> String {
    r#"# modfence configuration
# Declarations here merge over tags carried in the snapshot; config wins
# where both declare the same thing.

[detection]
# direct-children | explicitly-annotated | <custom source id>
strategy = "direct-children"
# Extra scan roots, scanned with the primary strategy.
roots = []
# Explicit module base namespaces.
modules = []
# Depth bound for the annotated scan.
# max-depth = 3

# [modules.inventory]
# open = false
# allowed-dependencies = ["order :: spi"]

# [modules.order]
# namespace = "example.order"

# [[modules.order.interfaces]]
# name = "spi"
# namespace = "example.order.spi"
# recursive = true
# include = "**"
# exclude = "**/Internal*"
"#
    .to_string()
}
