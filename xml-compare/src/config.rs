use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use xml_compare_core::diff::evaluator::{Chain, DefaultSimilarity, NumericTolerance};
use xml_compare_core::diff::matcher::{DefaultNodeMatcher, NodeMatcher, Pairing as ChildPairing, PositionalMatcher};
use xml_compare_core::diff::path::PathError;
use xml_compare_core::diff::placeholder::{PlaceholderError, PlaceholderEvaluator};
use xml_compare_core::diff::selector::{
    by_name, by_name_and_all_attributes, by_name_and_attributes, by_name_and_text,
    by_name_and_text_rec, by_path, conditional_builder, ElementSelector,
};
use xml_compare_core::XmlNode;

/// How children of two compared nodes are paired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Pairing {
    /// Same index on both sides.
    #[default]
    Positional,
    /// First unpaired test element with the same name.
    ByName,
    /// Same name and same direct text.
    ByNameAndText,
    /// Same name and identical element/text structure below.
    ByNameAndTextRec,
}

/// Selector used by a per-element `[[rule]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorKind {
    ByName,
    ByNameAndText,
    ByNameAndTextRec,
    ByNameAndAttributes,
    ByNameAndAllAttributes,
    ByPath,
}

/// Pairing rule for elements with a given local name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub element: String,
    pub selector: SelectorKind,
    /// Attribute names for `by-name-and-attributes`.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Relative path for `by-path`.
    pub path: Option<String>,
}

/// Settings for one comparison, read from TOML and overridden by flags.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareConfig {
    pub pairing: Option<Pairing>,
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub similar: bool,
    #[serde(default)]
    pub placeholders: bool,
    #[serde(default)]
    pub ignore_comments: bool,
    #[serde(default)]
    pub ignore_attributes: Vec<String>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
    /// Prefix -> namespace URI used when printing positions.
    #[serde(default)]
    pub namespaces: BTreeMap<String, String>,
}

/// Errors returned when loading or applying comparison settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),
}

/// Load comparison settings from a TOML file.
pub fn load_config(path: &Path) -> Result<CompareConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&raw, path.display().to_string())
}

/// Parse and validate comparison settings.
pub fn parse_config(raw: &str, origin: String) -> Result<CompareConfig, ConfigError> {
    let config: CompareConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: origin,
        source,
    })?;
    config.validate()?;
    Ok(config)
}

impl CompareConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tolerance) = self.tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "tolerance must be a non-negative number, got {tolerance}"
                )));
            }
        }
        for rule in &self.rules {
            match rule.selector {
                SelectorKind::ByPath if rule.path.is_none() => {
                    return Err(ConfigError::Invalid(format!(
                        "rule for '{}' uses by-path without a path",
                        rule.element
                    )));
                }
                SelectorKind::ByNameAndAttributes if rule.attributes.is_empty() => {
                    return Err(ConfigError::Invalid(format!(
                        "rule for '{}' uses by-name-and-attributes without attributes",
                        rule.element
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Child pairing strategy for these settings.
    pub fn node_matcher(&self) -> Result<ConfiguredMatcher, ConfigError> {
        let pairing = self.pairing.unwrap_or_default();
        if pairing == Pairing::Positional && self.rules.is_empty() {
            return Ok(ConfiguredMatcher::Positional(PositionalMatcher));
        }

        let mut builder = conditional_builder();
        for rule in &self.rules {
            builder = builder
                .when_element_is_named(rule.element.as_str())
                .then_use(BoxedSelector(rule_selector(rule)?));
        }
        let selector = match pairing {
            Pairing::Positional | Pairing::ByName => builder.else_use(by_name()),
            Pairing::ByNameAndText => builder.else_use(by_name_and_text()),
            Pairing::ByNameAndTextRec => builder.else_use(by_name_and_text_rec()),
        }
        .build();

        let mut matcher = DefaultNodeMatcher::new(selector);
        if pairing != Pairing::ByName && pairing != Pairing::Positional {
            matcher = matcher.then_try(by_name());
        }
        Ok(ConfiguredMatcher::Selective(matcher))
    }

    /// Evaluator chain: placeholders, then numeric tolerance, then similarity.
    pub fn evaluator(&self) -> Result<Chain, ConfigError> {
        let mut chain = Chain::new();
        if self.placeholders {
            chain = chain.then(PlaceholderEvaluator::new()?);
        }
        if let Some(tolerance) = self.tolerance {
            chain = chain.then(NumericTolerance::new(tolerance));
        }
        if self.similar {
            chain = chain.then(DefaultSimilarity);
        }
        Ok(chain)
    }
}

fn rule_selector(rule: &RuleConfig) -> Result<Box<dyn ElementSelector>, ConfigError> {
    let selector: Box<dyn ElementSelector> = match rule.selector {
        SelectorKind::ByName => Box::new(by_name()),
        SelectorKind::ByNameAndText => Box::new(by_name_and_text()),
        SelectorKind::ByNameAndTextRec => Box::new(by_name_and_text_rec()),
        SelectorKind::ByNameAndAllAttributes => Box::new(by_name_and_all_attributes()),
        SelectorKind::ByNameAndAttributes => {
            let names: Vec<&str> = rule.attributes.iter().map(String::as_str).collect();
            Box::new(by_name_and_attributes(&names))
        }
        SelectorKind::ByPath => {
            let path = rule.path.as_deref().ok_or_else(|| {
                ConfigError::Invalid(format!("rule for '{}' needs a path", rule.element))
            })?;
            Box::new(by_path(path, by_name_and_text())?)
        }
    };
    Ok(selector)
}

struct BoxedSelector(Box<dyn ElementSelector>);

impl ElementSelector for BoxedSelector {
    fn can_be_compared(&self, control: &XmlNode, test: &XmlNode) -> bool {
        self.0.can_be_compared(control, test)
    }
}

/// Matcher chosen from [`CompareConfig`].
pub enum ConfiguredMatcher {
    Positional(PositionalMatcher),
    Selective(DefaultNodeMatcher),
}

impl NodeMatcher for ConfiguredMatcher {
    fn match_nodes(&self, control: &[&XmlNode], test: &[&XmlNode]) -> ChildPairing {
        match self {
            ConfiguredMatcher::Positional(matcher) => matcher.match_nodes(control, test),
            ConfiguredMatcher::Selective(matcher) => matcher.match_nodes(control, test),
        }
    }
}
