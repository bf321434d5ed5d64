//! Label Setting: URL prefixes mapped to ordered lanes of label titles.

use crate::ConfigError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// A ring of label titles. The successor of the last title is the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Lane(Vec<String>);

impl Lane {
    /// Build a lane, rejecting empty lanes and empty titles.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyLane`] or [`ConfigError::EmptyLabel`] positioned at
    /// lane 0 of an unnamed key.
    pub fn new<I, S>(titles: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let titles: Vec<String> = titles.into_iter().map(Into::into).collect();
        if titles.is_empty() {
            return Err(ConfigError::EmptyLane {
                key: String::new(),
                lane: 0,
            });
        }
        if let Some(index) = titles.iter().position(String::is_empty) {
            return Err(ConfigError::EmptyLabel {
                key: String::new(),
                lane: 0,
                index,
            });
        }
        Ok(Self(titles))
    }

    /// First title of the lane, the one an imitated label adds.
    #[inline]
    pub fn head(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    #[inline]
    pub fn titles(&self) -> &[String] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of the first occurrence of `title`.
    #[inline]
    pub fn position(&self, title: &str) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == title)
    }

    /// The title that follows `title`, wrapping at the end of the lane.
    pub fn next_after(&self, title: &str) -> Option<&str> {
        let index = self.position(title)?;
        self.0
            .get((index + 1) % self.0.len())
            .map(String::as_str)
    }
}

/// Whether `key` looks like `http(s)://host...` and parses as a URL.
fn is_url_prefix(key: &str) -> bool {
    let rest = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"));
    let has_host = rest.is_some_and(|rest| rest.chars().next().is_some_and(|first| first != '/'));
    has_host && Url::parse(key).is_ok()
}

/// `prefix` is a prefix of `url` ending on a URL boundary.
fn matches_prefix(prefix: &str, url: &str) -> bool {
    let Some(rest) = url.strip_prefix(prefix) else {
        return false;
    };
    prefix.ends_with('/')
        || rest.is_empty()
        || rest.starts_with('/')
        || rest.starts_with('?')
        || rest.starts_with('#')
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSetting(BTreeMap<String, Vec<Lane>>);

impl LabelSetting {
    /// Schema-checked parse of a `labelSetting` JSON value.
    ///
    /// # Errors
    /// Returns the first violation: a non-object, a key that is not an http(s) URL
    /// prefix, a non-array lane list or lane, an empty lane, or a non-string/empty label.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::LabelSettingNotAnObject);
        };
        let mut setting = BTreeMap::new();
        for (key, lanes) in map {
            if !is_url_prefix(key) {
                return Err(ConfigError::InvalidPrefix { key: key.clone() });
            }
            let Value::Array(lanes) = lanes else {
                return Err(ConfigError::LanesNotAnArray { key: key.clone() });
            };
            let mut parsed = Vec::with_capacity(lanes.len());
            for (lane_index, lane) in lanes.iter().enumerate() {
                parsed.push(Self::parse_lane(key, lane_index, lane)?);
            }
            setting.insert(key.clone(), parsed);
        }
        Ok(Self(setting))
    }

    fn parse_lane(key: &str, lane: usize, value: &Value) -> Result<Lane, ConfigError> {
        let Value::Array(items) = value else {
            return Err(ConfigError::LaneNotAnArray {
                key: key.to_owned(),
                lane,
            });
        };
        if items.is_empty() {
            return Err(ConfigError::EmptyLane {
                key: key.to_owned(),
                lane,
            });
        }
        let mut titles = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Value::String(title) = item else {
                return Err(ConfigError::LabelNotAString {
                    key: key.to_owned(),
                    lane,
                    index,
                });
            };
            if title.is_empty() {
                return Err(ConfigError::EmptyLabel {
                    key: key.to_owned(),
                    lane,
                    index,
                });
            }
            titles.push(title.clone());
        }
        Ok(Lane(titles))
    }

    /// Programmatic builder.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidPrefix`] if `prefix` is not an http(s) URL prefix.
    pub fn insert(&mut self, prefix: &str, lanes: Vec<Lane>) -> Result<(), ConfigError> {
        if !is_url_prefix(prefix) {
            return Err(ConfigError::InvalidPrefix {
                key: prefix.to_owned(),
            });
        }
        self.0.insert(prefix.to_owned(), lanes);
        Ok(())
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Lane])> {
        self.0
            .iter()
            .map(|(prefix, lanes)| (prefix.as_str(), lanes.as_slice()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lanes of the longest prefix matching `url`; empty when nothing matches.
    pub fn lanes_for_url(&self, url: &str) -> &[Lane] {
        self.0
            .iter()
            .filter(|(prefix, _)| matches_prefix(prefix, url))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, lanes)| lanes.as_slice())
            .unwrap_or_default()
    }

    /// Origins (`scheme://host[:port]`) of every prefix, for building allowlists.
    pub fn origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = self
            .0
            .keys()
            .filter_map(|prefix| Url::parse(prefix).ok())
            .map(|url| url.origin().ascii_serialization())
            .collect();
        origins.sort();
        origins.dedup();
        origins
    }
}
