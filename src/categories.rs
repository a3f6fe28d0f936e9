use crate::error::{Result, TaskError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CATEGORIES: [&str; 3] = ["Academic", "Personal", "Work"];

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub trait CategoryProvider: Send + Sync {
    fn fetch_categories(&self) -> Result<Vec<String>>;
}

/// A fixed list, used when no remote endpoint is configured.
pub struct StaticCategories {
    pub labels: Vec<String>,
}

impl Default for StaticCategories {
    fn default() -> Self {
        Self { labels: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect() }
    }
}

impl CategoryProvider for StaticCategories {
    fn fetch_categories(&self) -> Result<Vec<String>> {
        Ok(self.labels.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoriesBody {
    List(Vec<String>),
    Wrapped { categories: Vec<String> },
}

/// Fetches labels with a blocking GET. Must not be called from inside an
/// async task; the server goes through `spawn_blocking`.
pub struct HttpCategories {
    pub url: String,
}

impl HttpCategories {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string() }
    }
}

impl CategoryProvider for HttpCategories {
    fn fetch_categories(&self) -> Result<Vec<String>> {
        log::debug!("fetching categories from {}", self.url);
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| TaskError::RemoteFetch(e.to_string()))?;
        let resp = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TaskError::RemoteFetch(e.to_string()))?;
        let body: CategoriesBody = resp.json().map_err(|e| TaskError::RemoteFetch(e.to_string()))?;
        Ok(match body {
            CategoriesBody::List(labels) => labels,
            CategoriesBody::Wrapped { categories } => categories,
        })
    }
}

/// The category labels known at submission time.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct CategorySet {
    labels: Vec<String>,
}

impl CategorySet {
    /// Blank and repeated labels are dropped; order is kept.
    pub fn new(labels: Vec<String>) -> Self {
        let mut kept: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.trim().to_string();
            if !label.is_empty() && !kept.contains(&label) {
                kept.push(label);
            }
        }
        Self { labels: kept }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Checks a submitted category. With no known categories any non-empty
    /// value passes, so a failed fetch never blocks task creation.
    pub fn validate<'a>(&self, raw: &'a str) -> Result<&'a str> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TaskError::Validation { field: "category" });
        }
        if self.labels.is_empty() || self.labels.iter().any(|l| l == raw) {
            Ok(raw)
        } else {
            Err(TaskError::UnknownCategory(raw.to_string()))
        }
    }
}

/// Fetches categories, turning a failure into an empty set plus the error.
pub fn fetch_or_empty(provider: &dyn CategoryProvider) -> (CategorySet, Option<TaskError>) {
    match provider.fetch_categories() {
        Ok(labels) => {
            let set = CategorySet::new(labels);
            if set.is_empty() {
                log::warn!("no categories available");
            }
            (set, None)
        }
        Err(e) => {
            log::warn!("{}", e);
            (CategorySet::default(), Some(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl CategoryProvider for Failing {
        fn fetch_categories(&self) -> Result<Vec<String>> {
            Err(TaskError::RemoteFetch("connection refused".into()))
        }
    }

    #[test]
    fn static_provider_has_defaults() {
        let (set, err) = fetch_or_empty(&StaticCategories::default());
        assert!(err.is_none());
        assert_eq!(set.labels(), ["Academic", "Personal", "Work"]);
    }

    #[test]
    fn failed_fetch_gives_empty_set_and_diagnostic() {
        let (set, err) = fetch_or_empty(&Failing);
        assert!(set.is_empty());
        assert!(matches!(err, Some(TaskError::RemoteFetch(_))));
    }

    #[test]
    fn validate_against_known_labels() {
        let set = CategorySet::new(vec!["Work".into(), "Personal".into()]);
        assert_eq!(set.validate(" Work ").unwrap(), "Work");
        assert!(matches!(set.validate("Gym"), Err(TaskError::UnknownCategory(_))));
        assert!(matches!(set.validate(""), Err(TaskError::Validation { field: "category" })));
    }

    #[test]
    fn empty_set_accepts_any_label() {
        let set = CategorySet::default();
        assert_eq!(set.validate("Gym").unwrap(), "Gym");
        assert!(set.validate("   ").is_err());
    }

    #[test]
    fn new_drops_blanks_and_duplicates() {
        let set = CategorySet::new(vec!["Work".into(), " ".into(), "Work".into(), "Home".into()]);
        assert_eq!(set.labels(), ["Work", "Home"]);
    }

    #[test]
    fn body_shapes() {
        let list: CategoriesBody = serde_json::from_str(r#"["A","B"]"#).unwrap();
        assert!(matches!(list, CategoriesBody::List(ref v) if v.len() == 2));
        let wrapped: CategoriesBody = serde_json::from_str(r#"{"categories":["C"]}"#).unwrap();
        assert!(matches!(wrapped, CategoriesBody::Wrapped { ref categories } if categories == &["C"]));
    }
}
