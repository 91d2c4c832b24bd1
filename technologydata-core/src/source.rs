//! Bibliographic references attached to parameters.

use serde::{Deserialize, Serialize};

/// A bibliographic or web source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_archive: Option<String>,
    /// Date the URL was accessed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urldate: Option<String>,
    /// Date the URL was archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urldate_archive: Option<String>,
}

impl Source {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authors: None,
            url: None,
            url_archive: None,
            urldate: None,
            urldate_archive: None,
        }
    }
}

/// An ordered collection of sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceCollection {
    sources: Vec<Source>,
}

impl SourceCollection {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Appends a source unless an equal one is already present.
    pub fn push(&mut self, source: Source) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Sources of both collections, in order, without duplicates.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for source in &other.sources {
            merged.push(source.clone());
        }
        merged
    }
}

impl FromIterator<Source> for SourceCollection {
    fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
        let mut collection = Self::default();
        for source in iter {
            collection.push(source);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a SourceCollection {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_preserves_order() {
        let a: SourceCollection = [Source::new("DEA"), Source::new("IEA")].into_iter().collect();
        let b: SourceCollection = [Source::new("IEA"), Source::new("NREL")].into_iter().collect();

        let names: Vec<_> = a.union(&b).iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["DEA", "IEA", "NREL"]);
    }

    #[test]
    fn test_json_is_a_list() {
        let mut source = Source::new("DEA");
        source.url = Some("https://ens.dk".to_string());
        let collection = SourceCollection::new(vec![source]);

        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"[{"name":"DEA","url":"https://ens.dk"}]"#);
        assert_eq!(serde_json::from_str::<SourceCollection>(&json).unwrap(), collection);
    }
}
