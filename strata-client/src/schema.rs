/// Schema set for the one-shot subscription exchange.
///
/// The service replaces its active schema set atomically with whatever a
/// subscribe call carries: every call must therefore include the complete
/// desired set. Schemas omitted from the set are dropped along with their
/// data; a rejected set changes nothing.
///
/// Sources are raw schema file contents, unmodified. Discovering and reading
/// the files is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    sources: Vec<String>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one schema source text.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn push(&mut self, source: impl Into<String>) {
        self.sources.push(source.into());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// An empty set is legal: it asks the service to drop every schema.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

impl FromIterator<String> for SchemaSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl Extend<String> for SchemaSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.sources.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_preserves_source_order() {
        let set: SchemaSet = ["syntax = \"proto3\";".to_string(), "// second".to_string()]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 2);
        assert!(set.sources()[1].contains("second"));
    }
}
