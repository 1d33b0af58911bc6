use crate::errors::RelayError;
use std::path::PathBuf;

/// Where a recipe's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeSource {
    File(PathBuf),
    Inline { label: String, text: String },
}

impl RecipeSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        RecipeSource::File(path.into())
    }

    pub fn inline(label: impl Into<String>, text: impl Into<String>) -> Self {
        RecipeSource::Inline {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            RecipeSource::File(path) => path.display().to_string(),
            RecipeSource::Inline { label, .. } => label.clone(),
        }
    }

    pub fn is_present(&self) -> bool {
        match self {
            RecipeSource::File(path) => path.is_file(),
            RecipeSource::Inline { .. } => true,
        }
    }

    pub async fn read(&self) -> Result<String, RelayError> {
        match self {
            RecipeSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|err| {
                RelayError::missing_input(&[self.label()])
                    .with_hint(format!("Unable to read {}: {}", self.label(), err))
            }),
            RecipeSource::Inline { text, .. } => Ok(text.clone()),
        }
    }
}

/// Labels of every source that is not present, in the order given.
pub fn missing_sources(sources: &[&RecipeSource]) -> Vec<String> {
    sources
        .iter()
        .filter(|source| !source.is_present())
        .map(|source| source.label())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inline_source_is_always_present() {
        let source = RecipeSource::inline("initsend", "curl x");
        assert!(source.is_present());
        assert_eq!(source.read().await.unwrap(), "curl x");
        assert_eq!(source.label(), "initsend");
    }

    #[tokio::test]
    async fn missing_file_is_reported_by_label() {
        let path = std::env::temp_dir().join(format!("relay-missing-{}", uuid::Uuid::new_v4()));
        let source = RecipeSource::file(&path);
        let inline = RecipeSource::inline("tpl", "");
        assert_eq!(missing_sources(&[&source, &inline]), vec![source.label()]);
        let err = source.read().await.unwrap_err();
        assert_eq!(err.kind, crate::errors::RelayErrorKind::MissingInput);
    }
}
