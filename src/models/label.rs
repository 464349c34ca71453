use serde::{Deserialize, Serialize};

/// A `(category, name)` tag applied to monitors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub category: String,
    pub name: String,
}

impl Label {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: None,
            category: category.into(),
            name: name.into(),
        }
    }

    /// The `category:name` form the label endpoints address labels by.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.category, self.name)
    }

    pub fn parse(reference: &str) -> Option<Self> {
        let (category, name) = reference.split_once(':')?;
        if category.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(category, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_round_trip() {
        let label = Label::parse("env:prod:eu").unwrap();
        assert_eq!(label.category, "env");
        assert_eq!(label.name, "prod:eu");
        assert_eq!(label.reference(), "env:prod:eu");
        assert!(Label::parse("no-separator").is_none());
        assert!(Label::parse(":x").is_none());
    }
}
