use serde::{Deserialize, Serialize};

/// The kind of product the landing page is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "AI SaaS")]
    AiSaas,
    #[serde(rename = "Productivity Tool")]
    ProductivityTool,
    #[serde(rename = "Startup")]
    Startup,
}

impl Category {
    /// The literal label embedded in the prompt and shown in the selector.
    pub fn label(&self) -> &'static str {
        match self {
            Category::AiSaas => "AI SaaS",
            Category::ProductivityTool => "Productivity Tool",
            Category::Startup => "Startup",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::all().into_iter().find(|c| c.label().to_lowercase() == wanted)
    }

    pub fn all() -> Vec<Category> {
        vec![Category::AiSaas, Category::ProductivityTool, Category::Startup]
    }

    pub fn next(&self) -> Self {
        match self {
            Category::AiSaas => Category::ProductivityTool,
            Category::ProductivityTool => Category::Startup,
            Category::Startup => Category::AiSaas,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Category::AiSaas => Category::Startup,
            Category::ProductivityTool => Category::AiSaas,
            Category::Startup => Category::ProductivityTool,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ai_saas() {
        assert_eq!(Category::default(), Category::AiSaas);
    }

    #[test]
    fn test_from_label_is_case_insensitive() {
        assert_eq!(Category::from_label("productivity tool"), Some(Category::ProductivityTool));
        assert_eq!(Category::from_label(" Startup "), Some(Category::Startup));
        assert_eq!(Category::from_label("Marketplace"), None);
    }

    #[test]
    fn test_next_and_prev_cycle_through_all() {
        let mut c = Category::AiSaas;
        for _ in 0..3 {
            c = c.next();
        }
        assert_eq!(c, Category::AiSaas);
        assert_eq!(Category::AiSaas.prev(), Category::Startup);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&Category::ProductivityTool).unwrap();
        assert_eq!(json, "\"Productivity Tool\"");
    }
}
