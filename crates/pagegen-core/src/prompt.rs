use crate::category::Category;

const DESIGN_REQUIREMENTS: &[&str] = &[
    "Do NOT include any images",
    "Use only valid **HTML with Tailwind CSS classes** (no extra scripts or frameworks).",
    "A short, engaging **subheading** below the title.",
    "A bold, eye-catching **hero section** with gradient background and a large product title.",
    "A clear **call-to-action button** styled with vibrant colors, hover effects, and rounded edges.",
    "Three attractive **feature cards** with icons, shadows, rounded corners, and hover effects.",
    "Include a **footer** with placeholder links (like About, Contact, Privacy).",
    "Clean typography, good use of white space, and responsive design for both desktop and mobile.",
];

/// Build the user message sent to the completion endpoint.
///
/// The idea is embedded verbatim, including when it is empty.
pub fn build_prompt(category: Category, idea: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Create a beautiful, modern, and responsive landing page for a {} product called \"{}\".\n",
        category.label(),
        idea
    ));
    prompt.push_str("The design should follow these requirements:\n\n");

    for requirement in DESIGN_REQUIREMENTS {
        prompt.push_str("- ");
        prompt.push_str(requirement);
        prompt.push('\n');
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_category_and_idea() {
        for category in Category::all() {
            let prompt = build_prompt(category, "Travel Planner");
            assert!(prompt.contains(category.label()));
            assert!(prompt.contains("\"Travel Planner\""));
        }
    }

    #[test]
    fn test_empty_idea_still_builds_prompt() {
        let prompt = build_prompt(Category::Startup, "");
        assert!(prompt.contains("Startup product called \"\""));
    }

    #[test]
    fn test_prompt_lists_design_requirements() {
        let prompt = build_prompt(Category::AiSaas, "x");
        assert!(prompt.contains("Do NOT include any images"));
        assert!(prompt.contains("Tailwind CSS"));
        assert!(prompt.contains("hero section"));
        assert!(prompt.contains("feature cards"));
        assert!(prompt.contains("footer"));
        assert!(prompt.contains("responsive design"));
    }

    #[test]
    fn test_idea_is_not_escaped() {
        let prompt = build_prompt(Category::AiSaas, "<b>\"Quotes\"</b>");
        assert!(prompt.contains("<b>\"Quotes\"</b>"));
    }
}
