//! Resource and note display formatting

use crate::models::{Resource, ResourceCategory, ServiceNote};

/// Format categories with their resources nested underneath
pub fn format_resource_tree(categories: &[ResourceCategory], resources: &[Resource]) -> String {
    if categories.is_empty() {
        return "No resource categories found.".to_string();
    }

    let mut output = String::new();
    for category in categories {
        let filed: Vec<&Resource> = resources
            .iter()
            .filter(|r| r.category_id == category.id)
            .collect();

        output.push_str(&format!(
            "{} ({}) [{}]\n",
            category.name,
            filed.len(),
            category.id
        ));

        for resource in filed {
            output.push_str(&format!("  {}  {}  {}\n", resource.id, resource.name, resource.url));
            if !resource.description.is_empty() {
                output.push_str(&format!("      {}\n", resource.description));
            }
        }
    }

    output
}

/// Format a service note for reading
pub fn format_note(note: &ServiceNote) -> String {
    let mut output = format!(
        "# {} (updated {})\n\n",
        note.service_name,
        note.updated_at.format("%Y-%m-%d %H:%M")
    );
    if note.markdown_content.is_empty() {
        output.push_str("(empty)\n");
    } else {
        output.push_str(&note.markdown_content);
        if !note.markdown_content.ends_with('\n') {
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn test_resource_tree_groups_by_category() {
        let owner = UserId::new("u");
        let docs = ResourceCategory::new(owner.clone(), "Docs");
        let empty = ResourceCategory::new(owner.clone(), "Empty");
        let mut book = Resource::new(owner, docs.id, "Rust book", "https://doc.rust-lang.org/book/");
        book.description = "The book".into();

        let tree = format_resource_tree(&[docs, empty], &[book]);
        assert!(tree.contains("Docs (1)"));
        assert!(tree.contains("Empty (0)"));
        assert!(tree.contains("      The book"));
    }

    #[test]
    fn test_empty_note() {
        let note = ServiceNote::new(UserId::new("u"), "Stripe", "");
        assert!(format_note(&note).contains("(empty)"));
    }
}
