//! Naming conventions used when relation keys are omitted

/// Convert a model name to snake_case (`BlogPost` -> `blog_post`)
pub fn snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;

    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }

    result
}

/// Simple pluralization (English-centric)
pub fn pluralize(name: &str) -> String {
    let vowel_y = ["ay", "ey", "iy", "oy", "uy"].iter().any(|end| name.ends_with(end));
    if name.ends_with('y') && !vowel_y {
        format!("{}ies", &name[..name.len() - 1])
    } else if name.ends_with('s')
        || name.ends_with("sh")
        || name.ends_with("ch")
        || name.ends_with('x')
        || name.ends_with('z')
    {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}

/// Conventional foreign key referencing `model` (`User` -> `user_id`)
pub fn foreign_key_for(model: &str) -> String {
    format!("{}_id", snake_case(model))
}

/// Conventional pivot table joining two models: both snake names sorted
pub fn pivot_table_name(first: &str, second: &str) -> String {
    let mut names = [snake_case(first), snake_case(second)];
    names.sort();
    names.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("BlogPost"), "blog_post");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("taggable"), "taggables");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
    }

    #[test]
    fn test_keys_and_pivot_tables() {
        assert_eq!(foreign_key_for("BlogPost"), "blog_post_id");
        assert_eq!(pivot_table_name("User", "Role"), "role_user");
        assert_eq!(pivot_table_name("Role", "User"), "role_user");
    }
}
