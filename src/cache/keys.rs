// Cache key layout for note resources. Every key embeds the owning user so
// invalidation can be scoped to one account.

pub fn notes_list(user_id: i64, category: Option<&str>, page: i64, limit: i64) -> String {
    let mut key = format!("notes:list:user:{}:page:{}:limit:{}", user_id, page, limit);
    if let Some(category) = category.filter(|c| !c.is_empty()) {
        key.push_str(":category:");
        key.push_str(category);
    }
    key
}

pub fn note_detail(note_id: i64, user_id: i64) -> String {
    format!("notes:detail:note:{}:user:{}", note_id, user_id)
}

pub fn categories(user_id: i64) -> String {
    format!("notes:categories:user:{}", user_id)
}

/// Patterns covering every cached view of a user's notes
pub fn user_patterns(user_id: i64) -> [String; 3] {
    [
        format!("notes:list:user:{}:*", user_id),
        format!("notes:detail:*:user:{}", user_id),
        categories(user_id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_key_with_and_without_category() {
        assert_eq!(notes_list(7, None, 1, 10), "notes:list:user:7:page:1:limit:10");
        assert_eq!(notes_list(7, Some(""), 1, 10), "notes:list:user:7:page:1:limit:10");
        assert_eq!(
            notes_list(7, Some("work"), 2, 20),
            "notes:list:user:7:page:2:limit:20:category:work"
        );
    }

    #[test]
    fn test_user_patterns_do_not_cover_other_users() {
        let patterns = user_patterns(1);
        assert!(patterns[0].starts_with("notes:list:user:1:"));
        assert!(patterns[1].ends_with(":user:1"));
        assert_eq!(patterns[2], "notes:categories:user:1");
        assert_eq!(note_detail(5, 1), "notes:detail:note:5:user:1");
    }
}
