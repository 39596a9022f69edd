//! Name inflection between model names, table names, and key columns.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// Turn the string into `under_score` format.
pub fn underscore(input: &str) -> String {
    input.to_snake_case()
}

pub fn pluralize(input: &str) -> String {
    pluralizer::pluralize(input, 2, false)
}

pub fn singularize(input: &str) -> String {
    pluralizer::pluralize(input, 1, false)
}

/// Turn the string into table name format.
pub fn tableize(input: &str) -> String {
    pluralize(&underscore(input))
}

/// Turn the string into a model name.
pub fn classify(input: &str) -> String {
    singularize(input).to_upper_camel_case()
}

/// Turn the string into a foreign key column name.
pub fn foreign_key(input: &str) -> String {
    format!("{}_id", singularize(&underscore(input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn underscores() {
        assert_eq!(underscore("BlogPost"), "blog_post");
        assert_eq!(underscore("APIKey"), "api_key");
        assert_eq!(underscore("user"), "user");
    }

    #[test]
    fn tableizes() {
        assert_eq!(tableize("User"), "users");
        assert_eq!(tableize("BlogPost"), "blog_posts");
        assert_eq!(tableize("Category"), "categories");
    }

    #[test]
    fn classifies() {
        assert_eq!(classify("users"), "User");
        assert_eq!(classify("blog_posts"), "BlogPost");
        assert_eq!(classify("author"), "Author");
    }

    #[test]
    fn foreign_keys() {
        assert_eq!(foreign_key("author"), "author_id");
        assert_eq!(foreign_key("users"), "user_id");
        assert_eq!(foreign_key("BlogPost"), "blog_post_id");
    }
}
