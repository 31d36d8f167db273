//! Product-name to article-group classification for new rows

/// Article group used when a product name is not in the table
pub const DEFAULT_ARTICLE_GROUP: i64 = 12;

/// Known product names (lowercase) and their article group
const ARTICLE_GROUPS: &[(&str, i64)] = &[
    ("välling", 9),
    ("kaffe", 9),
    ("maskindiskmedel", 11),
    ("hushållspapper", 11),
    ("toapapper", 11),
    ("blöjor", 11),
];

/// Case-insensitive lookup of a product name, defaulting to
/// [`DEFAULT_ARTICLE_GROUP`]
pub fn lookup(product_name: &str) -> i64 {
    let name = product_name.trim().to_lowercase();
    ARTICLE_GROUPS
        .iter()
        .find(|(known, _)| *known == name)
        .map_or(DEFAULT_ARTICLE_GROUP, |(_, group)| *group)
}
