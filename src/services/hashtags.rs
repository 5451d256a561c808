const MAX_TAGS: usize = 8;

const BASE_TAGS: &[&str] = &["#Tollywood", "#BanglaCinema", "#EntertainmentNews"];

/// Case-insensitive substring of the item's `source` field -> extra tag.
const SOURCE_TAG_MAP: &[(&str, &str)] = &[
    ("news18", "#News18Bangla"),
    ("abplive", "#ABPBangla"),
    ("hindustantimes", "#HindustanTimesBangla"),
    ("abp", "#ABPBangla"),
    ("hindustan times", "#HindustanTimesBangla"),
    ("bartaman", "#Bartaman"),
    ("eisamay", "#Eisamay"),
    ("statesman", "#DainikStatesman"),
];

/// Base tags first, then source-matched tags; de-duplicated preserving
/// first-seen order; never more than MAX_TAGS.
pub fn build_hashtags(source: &str) -> Vec<String> {
    let source = source.to_lowercase();

    let mut tags: Vec<String> = BASE_TAGS.iter().map(|t| t.to_string()).collect();
    for (key, tag) in SOURCE_TAG_MAP {
        if source.contains(key) {
            tags.push(tag.to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
    tags.truncate(MAX_TAGS);
    tags
}
