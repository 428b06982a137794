/// Turns arbitrary text into a lowercase, hyphen separated, URL-safe slug.
///
/// Letters and digits are kept, whitespace, `-` and `_` collapse into a single
/// `-`, `@` becomes `at` and every other character is dropped. Characters
/// outside ASCII are dropped as well, so a title made only of them slugifies
/// to an empty string.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        match c {
            'a'..='z' | '0'..='9' => push_char(&mut slug, &mut pending_separator, c),
            'A'..='Z' => push_char(&mut slug, &mut pending_separator, c.to_ascii_lowercase()),
            '@' => {
                pending_separator = true;
                push_char(&mut slug, &mut pending_separator, 'a');
                slug.push('t');
                pending_separator = true;
            }
            '-' | '_' => pending_separator = true,
            c if c.is_whitespace() => pending_separator = true,
            _ => {}
        }
    }

    slug
}

fn push_char(slug: &mut String, pending_separator: &mut bool, c: char) {
    if *pending_separator && !slug.is_empty() {
        slug.push('-');
    }
    *pending_separator = false;
    slug.push(c);
}

/// Appends `-<unix timestamp>` to a slug. An empty slug becomes the bare
/// timestamp.
pub fn with_timestamp_suffix(slug: &str, unix_timestamp: i64) -> String {
    if slug.is_empty() {
        unix_timestamp.to_string()
    } else {
        format!("{}-{}", slug, unix_timestamp)
    }
}

/// Picks the text a post's slug is derived from: the explicit slug when one
/// was submitted, the title otherwise.
pub fn slug_source<'a>(explicit: Option<&'a str>, title: &'a str) -> String {
    match explicit {
        Some(slug) if !slug.trim().is_empty() => slugify(slug),
        _ => slugify(title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugifies_plain_title() {
        assert_eq!(slugify("Getting Started"), "getting-started");
    }

    #[test]
    fn drops_punctuation_instead_of_separating() {
        assert_eq!(slugify("How to: Use Workflows (v2)"), "how-to-use-workflows-v2");
        assert_eq!(slugify("node.js tips"), "nodejs-tips");
    }

    #[test]
    fn collapses_and_trims_separators() {
        assert_eq!(slugify("--hello__  world--"), "hello-world");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn spells_out_at_sign() {
        assert_eq!(slugify("mail@home"), "mail-at-home");
        assert_eq!(slugify("@home"), "at-home");
    }

    #[test]
    fn drops_non_ascii() {
        assert_eq!(slugify("Café déjà vu"), "caf-dj-vu");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn timestamp_suffix() {
        assert_eq!(with_timestamp_suffix("hello", 1700000000), "hello-1700000000");
        assert_eq!(with_timestamp_suffix("", 1700000000), "1700000000");
    }

    #[test]
    fn explicit_slug_wins_over_title() {
        assert_eq!(slug_source(Some("My Custom Slug"), "Title"), "my-custom-slug");
        assert_eq!(slug_source(None, "Title Here"), "title-here");
        assert_eq!(slug_source(Some("  "), "Title Here"), "title-here");
    }
}
