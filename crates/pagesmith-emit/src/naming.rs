//! Identifiers and paths derived from display names.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::emitter::EmitError;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

static NON_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]+").expect("class pattern is valid"));

/// Derive a file/route identifier from a display name by removing whitespace.
///
/// Fails when nothing is left, since no file name can be derived.
pub fn identifier(name: &str) -> Result<String, EmitError> {
    let id = WHITESPACE.replace_all(name, "").into_owned();
    if id.is_empty() {
        return Err(EmitError::Structural(format!(
            "cannot derive an identifier from name {:?}",
            name
        )));
    }
    Ok(id)
}

/// Scope class for a page or component: `{prefix}-{lowercased identifier}`.
///
/// Anything outside `[a-z0-9_-]` becomes `-`, so the class is usable both
/// in an attribute and as a CSS selector without escaping.
pub fn scope_class(prefix: &str, identifier: &str) -> String {
    let lower = identifier.to_lowercase();
    format!("{}-{}", prefix, NON_CLASS.replace_all(&lower, "-"))
}

/// Normalize a route path so it always starts with `/`.
pub fn normalize_route_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Lowercase, hyphen-separated slug suitable for package names.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let slug = NON_SLUG.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "app".to_string()
    } else {
        slug.to_string()
    }
}

/// Hands out unique identifiers in request order.
///
/// Comparison is case-insensitive because exported files may land on
/// case-insensitive file systems. A taken identifier gets the smallest free
/// numeric suffix starting at 2.
#[derive(Debug, Default)]
pub struct IdentifierAllocator {
    taken: HashSet<String>,
}

impl IdentifierAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator that never hands out any of `names`.
    pub fn with_reserved<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            taken: names.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// Reserve `base`, or the first free `base2`, `base3`, ...
    pub fn allocate(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_lowercase()) {
            return base.to_string();
        }

        let mut n = 2;
        loop {
            let candidate = format!("{}{}", base, n);
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_all_whitespace() {
        assert_eq!(identifier("About Us").unwrap(), "AboutUs");
        assert_eq!(identifier(" Contact\tPage \n").unwrap(), "ContactPage");
    }

    #[test]
    fn blank_name_is_structural_error() {
        assert!(matches!(identifier("   "), Err(EmitError::Structural(_))));
        assert!(matches!(identifier(""), Err(EmitError::Structural(_))));
    }

    #[test]
    fn normalizes_route_paths() {
        assert_eq!(normalize_route_path("about"), "/about");
        assert_eq!(normalize_route_path("/about"), "/about");
        assert_eq!(normalize_route_path(""), "/");
        assert_eq!(normalize_route_path("  /x "), "/x");
    }

    #[test]
    fn scope_classes_are_css_safe() {
        assert_eq!(scope_class("page", "AboutUs"), "page-aboutus");
        assert_eq!(scope_class("page", "My\"Page<x>"), "page-my-page-x-");
        assert_eq!(scope_class("component", "price.tag_v2"), "component-price-tag_v2");
    }

    #[test]
    fn slugifies_names() {
        assert_eq!(slugify("My Cool Shop!"), "my-cool-shop");
        assert_eq!(slugify("***"), "app");
    }

    #[test]
    fn allocator_suffixes_collisions() {
        let mut ids = IdentifierAllocator::new();

        assert_eq!(ids.allocate("AboutUs"), "AboutUs");
        assert_eq!(ids.allocate("AboutUs"), "AboutUs2");
        assert_eq!(ids.allocate("aboutus"), "aboutus3");
        assert_eq!(ids.allocate("AboutUs2"), "AboutUs22");
        assert_eq!(ids.allocate("Home"), "Home");
    }

    #[test]
    fn allocator_skips_reserved_names() {
        let mut ids = IdentifierAllocator::with_reserved(["App", "router"]);

        assert_eq!(ids.allocate("App"), "App2");
        assert_eq!(ids.allocate("Router"), "Router2");
        assert_eq!(ids.allocate("Badge"), "Badge");
    }
}
