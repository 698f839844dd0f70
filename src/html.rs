use scraper::node::Element;
use scraper::{ElementRef, Html};

// -------------------------
// Text extraction
// -------------------------

/// Visible text of `node` with whitespace runs collapsed to one space.
/// `None` when the node renders no text at all.
pub fn collapsed_text(node: ElementRef<'_>) -> Option<String> {
    let text = node
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() { None } else { Some(text) }
}

/// Like [`collapsed_text`], but a missing node or empty text yields `default`.
pub fn extract_text(node: Option<ElementRef<'_>>, default: &str) -> String {
    node.and_then(collapsed_text)
        .unwrap_or_else(|| default.to_string())
}

// -------------------------
// Matchers
// -------------------------

/// Condition on an element's `class` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRule<'p> {
    /// No condition; the attribute may be absent.
    Any,
    /// Some class token contains the substring (case-sensitive).
    Contains(&'p str),
    /// Some class token contains the substring, ignoring ASCII case.
    ContainsIgnoreCase(&'p str),
}

/// Tag-name filter plus a class condition, evaluated by [`find_first`] and
/// [`find_all`]. An empty tag list accepts any tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcher<'p> {
    pub tags: &'p [&'p str],
    pub class: ClassRule<'p>,
}

impl<'p> Matcher<'p> {
    pub fn class(pattern: &'p str) -> Self {
        Self {
            tags: &[],
            class: ClassRule::Contains(pattern),
        }
    }

    pub fn tags(tags: &'p [&'p str]) -> Self {
        Self {
            tags,
            class: ClassRule::Any,
        }
    }

    pub fn with_class(mut self, class: ClassRule<'p>) -> Self {
        self.class = class;
        self
    }

    pub fn matches(&self, el: &Element) -> bool {
        if !self.tags.is_empty() && !self.tags.contains(&el.name()) {
            return false;
        }
        let (pattern, fold_case) = match self.class {
            ClassRule::Any => return true,
            ClassRule::Contains(p) => (p, false),
            ClassRule::ContainsIgnoreCase(p) => (p, true),
        };
        let Some(class_attr) = el.attr("class") else {
            return false;
        };
        if fold_case {
            let pattern = pattern.to_ascii_lowercase();
            class_attr
                .split_ascii_whitespace()
                .any(|c| c.to_ascii_lowercase().contains(&pattern))
        } else {
            class_attr
                .split_ascii_whitespace()
                .any(|c| c.contains(pattern))
        }
    }
}

// -------------------------
// Traversal
// -------------------------

/// Descendants of `root` (not `root` itself) accepted by `matcher`, in
/// document order.
pub fn find_all<'a, 'p>(
    root: ElementRef<'a>,
    matcher: &'p Matcher<'p>,
) -> impl Iterator<Item = ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |el| matcher.matches(el.value()))
}

pub fn find_first<'a>(root: ElementRef<'a>, matcher: &Matcher<'_>) -> Option<ElementRef<'a>> {
    find_all(root, matcher).next()
}

/// First descendant whose class list contains one of `patterns`. Patterns
/// are tried in order; the first one with any hit wins.
pub fn find_by_class_pattern<'a, P: AsRef<str>>(
    root: ElementRef<'a>,
    patterns: &[P],
) -> Option<ElementRef<'a>> {
    patterns
        .iter()
        .find_map(|p| find_first(root, &Matcher::class(p.as_ref())))
}

/// Whole-document variant of [`find_by_class_pattern`].
pub fn find_in_document<'a, P: AsRef<str>>(doc: &'a Html, patterns: &[P]) -> Option<ElementRef<'a>> {
    find_by_class_pattern(doc.root_element(), patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn missing_node_yields_default() {
        assert_eq!(extract_text(None, "unavailable"), "unavailable");
    }

    #[test]
    fn empty_node_yields_default() {
        let doc = fragment(r#"<div class="price">   </div>"#);
        let node = find_in_document(&doc, &["price"]);
        assert!(node.is_some());
        assert_eq!(extract_text(node, "unavailable"), "unavailable");
    }

    #[test]
    fn text_is_collapsed_and_trimmed() {
        let doc = fragment("<p class=\"desc\">\n  Bici  <b>de\tmontaña</b>\n en buen estado </p>");
        let node = find_in_document(&doc, &["desc"]);
        assert_eq!(
            extract_text(node, "unavailable"),
            "Bici de montaña en buen estado"
        );
    }

    #[test]
    fn first_matching_pattern_wins() {
        let doc = fragment(r#"<div><span class="foo-bar-baz">hit</span></div>"#);
        let node = find_in_document(&doc, &["bar", "zzz"]).map(|n| n.inner_html());
        assert_eq!(node.as_deref(), Some("hit"));
    }

    #[test]
    fn later_pattern_is_tried_when_earlier_misses() {
        let doc = fragment(r#"<span class="a-distance">3 km</span><span class="x-location">Madrid</span>"#);
        let text = extract_text(find_in_document(&doc, &["nothing", "location"]), "-");
        assert_eq!(text, "Madrid");
    }

    #[test]
    fn pattern_order_beats_document_order() {
        let doc = fragment(r#"<span class="a-distance">3 km</span><span class="x-location">Madrid</span>"#);
        let text = extract_text(find_in_document(&doc, &["location", "distance"]), "-");
        assert_eq!(text, "Madrid");
    }

    #[test]
    fn matching_is_case_sensitive_substring() {
        let doc = fragment(r#"<span class="ItemCard__price">10 €</span>"#);
        assert!(find_in_document(&doc, &["itemcard__price"]).is_none());
        assert!(find_in_document(&doc, &["Card__pri"]).is_some());
    }

    #[test]
    fn elements_without_class_never_match_a_class_rule() {
        let doc = fragment("<section><h1>Title</h1></section>");
        let m = Matcher::tags(&["h1"]).with_class(ClassRule::Contains("title"));
        assert!(find_first(doc.root_element(), &m).is_none());
        assert!(find_first(doc.root_element(), &Matcher::tags(&["h1"])).is_some());
    }

    #[test]
    fn ignore_case_rule_with_tag_filter() {
        let doc = fragment(
            r#"<span class="Description">no</span><div class="ItemDetail-DESCRIPTION">yes</div>"#,
        );
        let m = Matcher::tags(&["div", "section"]).with_class(ClassRule::ContainsIgnoreCase("description"));
        let text = extract_text(find_first(doc.root_element(), &m), "-");
        assert_eq!(text, "yes");
    }

    #[test]
    fn root_itself_is_not_a_candidate() {
        let doc = fragment(r#"<a class="card-title"><span>inner</span></a>"#);
        let card = find_in_document(&doc, &["card-title"]).expect("card");
        assert!(find_by_class_pattern(card, &["card-title"]).is_none());
    }
}
