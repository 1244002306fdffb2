use proptest::prelude::*;

use refnav::dom::{Dom, parse_html};
use refnav::indexer::CITATION_ID_ATTR;
use refnav::navigation::fragment_of;
use refnav::resolver::{find_heading, resolve_container, resolve_heading};
use refnav::{Config, CrossRefIndexer, IdMint};

/// Article with `n` paragraphs, each citing `ref1` once, and a heading
/// before every `every`-th paragraph.
fn article(n: usize, every: usize) -> String {
    let mut html = String::from("<html><head></head><body>");
    for i in 0..n {
        if i % every == 0 {
            html.push_str(&format!("<h2>Part {i}</h2>"));
        }
        html.push_str(&format!(
            r##"<p>Text <a class="xref-bibr" href="#ref1">[{i}]</a></p>"##
        ));
    }
    html.push_str(r#"<ol><li class="cross-ref-entry" id="ref1">Ref</li></ol></body></html>"#);
    html
}

/// `depth` nested elements with a link at the bottom.
fn nested(depth: usize, tags: &[&str]) -> String {
    let mut html = String::new();
    for i in 0..depth {
        html.push_str(&format!("<{}>", tags[i % tags.len()]));
    }
    html.push_str(r##"<a id="deep" href="#x">x</a>"##);
    for i in (0..depth).rev() {
        html.push_str(&format!("</{}>", tags[i % tags.len()]));
    }
    html
}

fn backlink_ids(dom: &Dom) -> Vec<String> {
    let entry = dom.get_by_id("ref1").unwrap();
    dom.children(entry)
        .filter_map(|c| dom.get_attr(c, CITATION_ID_ATTR).map(str::to_string))
        .collect()
}

proptest! {
    #[test]
    fn one_backlink_per_citation_in_order(n in 1usize..40, every in 1usize..6, seed in any::<u64>()) {
        let mut dom = parse_html(&article(n, every));
        let report = CrossRefIndexer::new(&Config::default())
            .unwrap()
            .index(&mut dom, &mut IdMint::with_seed(seed));

        let expected: Vec<String> = (1..=n).map(|i| format!("cite-ref1-{i}")).collect();
        prop_assert_eq!(backlink_ids(&dom), expected);
        prop_assert_eq!(report.total_backlinks(), n);

        // Every back-link resolves to a live element.
        for link in &report.entries[0].backlinks {
            prop_assert!(dom.get_by_id(&link.href[1..]).is_some());
        }
    }

    #[test]
    fn reindexing_never_duplicates(n in 1usize..20, runs in 2usize..5) {
        let mut dom = parse_html(&article(n, 3));
        let indexer = CrossRefIndexer::new(&Config::default()).unwrap();
        let mut mint = IdMint::with_seed(7);
        for _ in 0..runs {
            indexer.index(&mut dom, &mut mint);
        }
        prop_assert_eq!(backlink_ids(&dom).len(), n);
    }

    #[test]
    fn resolution_terminates_at_any_depth(depth in 0usize..200, seed in any::<u64>()) {
        let mut dom = parse_html(&nested(depth, &["div", "span", "em", "section"]));
        let deep = dom.get_by_id("deep").unwrap();
        let mut mint = IdMint::with_seed(seed);

        prop_assert!(find_heading(&dom, deep).is_none());
        prop_assert!(resolve_heading(&mut dom, deep, &mut mint).is_empty());
        if let Some(id) = resolve_container(&mut dom, deep, &mut mint) {
            prop_assert!(dom.get_by_id(&id).is_some());
        }
    }

    #[test]
    fn fragment_never_panics(href in ".*") {
        if let Some(fragment) = fragment_of(&href) {
            prop_assert!(!fragment.is_empty());
        }
    }
}
