use url::Url;
use watcher_core::normalize;

fn base() -> Url {
    Url::parse("https://open.example.ca/en/search/ati").unwrap()
}

#[test]
fn absolute_url_passes_through() {
    let link = normalize("https://open.example.ca/en/doc/42", None).unwrap();
    assert_eq!(link.as_str(), "https://open.example.ca/en/doc/42");
}

#[test]
fn relative_href_resolves_against_base() {
    let link = normalize("/en/doc/42", Some(&base())).unwrap();
    assert_eq!(link.as_str(), "https://open.example.ca/en/doc/42");
}

#[test]
fn relative_href_without_base_is_rejected() {
    assert!(normalize("/en/doc/42", None).is_none());
}

#[test]
fn fragment_is_stripped_before_comparison() {
    let plain = normalize("https://open.example.ca/doc", None).unwrap();
    let with_fragment = normalize("https://open.example.ca/doc#section-2", None).unwrap();
    assert_eq!(plain, with_fragment);
}

#[test]
fn query_string_is_preserved() {
    let link = normalize("https://open.example.ca/search?page=2", None).unwrap();
    assert_eq!(link.as_str(), "https://open.example.ca/search?page=2");
}

#[test]
fn pseudo_links_are_rejected() {
    assert!(normalize("#top", Some(&base())).is_none());
    assert!(normalize("?page=2", Some(&base())).is_none());
    assert!(normalize("javascript:void(0)", Some(&base())).is_none());
    assert!(normalize("JavaScript:alert(1)", Some(&base())).is_none());
}

#[test]
fn non_http_schemes_are_rejected() {
    assert!(normalize("mailto:ati@example.ca", Some(&base())).is_none());
    assert!(normalize("ftp://open.example.ca/doc", None).is_none());
}

#[test]
fn whitespace_and_empty_hrefs_are_rejected() {
    assert!(normalize("", Some(&base())).is_none());
    assert!(normalize("   ", Some(&base())).is_none());
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    let link = normalize("  https://open.example.ca/doc  ", None).unwrap();
    assert_eq!(link.as_str(), "https://open.example.ca/doc");
}
