//! Validation rules and their ordering

use pretty_assertions::assert_eq;
use test_case::test_case;

use svgen::svg::{ALLOWED_ELEMENTS, DEFAULT_MAX_BYTES};
use svgen::{ErrorKind, ExtractedSvg, Rejection, SvgValidator, ValidationResult};

fn validate(markup: &str) -> ValidationResult {
    SvgValidator::default().validate(&ExtractedSvg::new(markup))
}

fn rejection_kind(markup: &str) -> Option<ErrorKind> {
    validate(markup).rejection().map(Rejection::kind)
}

#[test]
fn test_minimal_document_accepted() {
    let markup = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0L24 24"/></svg>"#;
    let result = validate(markup);
    assert!(result.is_accepted());
    assert_eq!(result.accepted().map(|svg| svg.markup()), Some(markup));
}

#[test]
fn test_every_allowed_element_accepted() {
    let body: String = ALLOWED_ELEMENTS
        .iter()
        .filter(|name| **name != "svg")
        .map(|name| format!("<{0}></{0}>", name))
        .collect();
    let markup = format!(r#"<svg viewBox="0 0 1 1">{}</svg>"#, body);
    assert!(validate(&markup).is_accepted());
}

#[test_case(r#"<svg viewBox="0 0 1 1"><script>alert(1)</script></svg>"# ; "script element")]
#[test_case(r#"<svg viewBox="0 0 1 1"><SCRIPT>x</SCRIPT></svg>"# ; "uppercase script")]
#[test_case(r#"<svg viewBox="0 0 1 1">< script>x</script></svg>"# ; "spaced script")]
#[test_case(r#"<svg viewBox="0 0 1 1"><foreignObject><div/></foreignObject></svg>"# ; "foreign object")]
#[test_case(r#"<svg viewBox="0 0 1 1" onload="x()"></svg>"# ; "onload on root")]
#[test_case(r#"<svg viewBox="0 0 1 1"><rect onClick="x()"/></svg>"# ; "mixed case handler")]
#[test_case(r#"<svg viewBox="0 0 1 1"><a href="javascript:alert(1)"><rect/></a></svg>"# ; "javascript uri")]
#[test_case(r#"<svg viewBox="0 0 1 1"><rect fill="url(JavaScript :x)"/></svg>"# ; "javascript with space")]
#[test_case(r#"<svg viewBox="0 0 1 1"><image href="https://evil.test/x.png"/></svg>"# ; "https href")]
#[test_case(r#"<svg viewBox="0 0 1 1"><use xlink:href="http://evil.test/s.svg#a"/></svg>"# ; "http xlink href")]
#[test_case(r#"<svg viewBox="0 0 1 1"><use href="//evil.test/s.svg#a"/></svg>"# ; "protocol relative href")]
#[test_case(r#"<svg viewBox="0 0 1 1"><!-- --!><rect onclick="alert(1)"/> --></svg>"# ; "comment closed by bang")]
#[test_case(r#"<svg viewBox="0 0 1 1"><!-- <rect onclick="alert(1)"/> --></svg>"# ; "markup in comment")]
#[test_case(r#"<svg viewBox="0 0 1 1"><style><![CDATA[</style><rect onclick="alert(1)"/>]]></style></svg>"# ; "markup in cdata")]
#[test_case(r#"<svg viewBox="0 0 1 1"><?x <rect onclick="alert(1)"/> ?></svg>"# ; "markup in instruction")]
#[test_case(r#"<svg viewBox="0 0 1 1"><svg:rect svg:onclick="alert(1)"/></svg>"# ; "prefixed event handler")]
#[test_case(r#"<svg viewBox="0 0 1 1"><a href="java&#x09;script:alert(1)"><rect/></a></svg>"# ; "encoded tab in scheme")]
#[test_case(r#"<svg viewBox="0 0 1 1"><image xlink:href="&#x68;ttps://evil.test/x.png"/></svg>"# ; "encoded external href")]
fn test_unsafe_content_rejected(markup: &str) {
    assert_eq!(rejection_kind(markup), Some(ErrorKind::UnsafeContent));
}

#[test_case(r#"<svg viewBox="0 0 1 1"><s:script>alert(1)</s:script></svg>"# ; "prefixed script")]
#[test_case(r#"<svg viewBox="0 0 1 1"><x:foreignObject/></svg>"# ; "prefixed foreign object")]
#[test_case("<svg viewBox=\"0 0 1 1\"><a href=\"java\nscript:alert(1)\"/></svg>" ; "newline in scheme")]
#[test_case(r#"<svg viewBox="0 0 1 1"><a href="java&#x0A;script:alert(1)"/></svg>"# ; "encoded newline in scheme")]
#[test_case(r#"<svg viewBox="0 0 1 1"><!-- --!><rect onclick="alert(1)"/> --></svg>"# ; "comment closed by bang")]
fn test_lenient_mode_keeps_safety_checks(markup: &str) {
    let lenient = SvgValidator::with_limits(DEFAULT_MAX_BYTES, false);
    assert_eq!(
        lenient
            .validate(&ExtractedSvg::new(markup))
            .rejection()
            .map(Rejection::kind),
        Some(ErrorKind::UnsafeContent)
    );
}

#[test]
fn test_namespaced_elements_fail_allowlist() {
    let markup = r#"<svg viewBox="0 0 1 1"><svg:rect width="1" height="1"/></svg>"#;
    assert_eq!(
        validate(markup).rejection(),
        Some(&Rejection::DisallowedElement {
            element: "svg:rect".to_string()
        })
    );
}

#[test]
fn test_plain_comment_accepted() {
    let markup = r#"<svg viewBox="0 0 1 1"><!-- background --><rect width="1" height="1"/></svg>"#;
    assert!(validate(markup).is_accepted());
}

#[test_case("image" ; "image")]
#[test_case("use" ; "use")]
#[test_case("a" ; "anchor")]
#[test_case("animate" ; "animate")]
#[test_case("filter" ; "filter")]
fn test_elements_outside_allowlist(element: &str) {
    let markup = format!(r#"<svg viewBox="0 0 1 1"><{0}></{0}></svg>"#, element);
    assert_eq!(
        validate(&markup).rejection(),
        Some(&Rejection::DisallowedElement {
            element: element.to_string()
        })
    );

    let lenient = SvgValidator::with_limits(DEFAULT_MAX_BYTES, false);
    assert!(lenient.validate(&ExtractedSvg::new(markup)).is_accepted());
}

#[test]
fn test_internal_references_allowed() {
    let markup = r##"<svg viewBox="0 0 1 1"><defs><linearGradient id="g"/></defs><rect fill="url(#g)"/></svg>"##;
    assert!(validate(markup).is_accepted());
}

#[test_case("<svg></svg>" ; "no attributes")]
#[test_case(r#"<svg width="10" height="10"><rect/></svg>"# ; "size only")]
#[test_case(r#"<svg viewBox=""></svg>"# ; "empty value")]
#[test_case(r#"<svg><g viewBox="0 0 1 1"/></svg>"# ; "viewbox on child only")]
fn test_missing_viewbox(markup: &str) {
    assert_eq!(rejection_kind(markup), Some(ErrorKind::MissingViewBox));
}

#[test_case(r#"<div><svg viewBox="0 0 1 1"></svg></div>"# ; "wrapped in div")]
#[test_case(r#"<svg viewBox="0 0 1 1"></svg><p/>"# ; "trailing element")]
#[test_case(r#"<svgx viewBox="0 0 1 1"></svg>"# ; "prefixed tag name")]
#[test_case("" ; "empty")]
fn test_malformed_root(markup: &str) {
    assert_eq!(rejection_kind(markup), Some(ErrorKind::MalformedRoot));
}

#[test]
fn test_size_boundary() {
    let head = r#"<svg viewBox="0 0 1 1">"#;
    let tail = "</svg>";
    let limit = 256;
    let exact = format!("{}{}{}", head, " ".repeat(limit - head.len() - tail.len()), tail);
    assert_eq!(exact.len(), limit);

    let validator = SvgValidator::with_limits(limit, true);
    assert!(validator.validate(&ExtractedSvg::new(exact.clone())).is_accepted());

    let over = exact.replacen(' ', "  ", 1);
    assert_eq!(over.len(), limit + 1);
    assert_eq!(
        validator.validate(&ExtractedSvg::new(over)).rejection(),
        Some(&Rejection::TooLarge {
            byte_length: limit + 1,
            max_bytes: limit,
        })
    );
}

// Multi-violation inputs: the earliest check in sequence decides.

#[test]
fn test_size_checked_before_everything() {
    let markup = format!("<div>{}<script></script></div>", "x".repeat(64));
    let result = SvgValidator::with_limits(16, true).validate(&ExtractedSvg::new(markup));
    assert_eq!(result.rejection().map(Rejection::kind), Some(ErrorKind::TooLarge));
}

#[test]
fn test_root_checked_before_viewbox() {
    assert_eq!(
        rejection_kind("<g><script/></g>"),
        Some(ErrorKind::MalformedRoot)
    );
}

#[test_case(r#"<svg><circle r="5" onclick="alert(1)"/></svg>"# ; "event handler")]
#[test_case("<svg><script>alert(1)</script></svg>" ; "script")]
#[test_case("<svg><image/></svg>" ; "disallowed element")]
fn test_viewbox_checked_before_content(markup: &str) {
    assert_eq!(rejection_kind(markup), Some(ErrorKind::MissingViewBox));
}

#[test]
fn test_safety_checked_before_allowlist() {
    let markup = r#"<svg viewBox="0 0 1 1"><image href="https://x.test/a.png"/></svg>"#;
    assert_eq!(rejection_kind(markup), Some(ErrorKind::UnsafeContent));
}

#[test]
fn test_script_reported_before_event_handler() {
    let markup = r#"<svg viewBox="0 0 1 1" onload="f()"><script/></svg>"#;
    assert_eq!(
        validate(markup).rejection(),
        Some(&Rejection::UnsafeContent {
            construct: "<script".to_string()
        })
    );
}

#[test]
fn test_rejection_codes() {
    let codes: Vec<_> = [
        SvgValidator::with_limits(4, true).validate(&ExtractedSvg::new("<svg></svg>")),
        validate("<p/>"),
        validate("<svg></svg>"),
        validate(r#"<svg viewBox="0 0 1 1"><script/></svg>"#),
        validate(r#"<svg viewBox="0 0 1 1"><image/></svg>"#),
    ]
    .iter()
    .filter_map(|r| r.rejection().map(Rejection::error_code))
    .collect();

    assert_eq!(
        codes,
        vec![
            "TOO_LARGE",
            "MALFORMED_ROOT",
            "MISSING_VIEWBOX",
            "UNSAFE_CONTENT",
            "DISALLOWED_ELEMENT"
        ]
    );
}
