//! Nonce-injection scanner tests.

use std::borrow::Cow;

use shieldgate::security::rewrite::{inject_nonce, RewriteError};

#[test]
fn injects_nonce_into_bare_script_tag() {
    let out = inject_nonce("<script>alert(1)</script>", "abc123").unwrap();
    assert_eq!(out, "<script nonce=\"abc123\">alert(1)</script>");
}

#[test]
fn preserves_existing_nonce() {
    let body = "<script nonce=\"xyz\">foo()</script>";
    let out = inject_nonce(body, "abc123").unwrap();
    assert_eq!(out, body);
    assert!(matches!(out, Cow::Borrowed(_)));
}

#[test]
fn preserves_single_quoted_nonce() {
    let body = "<script nonce='xyz'>foo()</script>";
    assert_eq!(inject_nonce(body, "abc123").unwrap(), body);
}

#[test]
fn rewrite_is_idempotent() {
    let body = "<p>x</p><script>a()</script><script src=\"/app.js\"></script>";
    let once = inject_nonce(body, "t0k3n").unwrap().into_owned();
    let twice = inject_nonce(&once, "t0k3n").unwrap().into_owned();
    assert_eq!(once, twice);
}

#[test]
fn tags_every_qualifying_script() {
    let body = "<script>a()</script>\n<script nonce=\"keep\">b()</script>\n<script defer>c()</script>";
    let out = inject_nonce(body, "n").unwrap();
    assert_eq!(out.matches("nonce=\"n\"").count(), 2);
    assert!(out.contains("nonce=\"keep\""));
}

#[test]
fn inserts_before_existing_attributes() {
    let out = inject_nonce("<script src=\"/app.js\" defer></script>", "n1").unwrap();
    assert_eq!(out, "<script nonce=\"n1\" src=\"/app.js\" defer></script>");
}

#[test]
fn matching_is_case_insensitive() {
    let out = inject_nonce("<SCRIPT>a()</SCRIPT>", "n").unwrap();
    assert_eq!(out, "<SCRIPT nonce=\"n\">a()</SCRIPT>");
}

#[test]
fn ignores_script_text_inside_comments() {
    let body = "<!-- <script>evil()</script> --><p>hi</p>";
    let out = inject_nonce(body, "n").unwrap();
    assert_eq!(out, body);
}

#[test]
fn ignores_script_substring_inside_inline_script_content() {
    let body = "<script>var s = \"<script>nested\";</script>";
    let out = inject_nonce(body, "n").unwrap();
    assert_eq!(out, "<script nonce=\"n\">var s = \"<script>nested\";</script>");
}

#[test]
fn tag_end_detection_skips_quoted_gt() {
    let out = inject_nonce("<script data-x=\"a>b\">f()</script>", "n").unwrap();
    assert_eq!(out, "<script nonce=\"n\" data-x=\"a>b\">f()</script>");
}

#[test]
fn data_nonce_attribute_does_not_count() {
    let out = inject_nonce("<script data-nonce=\"x\">f()</script>", "n").unwrap();
    assert_eq!(out, "<script nonce=\"n\" data-nonce=\"x\">f()</script>");
}

#[test]
fn nonce_as_attribute_value_does_not_count() {
    let out = inject_nonce("<script src=\"nonce\"></script>", "n").unwrap();
    assert_eq!(out, "<script nonce=\"n\" src=\"nonce\"></script>");
}

#[test]
fn ignores_script_substring_inside_other_tags_attributes() {
    let body = "<div title=\"<script>\">hello</div>";
    assert_eq!(inject_nonce(body, "n").unwrap(), body);
}

#[test]
fn still_tags_real_scripts_after_attribute_value_lookalikes() {
    let body = "<div title=\"<script>\">hello</div><script>f()</script>";
    let out = inject_nonce(body, "n").unwrap();
    assert_eq!(
        out,
        "<div title=\"<script>\">hello</div><script nonce=\"n\">f()</script>"
    );
}

#[test]
fn similar_tag_names_are_not_matched() {
    let body = "<scripting>text</scripting>";
    assert_eq!(inject_nonce(body, "n").unwrap(), body);
}

#[test]
fn body_without_scripts_is_untouched() {
    let body = "<html><body><p>no scripts here</p></body></html>";
    let out = inject_nonce(body, "n").unwrap();
    assert!(matches!(out, Cow::Borrowed(_)));
}

#[test]
fn unterminated_tag_is_an_error() {
    let err = inject_nonce("<p>x</p><script src=\"/app.js\"", "n").unwrap_err();
    assert_eq!(err, RewriteError::UnterminatedTag { offset: 8 });
}
