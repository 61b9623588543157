use weave::Document;
use weave::block::BlockKind;
use weave::parser::{ParseErrorKind, Parser, RawBlockPair, scan};
use weave::syntax::Syntax;

fn pairs(source: &str) -> Vec<RawBlockPair<'_>> {
    // Syntax is 'static here so the pairs can borrow only the source.
    static SYNTAX: std::sync::LazyLock<Syntax> = std::sync::LazyLock::new(Syntax::default);
    scan(source, 0, &SYNTAX)
        .collect::<Result<Vec<_>, _>>()
        .expect("scan failed")
}

fn scan_error(source: &str) -> weave::parser::ParseError {
    let syntax = Syntax::default();
    scan(source, 0, &syntax)
        .find_map(Result::err)
        .expect("expected a scan error")
}

#[test]
fn finds_annotated_fence() {
    let source = "# Title\n\n<!--- tag: hello -->\n```cpp\nint main() {}\n```\nafter\n";
    let found = pairs(source);

    assert_eq!(found.len(), 1);
    let pair = &found[0];
    assert_eq!(pair.annotation, "<!--- tag: hello -->");
    assert_eq!(pair.gap, "\n");
    assert_eq!(pair.fence, "```cpp\nint main() {}\n```");
    assert_eq!(pair.location.line, 3);
    assert_eq!(pair.location.column, 1);
    assert_eq!(pair.location.offset, 9);
    assert_eq!(&source[pair.fence_span.clone()], pair.fence);
    assert_eq!(&source[pair.annotation_span.clone()], pair.annotation);
}

#[test]
fn keeps_blank_lines_between_annotation_and_fence() {
    let source = "<!--- tag: a -->\n\n  \n```\nx\n```\n";
    let found = pairs(source);
    assert_eq!(found[0].gap, "\n\n  \n");
}

#[test]
fn multiline_annotation() {
    let source = "<!---\ntag: a\ntype: in\n-->\n```\nx\n```\n";
    let found = pairs(source);
    assert_eq!(found[0].annotation, "<!---\ntag: a\ntype: in\n-->");
}

#[test]
fn column_counts_characters() {
    let source = "é <!--- tag: a --> ```\nx\n```";
    let found = pairs(source);
    assert_eq!(found[0].location.line, 1);
    assert_eq!(found[0].location.column, 3);
}

#[test]
fn matches_in_document_order() {
    let source = "<!--- tag: a -->\n```\n1\n```\ntext\n<!--- tag: b -->\n```\n2\n```\n";
    let tags: Vec<&str> = pairs(source).iter().map(|p| p.annotation).collect();
    assert_eq!(tags, vec!["<!--- tag: a -->", "<!--- tag: b -->"]);
}

#[test]
fn plain_html_comments_are_ignored() {
    let source = "<!-- an ordinary comment -->\n```\nx\n```\n";
    assert!(pairs(source).is_empty());
}

#[test]
fn annotations_inside_plain_fences_are_ignored() {
    let source = "```markdown\n<!--- tag: example -->\n```\n\nprose\n";
    assert!(pairs(source).is_empty());
}

#[test]
fn inline_backticks_are_not_plain_fences() {
    let source = "Write ``` to open a fence.\n<!--- tag: a -->\n```\nx\n```\n";
    assert_eq!(pairs(source).len(), 1);
}

#[test]
fn backticks_inside_plain_fence_do_not_close_it() {
    let source = "```sh\necho ``` here\n```\n\n<!--- tag: a -->\n```\nx\n```\n";
    let found = pairs(source);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fence, "```\nx\n```");
}

#[test]
fn prose_starting_with_backticks_is_not_a_fence() {
    let source = "``` opens a fence in Markdown.\n\n<!--- tag: a -->\n```\nx\n```\n";
    assert_eq!(pairs(source).len(), 1);
}

#[test]
fn plain_fence_closer_must_be_as_long_as_opener() {
    let source = "````markdown\n<!--- tag: inner -->\n```\nx\n```\n````\n<!--- tag: a -->\n```\ny\n```\n";
    let found = pairs(source);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fence, "```\ny\n```");
}

#[test]
fn unclosed_plain_fence_does_not_hide_later_blocks() {
    let source = "````\nnever closed\n<!--- tag: a -->\n```\nx\n```\n";
    assert_eq!(pairs(source).len(), 1);
}

#[test]
fn unclosed_plain_fence_still_reports_later_errors() {
    let error = scan_error("```\nnever closed\n<!--- tag: a -->\n");
    assert_eq!(error.kind, ParseErrorKind::Scan);
    assert_eq!(error.line, 3);
    assert!(error.message.contains("not followed by a code fence"));
}

#[test]
fn unterminated_annotation_is_an_error() {
    let error = scan_error("one\ntwo\n<!--- tag: a\n```\nx\n```\n");
    assert_eq!(error.kind, ParseErrorKind::Scan);
    assert_eq!(error.line, 3);
    assert!(error.message.contains("unterminated control annotation"));
}

#[test]
fn annotation_without_fence_is_an_error() {
    let error = scan_error("text\n<!--- tag: a -->\nno fence here\n");
    assert_eq!(error.line, 2);
    assert!(error.message.contains("not followed by a code fence"));
}

#[test]
fn unterminated_fence_is_an_error() {
    let error = scan_error("<!--- tag: a -->\n```cpp\nint x;\n");
    assert_eq!(error.line, 2);
    assert!(error.message.contains("unterminated code fence"));
}

#[test]
fn single_line_fence_is_an_error() {
    let error = scan_error("<!--- tag: a -->\n```x```\n");
    assert!(error.message.contains("separate lines"));
}

#[test]
fn scan_stops_after_an_error() {
    let syntax = Syntax::default();
    let results: Vec<_> = scan("<!--- tag: a\n", 0, &syntax).collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

#[test]
fn scanner_is_restartable() {
    let source = "<!--- tag: a -->\n```\n1\n```\n<!--- tag: b -->\n```\n2\n```\n";
    let syntax = Syntax::default();
    let mut scanner = scan(source, 0, &syntax);
    let restart = scanner.clone();
    let first = scanner.next().unwrap().unwrap();
    assert_eq!(first.annotation, "<!--- tag: a -->");
    assert_eq!(restart.count(), 2);
}

#[test]
fn custom_syntax() {
    let syntax = Syntax {
        annotation_open: "%%{".to_string(),
        annotation_close: "}%%".to_string(),
        fence: "~~~".to_string(),
    };
    let source = "%%{ tag: a }%%\n~~~\nx\n~~~\n<!--- tag: b -->\n";
    let found: Vec<_> = scan(source, 0, &syntax).collect::<Result<_, _>>().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fence, "~~~\nx\n~~~");
}

#[test]
fn parser_builds_unclassified_blocks() {
    let document = Document::new(
        "<!--- tag: a -->\n```\n1\n```\n<!--- {tag: a, io: out} -->\n```\n2\n```\n",
        7,
        "/docs",
    );
    let syntax = Syntax::default();
    let blocks = Parser::new(&document, &syntax).parse().unwrap();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].tag(), "a");
    assert_eq!(blocks[0].kind, None);
    assert_eq!(blocks[0].body, "```\n1\n```");
    assert_eq!(blocks[0].location.source_id, 7);
    assert_eq!(blocks[1].kind, Some(BlockKind::Output));
    assert_eq!(blocks[1].span.start, blocks[1].location.offset);
}

#[test]
fn parser_reports_missing_tag_with_line() {
    let document = Document::new("\n\n<!--- type: in -->\n```\nx\n```\n", 0, "/docs");
    let syntax = Syntax::default();
    let error = Parser::new(&document, &syntax).parse().unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::MissingTag);
    assert_eq!(error.line, 3);
}

#[test]
fn parser_reports_invalid_yaml() {
    let document = Document::new("<!--- tag: [unclosed -->\n```\nx\n```\n", 0, "/docs");
    let syntax = Syntax::default();
    let error = Parser::new(&document, &syntax).parse().unwrap_err();
    assert_eq!(error.kind, ParseErrorKind::InvalidConfig);
    assert_eq!(error.line, 1);
}
