//! Regression tests for input that broke earlier pipeline revisions
//!
//! Each test pins one behavior on a minimal document so a future change in
//! tree building or lookups shows up as a single failing case.

use fb2_ingest::{parse_fb2, validate_fb2, Fb2Error, Fb2Parser, LimitKind, ParseLimits};

fn book_with_body(body: &str) -> String {
    format!(
        r#"<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
<description><title-info><book-title>T</book-title></title-info></description>
<body>{}</body>
</FictionBook>"#,
        body
    )
}

fn first_content(body: &str) -> String {
    let book = parse_fb2(book_with_body(body).as_bytes()).expect("parse failed");
    book.chapters()
        .first()
        .map(|c| c.content.clone())
        .expect("no chapters")
}

// =============================================================================
// XML Entity Handling
// =============================================================================

#[test]
fn xml_entity_ampersand_unescaped() {
    let content = first_content("<section><p>Barnes &amp; Noble</p></section>");
    assert_eq!(content, "Barnes & Noble");
}

#[test]
fn xml_entity_less_greater_than_unescaped() {
    let content = first_content("<section><p>x &lt; y &gt; z</p></section>");
    assert_eq!(content, "x < y > z");
}

#[test]
fn xml_entity_numeric_unescaped() {
    let content = first_content("<section><p>&#8220;Hello&#8221; &#x2014; done</p></section>");
    assert_eq!(content, "\u{201C}Hello\u{201D} \u{2014} done");
}

#[test]
fn cdata_text_kept_verbatim() {
    let content = first_content("<section><p><![CDATA[a <b> & c]]></p></section>");
    assert_eq!(content, "a <b> & c");
}

// =============================================================================
// Inline Formatting
// =============================================================================

#[test]
fn inline_markup_keeps_surrounding_spaces() {
    let content = first_content(
        "<section><p>One <emphasis>two</emphasis> <strong>three</strong>, four.</p></section>",
    );
    assert_eq!(content, "One two three, four.");
}

#[test]
fn inline_link_text_included_in_paragraph() {
    let content = first_content(
        r#"<section><p>See note<a xmlns:l="http://www.w3.org/1999/xlink" l:href="n1" type="note">[1]</a>.</p></section>"#,
    );
    assert_eq!(content, "See note[1].");
}

#[test]
fn paragraph_whitespace_trimmed_but_inner_preserved() {
    let content = first_content("<section><p>\n   Leading and  double  spaced \n</p></section>");
    assert_eq!(content, "Leading and  double  spaced");
}

#[test]
fn internal_dtd_entity_expanded() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE FictionBook [
  <!ENTITY zone "the Zone">
]>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
<description><title-info><book-title>Picnic in &zone;</book-title></title-info></description>
<body><section><p>Back to &zone; again.</p></section></body>
</FictionBook>"#;
    let book = parse_fb2(xml.as_bytes()).expect("parse failed");
    assert_eq!(book.title(), "Picnic in the Zone");
    assert_eq!(book.chapters()[0].content, "Back to the Zone again.");
}

#[test]
fn undeclared_entity_is_parse_error() {
    let xml = book_with_body("<section><p>&nbsp;</p></section>");
    assert!(matches!(parse_fb2(xml.as_bytes()), Err(Fb2Error::Parse(_))));
}

// =============================================================================
// Byte Encodings
// =============================================================================

#[cfg(feature = "encoding")]
fn encode_utf16(text: &str, big_endian: bool) -> Vec<u8> {
    let mut bytes = if big_endian {
        vec![0xFE, 0xFF]
    } else {
        vec![0xFF, 0xFE]
    };
    for unit in text.encode_utf16() {
        if big_endian {
            bytes.extend_from_slice(&unit.to_be_bytes());
        } else {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
    }
    bytes
}

#[test]
fn invalid_utf8_is_parse_error() {
    let mut xml = br#"<?xml version="1.0" encoding="utf-8"?>
<FictionBook><description><title-info/></description><body><section><p>"#
        .to_vec();
    xml.extend_from_slice(&[0xFF, 0xFE]);
    xml.extend_from_slice(b"</p></section></body></FictionBook>");
    match parse_fb2(&xml) {
        Err(Fb2Error::Parse(msg)) => assert!(msg.contains("Decode error"), "{}", msg),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(validate_fb2(&xml).has_code("FB2_XML_MALFORMED"));
}

#[test]
fn utf8_bom_accepted() {
    let mut xml = b"\xEF\xBB\xBF".to_vec();
    xml.extend_from_slice(book_with_body("<section><p>Text</p></section>").as_bytes());
    let book = parse_fb2(&xml).expect("parse failed");
    assert_eq!(book.chapters()[0].content, "Text");
}

#[cfg(feature = "encoding")]
#[test]
fn utf16_with_bom_accepted() {
    let text = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n{}",
        book_with_body("<section><title><p>\u{41F}\u{440}\u{438}\u{432}\u{435}\u{442}</p></title><p>\u{41C}\u{438}\u{440}</p></section>")
    );
    for big_endian in [false, true] {
        let bytes = encode_utf16(&text, big_endian);
        let book = parse_fb2(&bytes).expect("parse failed");
        assert_eq!(book.title(), "T");
        assert_eq!(book.chapters()[0].title, "\u{41F}\u{440}\u{438}\u{432}\u{435}\u{442}");
        assert_eq!(book.chapters()[0].content, "\u{41C}\u{438}\u{440}");
        assert_eq!(book.source_len(), bytes.len());
        assert!(validate_fb2(&bytes).is_valid());
    }
}

#[cfg(feature = "encoding")]
#[test]
fn truncated_utf16_is_parse_error() {
    let mut bytes = encode_utf16(&book_with_body("<section><p>x</p></section>"), false);
    bytes.push(0x3C);
    assert!(matches!(parse_fb2(&bytes), Err(Fb2Error::Parse(_))));
}

// =============================================================================
// Namespace Handling
// =============================================================================

#[test]
fn prefixed_fictionbook_namespace_resolves() {
    let xml = br#"<fb:FictionBook xmlns:fb="http://www.gribuser.ru/xml/fictionbook/2.0">
<fb:description><fb:title-info><fb:book-title>Prefixed</fb:book-title></fb:title-info></fb:description>
<fb:body><fb:section><fb:p>Text</fb:p></fb:section></fb:body>
</fb:FictionBook>"#;
    let book = parse_fb2(xml).expect("parse failed");
    assert_eq!(book.title(), "Prefixed");
    assert_eq!(book.chapter_count(), 1);
}

#[test]
fn undeclared_prefix_is_parse_error() {
    let xml = book_with_body("<section><x:p>Text</x:p></section>");
    assert!(matches!(parse_fb2(xml.as_bytes()), Err(Fb2Error::Parse(_))));
}

#[test]
fn foreign_namespace_elements_ignored() {
    let content = first_content(
        r#"<section><p>Kept</p><p xmlns="urn:other">Foreign</p></section>"#,
    );
    assert_eq!(content, "Kept");
}

// =============================================================================
// Metadata Lookup Precision
// =============================================================================

#[test]
fn src_title_info_not_used_for_title() {
    let xml = br#"<FictionBook>
<description>
  <src-title-info><book-title>Original</book-title><lang>de</lang></src-title-info>
  <title-info><book-title>Translated</book-title></title-info>
</description>
<body/>
</FictionBook>"#;
    let book = parse_fb2(xml).expect("parse failed");
    assert_eq!(book.title(), "Translated");
    assert_eq!(book.language(), "ru");
}

#[test]
fn document_info_author_not_counted() {
    let xml = br#"<FictionBook>
<description>
  <title-info><author><last-name>Writer</last-name></author></title-info>
  <document-info><author><first-name>Scan</first-name><last-name>Ner</last-name></author></document-info>
</description>
<body/>
</FictionBook>"#;
    let book = parse_fb2(xml).expect("parse failed");
    assert_eq!(book.authors().to_vec(), vec!["Writer".to_string()]);
}

#[test]
fn missing_title_and_author_distinguishable() {
    let xml = br#"<FictionBook><description><title-info/></description><body/></FictionBook>"#;
    let report = validate_fb2(xml);
    assert!(report.is_valid());
    assert!(report.has_code("FB2_BOOK_TITLE_MISSING"));
    assert!(report.has_code("FB2_AUTHOR_MISSING"));
    assert!(report.has_code("FB2_LANG_MISSING"));
    assert!(report.has_code("FB2_NO_CHAPTERS"));
}

// =============================================================================
// Body Selection
// =============================================================================

#[test]
fn notes_body_before_main_text_is_not_skipped_over() {
    // The first body wins even when it is the notes body
    let xml = br#"<FictionBook>
<description><title-info/></description>
<body name="notes"><section><p>Footnote</p></section></body>
<body><section><p>Main</p></section></body>
</FictionBook>"#;
    let book = parse_fb2(xml).expect("parse failed");
    assert_eq!(book.chapter_count(), 1);
    assert_eq!(book.chapters()[0].content, "Footnote");
}

#[test]
fn body_level_paragraphs_not_chapters() {
    let content = first_content("<p>Loose</p><section><p>Inside</p></section><p>Loose again</p>");
    assert_eq!(content, "Inside");
}

// =============================================================================
// Hostile Input
// =============================================================================

#[test]
fn pathological_nesting_hits_depth_limit() {
    let depth = 10_000;
    let body = format!("{}{}", "<cite>".repeat(depth), "</cite>".repeat(depth));
    let xml = book_with_body(&body);
    let err = parse_fb2(xml.as_bytes()).unwrap_err();
    assert_eq!(
        err,
        Fb2Error::ResourceLimit {
            kind: LimitKind::Depth,
            limit: 256
        }
    );
    assert!(validate_fb2(xml.as_bytes()).has_code("FB2_RESOURCE_LIMIT"));
}

#[test]
fn nesting_within_limit_is_accepted() {
    let body = format!(
        "<section>{}<p>deep</p>{}<p>shallow</p></section>",
        "<cite>".repeat(100),
        "</cite>".repeat(100)
    );
    assert_eq!(first_content(&body), "shallow");
}

#[test]
fn raised_depth_limit_accepts_deeper_documents() {
    let depth = 300;
    let body = format!(
        "<section><p>x</p></section>{}{}",
        "<cite>".repeat(depth),
        "</cite>".repeat(depth)
    );
    let xml = book_with_body(&body);
    assert!(parse_fb2(xml.as_bytes()).is_err());
    let parser = Fb2Parser::new().with_limits(ParseLimits::default().with_max_depth(512));
    assert_eq!(parser.parse(xml.as_bytes()).expect("parse failed").chapter_count(), 1);
}

#[test]
fn second_root_element_rejected() {
    let xml = format!("{}<FictionBook/>", book_with_body(""));
    assert!(matches!(parse_fb2(xml.as_bytes()), Err(Fb2Error::Parse(_))));
}

#[test]
fn text_outside_root_rejected() {
    let xml = format!("garbage{}", book_with_body(""));
    assert!(matches!(parse_fb2(xml.as_bytes()), Err(Fb2Error::Parse(_))));
}

#[test]
fn mismatched_end_tag_rejected() {
    let xml = book_with_body("<section><p>Text</section></p>");
    assert!(matches!(parse_fb2(xml.as_bytes()), Err(Fb2Error::Parse(_))));
}

// =============================================================================
// Error Trait Implementations
// =============================================================================

#[test]
fn fb2_error_implements_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
    assert_error::<Fb2Error>();

    let err: Box<dyn std::error::Error> = Box::new(Fb2Error::Structure { missing: "body" });
    assert_eq!(
        err.to_string(),
        "Corrupt FB2 document: missing element body"
    );
}
