use text_size::{TextRange, TextSize};

use super::{DiagnosticKind, Diagnostics};

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::from(start), TextSize::from(end))
}

#[test]
fn builder_records_expectations() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnexpectedToken, range(4, 5))
        .expected("\";\"")
        .expected("identifier")
        .found("\"}\"")
        .emit();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.has_errors());

    let (offset, expected, found) = diagnostics.entries().next().unwrap();
    assert_eq!(offset, 4);
    assert_eq!(expected, ["\";\"", "identifier"]);
    assert_eq!(found, Some("\"}\""));
}

#[test]
fn plain_rendering_without_source() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::MissingToken, range(2, 2))
        .message("missing `;`")
        .expected("\";\"")
        .emit();

    let rendered = diagnostics.printer().render();
    assert_eq!(rendered, "error at 2..2: missing `;` (expected \";\")");
}

#[test]
fn snippet_rendering_underlines_range() {
    let source = "let x = ;";
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::ExpectedRule, range(8, 9))
        .message("expected expression")
        .emit();

    let rendered = diagnostics.render(source);
    assert!(rendered.contains("expected expression"));
    assert!(rendered.contains("let x = ;"));
}

#[test]
fn truncate_rolls_back_speculative_reports() {
    let mut diagnostics = Diagnostics::new();
    diagnostics
        .report(DiagnosticKind::UnexpectedToken, range(0, 1))
        .emit();
    let mark = diagnostics.mark();
    diagnostics
        .report(DiagnosticKind::UnexpectedToken, range(5, 6))
        .emit();
    diagnostics.truncate(mark);

    assert_eq!(diagnostics.len(), 1);
}
