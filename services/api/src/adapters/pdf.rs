//! services/api/src/adapters/pdf.rs
//!
//! Renders a course document as a single-font, flowed-text PDF.

use course_generator_core::{document::CourseDocument, ports::ExportError};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use unicode_normalization::UnicodeNormalization;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 7.0;
const FONT_SIZE_PT: f32 = 12.0;
const TEXT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const MM_PER_PT: f32 = 25.4 / 72.0;

/// Advance widths of bold Helvetica for `' '..='~'`, in thousandths of an em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

pub fn render_pdf(document: &CourseDocument) -> Result<Vec<u8>, ExportError> {
    if document.is_empty() {
        return Err(ExportError::EmptyDocument);
    }

    let text = to_ascii(&document.to_markdown());
    let lines: Vec<String> = text
        .lines()
        .flat_map(|line| wrap_line(line, TEXT_WIDTH_MM, glyph_width_mm))
        .collect();

    let render_error = |reason: String| ExportError::Render {
        format: "PDF",
        reason,
    };

    let (pdf, first_page, first_layer) = PdfDocument::new(
        document.course_name(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = pdf
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| render_error(format!("{:?}", e)))?;

    let lines_per_page = ((PAGE_HEIGHT_MM - 2.0 * MARGIN_MM) / LINE_HEIGHT_MM) as usize;
    let mut layer = pdf.get_page(first_page).get_layer(first_layer);

    for (index, chunk) in lines.chunks(lines_per_page).enumerate() {
        if index > 0 {
            let (page, page_layer) =
                pdf.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            layer = pdf.get_page(page).get_layer(page_layer);
        }
        for (row, line) in chunk.iter().enumerate() {
            let y = PAGE_HEIGHT_MM - MARGIN_MM - LINE_HEIGHT_MM * (row as f32 + 1.0);
            layer.use_text(line.as_str(), FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
        }
    }

    pdf.save_to_bytes()
        .map_err(|e| render_error(format!("{:?}", e)))
}

/// Decomposes accented characters and drops everything outside ASCII, which
/// the built-in PDF fonts cannot encode.
pub fn to_ascii(text: &str) -> String {
    text.nfkd().filter(|c| c.is_ascii()).collect()
}

/// Printed width of `c` at the document font size. Anything outside
/// printable ASCII is charged a full em.
fn glyph_width_mm(c: char) -> f32 {
    let units = (c as usize)
        .checked_sub(0x20)
        .and_then(|index| HELVETICA_BOLD_WIDTHS.get(index))
        .copied()
        .unwrap_or(1000);
    f32::from(units) / 1000.0 * FONT_SIZE_PT * MM_PER_PT
}

/// Greedy word wrap to `max_width`, measuring each character with
/// `width_of`. Words wider than a line are split hard. Blank input stays one
/// blank line so paragraph spacing survives.
pub fn wrap_line(line: &str, max_width: f32, width_of: impl Fn(char) -> f32) -> Vec<String> {
    let measure = |text: &str| text.chars().map(&width_of).sum::<f32>();
    let space = width_of(' ');
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in line.split_whitespace() {
        let mut word = word;
        while measure(word) > max_width {
            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            let (head, tail) = word.split_at(overflow_index(word, max_width, &width_of));
            wrapped.push(head.to_string());
            word = tail;
        }
        if word.is_empty() {
            continue;
        }

        let word_width = measure(word);
        if !current.is_empty() && current_width + space + word_width > max_width {
            wrapped.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_width += space;
        }
        current.push_str(word);
        current_width += word_width;
    }

    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Byte index of the first character that no longer fits, never zero.
fn overflow_index(word: &str, max_width: f32, width_of: impl Fn(char) -> f32) -> usize {
    let mut width = 0.0;
    for (index, c) in word.char_indices() {
        width += width_of(c);
        if width > max_width {
            return if index == 0 { c.len_utf8() } else { index };
        }
    }
    word.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_generator_core::document::{
        CourseDocumentBuilder, LessonSection, QuizSection,
    };

    fn document(lesson_body: &str) -> CourseDocument {
        let mut builder = CourseDocumentBuilder::new("Intro to X");
        let mut draft = builder.begin_module("Basics");
        draft.push_lesson(LessonSection {
            title: "What is X?".to_string(),
            body: lesson_body.to_string(),
            placeholder: false,
        });
        builder.push_module(draft.finish(QuizSection {
            body: "1. What is X?".to_string(),
            placeholder: false,
        }));
        builder.build()
    }

    #[test]
    fn non_empty_document_renders_pdf_bytes() {
        let bytes = render_pdf(&document("X is a thing. Café naïve résumé ✓")).unwrap();
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_documents_spill_onto_more_pages() {
        let body = "A line of lesson text.\n".repeat(200);
        let bytes = render_pdf(&document(&body)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_document_is_rejected() {
        let empty = CourseDocumentBuilder::new("Nothing").build();
        assert_eq!(render_pdf(&empty).unwrap_err(), ExportError::EmptyDocument);
    }

    #[test]
    fn accents_are_folded_to_ascii() {
        assert_eq!(to_ascii("Café naïve ✓"), "Cafe naive ");
    }

    #[test]
    fn wrap_respects_width_and_keeps_blank_lines() {
        let unit = |_: char| 1.0_f32;
        assert_eq!(wrap_line("", 10.0, unit), vec![""]);
        assert_eq!(
            wrap_line("one two three four", 9.0, unit),
            vec!["one two", "three", "four"]
        );
        assert_eq!(wrap_line("abcdefghij", 4.0, unit), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wide_glyph_lines_fit_between_the_margins() {
        let width = |text: &str| text.chars().map(glyph_width_mm).sum::<f32>();
        // Eighty capitals are wider than the page.
        assert!(width(&"M".repeat(80)) > TEXT_WIDTH_MM);

        for line in ["MMMM WWWW @@@@ ".repeat(20), "W".repeat(100)] {
            let wrapped = wrap_line(&line, TEXT_WIDTH_MM, glyph_width_mm);
            assert!(wrapped.len() > 1);
            for row in &wrapped {
                assert!(width(row) <= TEXT_WIDTH_MM, "{row:?} overflows");
            }
            assert_eq!(wrapped.concat().replace(' ', ""), line.replace(' ', ""));
        }
    }
}
