//! Receipt PDF rendering.
//!
//! A receipt is a single-page PDF: a centered title, one line per form
//! field, then one labeled hyperlink line per stored document. Rendering
//! is pure; the handler is responsible for writing the bytes durably.

use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::writers::Annotation;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};
use submission_store::Submission;

// US Letter, points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;
const LEADING: f32 = 18.0;

/// One hyperlink line on the receipt.
#[derive(Debug, Clone)]
pub struct ReceiptLink {
    /// Line label, e.g. "Passport/ID".
    pub label: &'static str,
    /// Link text (the upload's original filename).
    pub text: String,
    /// Absolute link target.
    pub url: String,
}

/// Approximate rendered width of Helvetica text, in points.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

/// Collapse whitespace runs in a full name to single underscores.
pub fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Unique receipt filename: `{millis}-{collapsed full name}.pdf`.
///
/// Path separators are stripped so a client-supplied name cannot escape
/// the submissions directory.
pub fn receipt_filename(full_name: &str, millis: i64) -> String {
    let safe: String = full_name
        .chars()
        .filter(|c| !c.is_control() && *c != '/' && *c != '\\')
        .collect();
    format!("{}-{}.pdf", millis, collapse_whitespace(&safe))
}

/// Render the receipt PDF for an accepted submission.
pub fn render(submission: &Submission, links: &[ReceiptLink]) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let font_id = Ref::new(4);
    let content_id = Ref::new(5);

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut content = Content::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    let title = "Lottery Registration";
    let title_x = (PAGE_WIDTH - text_width(title, TITLE_SIZE)) / 2.0;
    content.begin_text();
    content.set_font(Name(b"F1"), TITLE_SIZE);
    content.next_line(title_x, y);
    content.show(Str(title.as_bytes()));
    content.end_text();
    y -= LEADING * 2.0;

    let fields = [
        format!("Full Name: {}", submission.full_name),
        format!("Email: {}", submission.email),
        format!("Phone: {}", submission.phone),
        format!("Country: {}", submission.country.as_str()),
        format!("Date of Birth: {}", submission.date_of_birth_str()),
    ];
    for line in &fields {
        content.begin_text();
        content.set_font(Name(b"F1"), BODY_SIZE);
        content.next_line(MARGIN, y);
        content.show(Str(line.as_bytes()));
        content.end_text();
        y -= LEADING;
    }
    y -= LEADING;

    // Link lines: black label, blue underlined link text, plus the URI
    // annotation rectangle over the link text.
    let mut link_rects: Vec<(Rect, &str)> = Vec::new();
    for link in links {
        let label = format!("{}: ", link.label);
        content.begin_text();
        content.set_font(Name(b"F1"), BODY_SIZE);
        content.next_line(MARGIN, y);
        content.show(Str(label.as_bytes()));
        content.end_text();

        let text_x = MARGIN + text_width(&label, BODY_SIZE);
        let text_w = text_width(&link.text, BODY_SIZE);

        content.begin_text();
        content.set_font(Name(b"F1"), BODY_SIZE);
        content.set_fill_rgb(0.0, 0.0, 1.0);
        content.next_line(text_x, y);
        content.show(Str(link.text.as_bytes()));
        content.end_text();

        content.set_stroke_rgb(0.0, 0.0, 1.0);
        content.move_to(text_x, y - 2.0);
        content.line_to(text_x + text_w, y - 2.0);
        content.stroke();

        content.set_fill_rgb(0.0, 0.0, 0.0);
        content.set_stroke_rgb(0.0, 0.0, 0.0);

        link_rects.push((
            Rect::new(text_x, y - 3.0, text_x + text_w, y + BODY_SIZE),
            link.url.as_str(),
        ));
        y -= LEADING;
    }

    {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(page_tree_id);
        page.contents(content_id);
        page.resources().fonts().pair(Name(b"F1"), font_id);

        let mut annotations = page.insert(Name(b"Annots")).array().typed::<Annotation>();
        for (rect, url) in &link_rects {
            let mut annot = annotations.push();
            annot.subtype(AnnotationType::Link);
            annot.rect(*rect);
            annot.action().action_type(ActionType::Uri).uri(Str(url.as_bytes()));
        }
        annotations.finish();
        page.finish();
    }

    pdf.type1_font(font_id).base_font(Name(b"Helvetica"));
    pdf.stream(content_id, &content.finish());

    pdf.finish()
}
