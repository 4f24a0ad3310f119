//! services/api/src/adapters/pptx.rs
//!
//! Renders a course document as a PowerPoint deck: one title slide, then one
//! content slide per header-delimited section of the document text.
//!
//! Slide titles and bodies are cut to fixed lengths so long model output cannot
//! overflow a slide. The cut is deliberate and lossy.

use course_generator_core::{document::CourseDocument, ports::ExportError};
use regex::Regex;
use std::io::{Cursor, Write};
use std::sync::LazyLock;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_BODY_CHARS: usize = 1000;

const TITLE_SLIDE_SUBTITLE: &str = "Generated course content";

// A section starts at every newline directly followed by a header marker.
static SECTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n#").expect("section pattern is valid"));

/// Text of one slide, already truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub title: String,
    pub body: String,
}

/// Splits document text into one slide per header-delimited section.
/// Blank sections are skipped.
pub fn slide_sections(text: &str) -> Vec<Slide> {
    let mut starts = vec![0];
    starts.extend(SECTION_START.find_iter(text).map(|m| m.start() + 1));
    starts.push(text.len());

    starts
        .windows(2)
        .filter_map(|bounds| {
            let section = text[bounds[0]..bounds[1]].trim();
            if section.is_empty() {
                return None;
            }
            let (heading, body) = section.split_once('\n').unwrap_or((section, ""));
            let title = heading.trim_start_matches('#').trim();
            Some(Slide {
                title: truncate_chars(title, MAX_TITLE_CHARS),
                body: truncate_chars(body.trim(), MAX_BODY_CHARS),
            })
        })
        .collect()
}

/// The full deck for a document: the title slide followed by every section.
pub fn build_slides(document: &CourseDocument) -> Vec<Slide> {
    let mut slides = vec![Slide {
        title: truncate_chars(document.course_name(), MAX_TITLE_CHARS),
        body: TITLE_SLIDE_SUBTITLE.to_string(),
    }];
    slides.extend(slide_sections(&document.to_markdown()));
    slides
}

pub fn render_pptx(document: &CourseDocument) -> Result<Vec<u8>, ExportError> {
    if document.is_empty() {
        return Err(ExportError::EmptyDocument);
    }
    let slides = build_slides(document);

    let mut package = PackageWriter::new();
    package.add("[Content_Types].xml", &content_types_xml(slides.len()))?;
    package.add("_rels/.rels", ROOT_RELS_XML)?;
    package.add("ppt/presentation.xml", &presentation_xml(slides.len()))?;
    package.add(
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels_xml(slides.len()),
    )?;
    package.add("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML)?;
    package.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS_XML,
    )?;
    package.add("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_XML)?;
    package.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SLIDE_LAYOUT_RELS_XML,
    )?;
    package.add("ppt/theme/theme1.xml", THEME_XML)?;

    for (index, slide) in slides.iter().enumerate() {
        let number = index + 1;
        let xml = if index == 0 {
            slide_xml(slide, TITLE_SLIDE_STYLE)
        } else {
            slide_xml(slide, CONTENT_SLIDE_STYLE)
        };
        package.add(&format!("ppt/slides/slide{}.xml", number), &xml)?;
        package.add(
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            SLIDE_RELS_XML,
        )?;
    }

    package.finish()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // Control characters other than tab/newline are not allowed in XML 1.0.
            c if c.is_control() && c != '\t' && c != '\n' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

//=========================================================================================
// Zip Package
//=========================================================================================

struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
}

impl PackageWriter {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    fn add(&mut self, name: &str, content: &str) -> Result<(), ExportError> {
        self.zip
            .start_file(name, self.options)
            .map_err(|e| render_error(e.to_string()))?;
        self.zip
            .write_all(content.as_bytes())
            .map_err(|e| render_error(e.to_string()))
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let cursor = self.zip.finish().map_err(|e| render_error(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

fn render_error(reason: String) -> ExportError {
    ExportError::Render {
        format: "PPTX",
        reason,
    }
}

//=========================================================================================
// Slide Parts
//=========================================================================================

const SLIDE_WIDTH_EMU: u64 = 12_192_000;
const SLIDE_HEIGHT_EMU: u64 = 6_858_000;

/// Placement and font sizes (hundredths of a point) for a slide's two boxes.
struct SlideStyle {
    title_y: u64,
    title_height: u64,
    title_size: u32,
    body_y: u64,
    body_height: u64,
    body_size: u32,
}

const TITLE_SLIDE_STYLE: SlideStyle = SlideStyle {
    title_y: 2_130_000,
    title_height: 1_470_000,
    title_size: 4000,
    body_y: 3_886_000,
    body_height: 1_000_000,
    body_size: 2000,
};

const CONTENT_SLIDE_STYLE: SlideStyle = SlideStyle {
    title_y: 365_000,
    title_height: 1_000_000,
    title_size: 3200,
    body_y: 1_500_000,
    body_height: 4_900_000,
    body_size: 1400,
};

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const GROUP_SHAPE_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn slide_xml(slide: &Slide, style: SlideStyle) -> String {
    let margin = 457_200;
    let width = SLIDE_WIDTH_EMU - 2 * margin;
    let title = text_box(
        2,
        "Title",
        (margin, style.title_y, width, style.title_height),
        &slide.title,
        style.title_size,
    );
    let body = text_box(
        3,
        "Body",
        (margin, style.body_y, width, style.body_height),
        &slide.body,
        style.body_size,
    );
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree>{GROUP_SHAPE_PROPS}{title}{body}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

fn text_box(id: u32, name: &str, (x, y, cx, cy): (u64, u64, u64, u64), text: &str, size: u32) -> String {
    let paragraphs: String = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                format!(r#"<a:p><a:endParaRPr lang="en-US" sz="{size}"/></a:p>"#)
            } else {
                format!(
                    r#"<a:p><a:r><a:rPr lang="en-US" sz="{size}" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                    escape_xml(line)
                )
            }
        })
        .collect();
    // A text body needs at least one paragraph.
    let paragraphs = if paragraphs.is_empty() {
        format!(r#"<a:p><a:endParaRPr lang="en-US" sz="{size}"/></a:p>"#)
    } else {
        paragraphs
    };

    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
    )
}

//=========================================================================================
// Package Parts
//=========================================================================================

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn content_types_xml(slide_count: usize) -> String {
    let slides: String = (1..=slide_count)
        .map(|n| {
            format!(
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>{slides}</Types>"#
    )
}

fn presentation_xml(slide_count: usize) -> String {
    let slide_ids: String = (0..slide_count)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 3 + i))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{SLIDE_WIDTH_EMU}" cy="{SLIDE_HEIGHT_EMU}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let slides: String = (0..slide_count)
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{}" Type="{REL_TYPE_BASE}/slide" Target="slides/slide{}.xml"/>"#,
                3 + i,
                1 + i
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{REL_TYPE_BASE}/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="{REL_TYPE_BASE}/theme" Target="theme/theme1.xml"/>{slides}</Relationships>"#
    )
}

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#;

const SLIDE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#;

const SLIDE_MASTER_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const SLIDE_LAYOUT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const SLIDE_MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const SLIDE_LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Course Theme"><a:themeElements><a:clrScheme name="Course"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Course"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Course"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use course_generator_core::document::{CourseDocumentBuilder, LessonSection, QuizSection};
    use std::io::Read;
    use zip::ZipArchive;

    fn document(lessons: &[&str]) -> CourseDocument {
        let mut builder = CourseDocumentBuilder::new("Intro to X");
        for module in ["Basics", "Practice"] {
            let mut draft = builder.begin_module(module);
            for body in lessons {
                draft.push_lesson(LessonSection {
                    title: "Lesson".to_string(),
                    body: body.to_string(),
                    placeholder: false,
                });
            }
            builder.push_module(draft.finish(QuizSection {
                body: "1. Question?".to_string(),
                placeholder: false,
            }));
        }
        builder.build()
    }

    fn slide_entries(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn sections_split_on_header_lines() {
        let slides = slide_sections("# Module\n\nIntro\n\n---\n\n## Quiz\n1. Q?\n\n\n\n# Next\n\nMore");
        let titles: Vec<&str> = slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Module", "Quiz", "Next"]);
        assert_eq!(slides[0].body, "Intro\n\n---");
        assert_eq!(slides[1].body, "1. Q?");
    }

    #[test]
    fn hash_inside_a_line_does_not_split() {
        let slides = slide_sections("# C# basics\n\nUse C# and F# together");
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "C# basics");
    }

    #[test]
    fn titles_and_bodies_are_truncated() {
        let text = format!("# {}\n{}", "t".repeat(150), "b".repeat(1500));
        let slides = slide_sections(&text);
        assert_eq!(slides[0].title.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(slides[0].body.chars().count(), MAX_BODY_CHARS);
    }

    #[test]
    fn deck_has_title_slide_plus_one_per_section() {
        let document = document(&["### Lesson A\nBody A", "Body B"]);
        let sections = slide_sections(&document.to_markdown()).len();

        let bytes = render_pptx(&document).unwrap();

        assert_eq!(slide_entries(&bytes).len(), 1 + sections);
        // Two module headers, two quiz headers and two "### Lesson A" headers.
        assert_eq!(sections, 6);
    }

    #[test]
    fn slide_text_is_escaped() {
        let document = document(&["Use <T> & \"quotes\""]);
        let bytes = render_pptx(&document).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("ppt/slides/slide2.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Use &lt;T&gt; &amp; &quot;quotes&quot;"));
    }

    #[test]
    fn title_slide_carries_the_course_name() {
        let slides = build_slides(&document(&["Body"]));
        assert_eq!(slides[0].title, "Intro to X");
        assert_eq!(slides[0].body, TITLE_SLIDE_SUBTITLE);
    }

    #[test]
    fn empty_document_is_rejected() {
        let empty = CourseDocumentBuilder::new("Nothing").build();
        assert_eq!(render_pptx(&empty).unwrap_err(), ExportError::EmptyDocument);
    }
}
