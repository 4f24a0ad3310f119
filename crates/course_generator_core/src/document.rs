//! crates/course_generator_core/src/document.rs
//!
//! The finished course: an ordered list of module sections, each holding its
//! lesson bodies and a quiz. Sections are appended in structure order through
//! `CourseDocumentBuilder`, and the markdown rendering is derived from them.

use std::fmt::Write;

/// Separator written after every lesson body.
pub const LESSON_SEPARATOR: &str = "---";

/// Header that opens the quiz of a module.
pub const QUIZ_HEADER: &str = "## Quiz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSection {
    pub title: String,
    pub body: String,
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSection {
    pub body: String,
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSection {
    pub title: String,
    pub lessons: Vec<LessonSection>,
    pub quiz: QuizSection,
}

impl ModuleSection {
    pub fn to_markdown(&self) -> String {
        let mut text = render_lessons(&self.title, &self.lessons);
        let _ = write!(text, "{}\n{}\n\n", QUIZ_HEADER, self.quiz.body);
        text
    }
}

/// The complete generated course. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDocument {
    course_name: String,
    modules: Vec<ModuleSection>,
}

impl CourseDocument {
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    pub fn modules(&self) -> &[ModuleSection] {
        &self.modules
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of units in the document that hold placeholder text.
    pub fn placeholder_count(&self) -> usize {
        self.modules
            .iter()
            .map(|m| {
                m.lessons.iter().filter(|l| l.placeholder).count() + usize::from(m.quiz.placeholder)
            })
            .sum()
    }

    /// Plain text with markdown-style headers, one `# ` header per module.
    pub fn to_markdown(&self) -> String {
        self.modules
            .iter()
            .map(|m| format!("{}\n\n", m.to_markdown()))
            .collect()
    }
}

//=========================================================================================
// Builders
//=========================================================================================

/// Ordered-append builder for a `CourseDocument`.
#[derive(Debug)]
pub struct CourseDocumentBuilder {
    course_name: String,
    modules: Vec<ModuleSection>,
}

impl CourseDocumentBuilder {
    pub fn new(course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            modules: Vec::new(),
        }
    }

    pub fn begin_module(&self, title: impl Into<String>) -> ModuleDraft {
        ModuleDraft {
            title: title.into(),
            lessons: Vec::new(),
        }
    }

    pub fn push_module(&mut self, module: ModuleSection) {
        self.modules.push(module);
    }

    pub fn build(self) -> CourseDocument {
        CourseDocument {
            course_name: self.course_name,
            modules: self.modules,
        }
    }
}

/// A module whose lessons are still being written.
#[derive(Debug)]
pub struct ModuleDraft {
    title: String,
    lessons: Vec<LessonSection>,
}

impl ModuleDraft {
    pub fn push_lesson(&mut self, lesson: LessonSection) {
        self.lessons.push(lesson);
    }

    /// The module header and every lesson written so far; this is the text a
    /// quiz is generated from.
    pub fn to_markdown(&self) -> String {
        render_lessons(&self.title, &self.lessons)
    }

    pub fn finish(self, quiz: QuizSection) -> ModuleSection {
        ModuleSection {
            title: self.title,
            lessons: self.lessons,
            quiz,
        }
    }
}

fn render_lessons(title: &str, lessons: &[LessonSection]) -> String {
    let mut text = format!("# {}\n\n", title);
    for lesson in lessons {
        let _ = write!(text, "{}\n\n{}\n\n", lesson.body, LESSON_SEPARATOR);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(body: &str) -> LessonSection {
        LessonSection {
            title: "Lesson".to_string(),
            body: body.to_string(),
            placeholder: false,
        }
    }

    #[test]
    fn module_renders_header_lessons_and_quiz() {
        let builder = CourseDocumentBuilder::new("Course");
        let mut draft = builder.begin_module("Module 1");
        draft.push_lesson(lesson("First body"));
        draft.push_lesson(lesson("Second body"));

        assert_eq!(
            draft.to_markdown(),
            "# Module 1\n\nFirst body\n\n---\n\nSecond body\n\n---\n\n"
        );

        let module = draft.finish(QuizSection {
            body: "Q1?".to_string(),
            placeholder: false,
        });
        assert_eq!(
            module.to_markdown(),
            "# Module 1\n\nFirst body\n\n---\n\nSecond body\n\n---\n\n## Quiz\nQ1?\n\n"
        );
    }

    #[test]
    fn modules_keep_append_order() {
        let mut builder = CourseDocumentBuilder::new("Course");
        for title in ["B", "A", "C"] {
            let draft = builder.begin_module(title);
            builder.push_module(draft.finish(QuizSection {
                body: String::new(),
                placeholder: true,
            }));
        }
        let document = builder.build();

        let titles: Vec<&str> = document.modules().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert_eq!(document.placeholder_count(), 3);

        let markdown = document.to_markdown();
        let b = markdown.find("# B").unwrap();
        let a = markdown.find("# A").unwrap();
        let c = markdown.find("# C").unwrap();
        assert!(b < a && a < c);
    }

    #[test]
    fn empty_document_renders_nothing() {
        let document = CourseDocumentBuilder::new("Course").build();
        assert!(document.is_empty());
        assert_eq!(document.to_markdown(), "");
    }
}
