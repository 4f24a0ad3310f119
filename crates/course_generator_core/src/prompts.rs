//! crates/course_generator_core/src/prompts.rs
//!
//! Instruction templates for the four kinds of model calls in a course run.

use crate::domain::{CourseRequest, Outline};

const OUTLINE_INSTRUCTIONS: &str = r#"You are an experienced instructional designer. Build a course outline from the parameters given below.

Requirements:
- Produce exactly the requested number of modules.
- Give every module a short, descriptive title and 3 to 5 lessons.
- For every lesson write one sentence describing what the learner will be able to do afterwards.
- Pitch vocabulary and depth at the stated audience level and difficulty.
- Spread the workload sensibly over the stated duration and credit value.
- Present the outline as a markdown table with the columns: Module, Lesson, Learning Outcome.
- Do not write lesson content yet."#;

const OUTLINE_INPUT_TEMPLATE: &str = r#"Topic: {course_name}
Audience Level: {audience_level}
Difficulty: {difficulty}
Number of Modules: {module_count}
Duration: {duration}
Credit: {credit}"#;

const STRUCTURE_INSTRUCTIONS: &str = r#"Convert the course outline below into a JSON object.

Rules:
- Each key is a module title, written exactly as in the outline.
- Each value is an array of that module's lesson titles, in outline order.
- Keep modules in outline order.
- Respond with the JSON object only. No prose, no markdown, no extra keys.

Example:
{"Module 1: Foundations": ["What is X?", "Setting up"], "Module 2: Practice": ["First project"]}"#;

const LESSON_TEMPLATE: &str = r####"You are writing the course "{course_name}".

Write the full content for the lesson "{lesson}", which belongs to the module "{module}".

The lesson must:
- Open with a "### {lesson}" heading.
- Explain the key concepts clearly, building from simple to advanced.
- Include at least one worked example.
- End with a short summary of the main takeaways.

Use markdown formatting. Do not write a quiz."####;

const QUIZ_INSTRUCTIONS: &str = r##"You are an assessment designer. Write a quiz for the course module below.

Requirements:
- 5 multiple-choice questions, each with 4 options labelled A to D.
- Every question must be answerable from the module content alone.
- After all questions, list the correct answers with a one-line explanation each.
- Use markdown formatting, but do not use top-level "#" headers."##;

/// The prompt that turns a course request into a free-text outline.
pub fn outline_prompt(request: &CourseRequest) -> String {
    let user_input = OUTLINE_INPUT_TEMPLATE
        .replace("{course_name}", &request.name)
        .replace("{audience_level}", &request.audience_level.to_string())
        .replace("{difficulty}", &request.difficulty.to_string())
        .replace("{module_count}", &request.module_count.to_string())
        .replace("{duration}", &request.duration)
        .replace("{credit}", &request.credit);

    format!("{}\n\nUser Input Topic:\n{}", OUTLINE_INSTRUCTIONS, user_input)
}

/// The prompt that asks for the outline as a module→lessons JSON object.
pub fn structure_prompt(outline: &Outline) -> String {
    format!("{}\n\nCourse Outline:\n{}", STRUCTURE_INSTRUCTIONS, outline.as_str())
}

pub fn lesson_prompt(lesson: &str, module: &str, course_name: &str) -> String {
    LESSON_TEMPLATE
        .replace("{course_name}", course_name)
        .replace("{module}", module)
        .replace("{lesson}", lesson)
}

/// The quiz prompt embeds the whole accumulated module text.
pub fn quiz_prompt(module_text: &str) -> String {
    format!("{}\n\nModule Content:\n{}", QUIZ_INSTRUCTIONS, module_text)
}
