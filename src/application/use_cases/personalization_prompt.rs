use crate::domain::{section_text, HomeworkTemplate, Student};

pub const PERSONALIZATION_SYSTEM_PROMPT: &str =
    "You are an expert ESL teacher creating personalized homework for your students.";

const NOT_SPECIFIED: &str = "Not specified";

/// Builds the user prompt asking the LLM to rewrite a template's questions
/// for one student.
pub fn build_personalization_prompt(student: &Student, template: &HomeworkTemplate) -> String {
    let learning = &student.learning_context;
    let professional = &student.professional_background;

    let interests = if student.interests.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        student.interest_names().join(", ")
    };

    let base_questions = template
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| q.prompt_block(i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "STUDENT PROFILE:\n\
         - Name: {name}\n\
         - Proficiency Level: {level}\n\
         - Learning Goals: {goals}\n\
         - Strengths: {strengths}\n\
         - Areas for Improvement: {improvement}\n\
         - Interests: {interests}\n\
         - Occupation: {occupation}\n\
         - Industry: {industry}\n\
         - Cultural Background: {culture}\n\
         \n\
         HOMEWORK TEMPLATE:\n\
         - Title: {title}\n\
         - Proficiency Level: {template_level}\n\
         \n\
         BASE QUESTIONS:\n\
         {base_questions}\n\
         TASK:\n\
         Create personalized versions of each question that would be more engaging, \
         relevant, and effective for this specific student.\n\
         \n\
         For each question:\n\
         1. Adapt the content to match the student's interests, profession, and cultural background\n\
         2. Keep the same grammatical structure and language learning objectives\n\
         3. Match the difficulty to the student's proficiency level\n\
         4. Address the student's specific learning goals and areas for improvement\n\
         5. Include clear instructions and expected answers\n\
         \n\
         Use the EXACT same format as the base questions, with \"Question:\", \
         \"Instructions:\", and \"Expected Answer:\" labels.\n\
         Return ONLY the personalized questions without any additional text or explanations.\n",
        name = student.full_name(),
        level = student.proficiency_level,
        goals = section_text(learning, "learning_goals"),
        strengths = section_text(learning, "strengths"),
        improvement = section_text(learning, "areas_for_improvement"),
        interests = interests,
        occupation = or_not_specified(section_text(professional, "current_occupation")),
        industry = or_not_specified(section_text(professional, "industry")),
        culture = or_not_specified(section_text(
            &student.cultural_elements,
            "cultural_background"
        )),
        title = template.name,
        template_level = template.proficiency_level,
        base_questions = base_questions,
    )
}

fn or_not_specified(value: String) -> String {
    if value.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        value
    }
}
