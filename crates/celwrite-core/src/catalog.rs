//! Question catalog: the built-in bank, extra banks, and custom questions.

use crate::error::ValidationError;
use crate::model::{Question, TaskKind, WordRange};

const EMAIL_GUIDELINES: [&str; 5] = [
    "A formal/informal salutation",
    "Clear statement of purpose",
    "Three main points (addressing bullets)",
    "A logical concluding sentence",
    "Appropriate sign-off",
];

const SURVEY_GUIDELINES: [&str; 5] = [
    "Direct statement of choice",
    "First reason with supporting details",
    "Second reason with supporting details",
    "Comparison to the other option",
    "Summary/Closing",
];

const CUSTOM_EMAIL_GUIDELINES: [&str; 5] = [
    "Proper Salutation",
    "Clear Opening",
    "Contextual Content",
    "Polite Conclusion",
    "Closing",
];

const CUSTOM_SURVEY_GUIDELINES: [&str; 5] = [
    "Clear Preference",
    "Detailed Argument 1",
    "Detailed Argument 2",
    "Comparative View",
    "Closing",
];

/// Default guideline checklist for catalog questions of this kind.
pub fn default_guidelines(kind: TaskKind) -> Vec<String> {
    let list: &[&str] = match kind {
        TaskKind::Email => &EMAIL_GUIDELINES,
        TaskKind::Survey => &SURVEY_GUIDELINES,
    };
    list.iter().map(|s| s.to_string()).collect()
}

fn custom_guidelines(kind: TaskKind) -> Vec<String> {
    let list: &[&str] = match kind {
        TaskKind::Email => &CUSTOM_EMAIL_GUIDELINES,
        TaskKind::Survey => &CUSTOM_SURVEY_GUIDELINES,
    };
    list.iter().map(|s| s.to_string()).collect()
}

/// An ordered collection of questions with unique ids.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with celwrite: five email and five survey tasks.
    pub fn builtin() -> Self {
        Self {
            questions: builtin_questions(),
        }
    }

    /// All questions of `kind`, in catalog order.
    pub fn list_by_kind(&self, kind: TaskKind) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.kind == kind).collect()
    }

    pub fn all(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Append questions, validating each. Fails without modifying the catalog
    /// if any question is invalid or its id is already present.
    pub fn extend(
        &mut self,
        questions: impl IntoIterator<Item = Question>,
    ) -> Result<(), ValidationError> {
        let incoming: Vec<Question> = questions.into_iter().collect();
        let mut seen: std::collections::HashSet<&str> =
            self.questions.iter().map(|q| q.id.as_str()).collect();
        for q in &incoming {
            q.validate()?;
            if !seen.insert(q.id.as_str()) {
                return Err(ValidationError::DuplicateId(q.id.clone()));
            }
        }
        self.questions.extend(incoming);
        Ok(())
    }
}

/// Build a user-defined question with kind-dependent defaults.
///
/// Fails if `title` or `prompt_text` is empty or whitespace-only.
pub fn create_custom(
    kind: TaskKind,
    title: &str,
    prompt_text: &str,
) -> Result<Question, ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if prompt_text.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    Ok(Question {
        id: format!("custom-{}", uuid::Uuid::new_v4()),
        kind,
        title: title.to_string(),
        prompt_text: prompt_text.to_string(),
        word_count: WordRange::DEFAULT,
        time_limit_minutes: kind.default_time_limit(),
        choices: None,
        guidelines: Some(custom_guidelines(kind)),
    })
}

fn email(id: &str, title: &str, prompt: &str) -> Question {
    Question {
        id: id.into(),
        kind: TaskKind::Email,
        title: title.into(),
        prompt_text: prompt.into(),
        word_count: WordRange::DEFAULT,
        time_limit_minutes: TaskKind::Email.default_time_limit(),
        choices: None,
        guidelines: Some(default_guidelines(TaskKind::Email)),
    }
}

fn survey(id: &str, title: &str, prompt: &str, a: &str, b: &str) -> Question {
    Question {
        id: id.into(),
        kind: TaskKind::Survey,
        title: title.into(),
        prompt_text: prompt.into(),
        word_count: WordRange::DEFAULT,
        time_limit_minutes: TaskKind::Survey.default_time_limit(),
        choices: Some(vec![a.into(), b.into()]),
        guidelines: Some(default_guidelines(TaskKind::Survey)),
    }
}

fn builtin_questions() -> Vec<Question> {
    vec![
        email(
            "t1-1",
            "Noise Complaint to Neighbor",
            "You live in an apartment and your neighbor has been making loud noise late at night for the past week. Write an email to your neighbor in about 150-200 words. Describe the noise, explain how it affects you, and suggest a solution.",
        ),
        email(
            "t1-2",
            "Applying for an Internal Promotion",
            "A new senior position has opened up in your department. Write an email to your manager expressing interest. Outline your current achievements, explain why you are qualified, and request a meeting to discuss the role.",
        ),
        email(
            "t1-3",
            "Missing Delivery",
            "You ordered an expensive electronic item online, but it never arrived even though the tracking says \"delivered.\" Write an email to the customer service department. Detail the order info, explain your frustration, and demand a refund or replacement.",
        ),
        email(
            "t1-4",
            "Requesting a Reference",
            "You are applying for a master's degree program. Write an email to your former professor. Remind them of who you are, explain the program you are applying for, and ask if they would be willing to provide a letter of recommendation.",
        ),
        email(
            "t1-5",
            "Organizing a Team Lunch",
            "Your team has just finished a major project. Write an email to your team members. Congratulate them on the success, suggest a celebration lunch, and ask for their dietary preferences and availability.",
        ),
        survey(
            "t2-1",
            "New Office Policy: Remote Work",
            "Your company is considering a new policy where employees can work from home three days a week, but must share desks (hot-desking) when in the office. Choose one of the two options and explain your choice.",
            "Option A: Full Remote Work with Hot-Desking",
            "Option B: Fixed Desks with only 1 day Remote Work",
        ),
        survey(
            "t2-2",
            "Community Park Development",
            "The city council is deciding how to use a vacant plot of land in your neighborhood. They have two proposals. Choose one and provide your reasons.",
            "Option A: Build a Children's Playground and Picnic Area",
            "Option B: Construct an Outdoor Fitness Gym and Running Track",
        ),
        survey(
            "t2-3",
            "Company Training Program",
            "Your HR department wants to improve employee skills. They are choosing between two types of training. Select the one you prefer and justify your decision.",
            "Option A: Technical Skills Workshops",
            "Option B: Soft Skills and Leadership Seminar",
        ),
        survey(
            "t2-4",
            "Public Transit Improvements",
            "Your local government has received funding for transit improvements. They are surveying residents on two potential projects. Which do you support?",
            "Option A: Increasing the frequency of existing bus routes",
            "Option B: Building a new light-rail line connecting to downtown",
        ),
        survey(
            "t2-5",
            "School Cafeteria Menu Change",
            "The local school board is debating the cafeteria menu for the next academic year. Which approach do you think is better for students?",
            "Option A: 100% Vegetarian and healthy menu",
            "Option B: Diverse menu including meat but with higher prices",
        ),
    ]
}
