use crate::{AnswerValue, SurveyOption, SurveyQuestion};

/// Static form of an option value, so the built-in script can live in a const.
#[derive(Debug, Clone, Copy)]
pub enum PresetValue {
    Text(&'static str),
    Number(i64),
}

impl From<PresetValue> for AnswerValue {
    fn from(value: PresetValue) -> Self {
        match value {
            PresetValue::Text(text) => AnswerValue::Text(text.to_string()),
            PresetValue::Number(n) => AnswerValue::Number(n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OptionPreset {
    pub label: &'static str,
    pub value: PresetValue,
}

/// A built-in survey question.
#[derive(Debug, Clone, Copy)]
pub struct QuestionPreset {
    pub id: &'static str,
    pub question: &'static str,
    pub description: &'static str,
    pub options: &'static [OptionPreset],
    pub field: &'static str,
}

impl QuestionPreset {
    pub fn to_question(&self) -> SurveyQuestion {
        SurveyQuestion {
            id: self.id.to_string(),
            question: self.question.to_string(),
            description: (!self.description.is_empty()).then(|| self.description.to_string()),
            options: self
                .options
                .iter()
                .map(|o| SurveyOption::new(o.label, o.value))
                .collect(),
            field: self.field.to_string(),
        }
    }
}

const fn text(label: &'static str, value: &'static str) -> OptionPreset {
    OptionPreset {
        label,
        value: PresetValue::Text(value),
    }
}

const fn score(label: &'static str, value: i64) -> OptionPreset {
    OptionPreset {
        label,
        value: PresetValue::Number(value),
    }
}

pub const LIFESTYLE_QUESTIONS: &[QuestionPreset] = &[
    QuestionPreset {
        id: "sleep",
        question: "When do you usually go to bed? 🌙",
        description: "Your sleep schedule helps us match you with compatible roommates",
        options: &[
            text("Early bird - asleep by 10 PM", "Early"),
            text("Balanced - around 11 PM-12 AM ⏰", "On-time"),
            text("Night owl - up past midnight 🦉", "Night owl"),
        ],
        field: "sleep",
    },
    QuestionPreset {
        id: "eating",
        question: "What's your dietary preference? 🍽️",
        description: "Helps us match food compatibility",
        options: &[
            text("Vegetarian 🌱", "Vegetarian"),
            text("Vegan 🌿", "Vegan"),
            text("Flexitarian (mostly veg) 🥗", "Flexitarian"),
            text("Non-vegetarian 🍗", "Non-vegetarian"),
            text("Eggetarian (veg + eggs) 🥚", "Eggetarian"),
        ],
        field: "eating",
    },
    QuestionPreset {
        id: "cleanliness",
        question: "How tidy are you? 🧹",
        description: "Be honest - this helps avoid conflicts!",
        options: &[
            score("Very tidy - everything in its place ✨", 5),
            score("Mostly organized 🧼", 4),
            score("Moderately tidy 👍", 3),
            score("A bit messy but functional 🌀", 2),
            score("Creative chaos - I know where everything is 😅", 1),
        ],
        field: "cleanliness",
    },
    QuestionPreset {
        id: "sociability",
        question: "How social are you at home? 🗣️",
        description: "Do you prefer quiet time or hanging out together?",
        options: &[
            text("Quiet & private - need my space 🤫", "Quiet"),
            text("Balanced - some alone time, some social 🧘", "Balanced"),
            text("Social butterfly - love hanging out 🎉", "Social/Chill"),
        ],
        field: "sociability",
    },
    QuestionPreset {
        id: "sharing",
        question: "How do you feel about sharing food? 🍕",
        description: "This helps us match sharing preferences",
        options: &[
            text("Prefer keeping things separate 🙅", "Not comfortable"),
            text("Okay with some sharing 🤝", "Somewhat okay"),
            text("Love sharing food! 🥡", "Very open"),
        ],
        field: "sharing",
    },
];

/// The built-in lifestyle survey as owned questions.
pub fn lifestyle_questions() -> Vec<SurveyQuestion> {
    LIFESTYLE_QUESTIONS.iter().map(QuestionPreset::to_question).collect()
}

/// Look up a built-in question by id.
pub fn preset_by_id(id: &str) -> Option<&'static QuestionPreset> {
    LIFESTYLE_QUESTIONS.iter().find(|q| q.id == id)
}
