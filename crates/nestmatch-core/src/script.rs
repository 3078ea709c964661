use std::collections::HashSet;

use nestmatch_schema::{lifestyle_questions, SurveyQuestion};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ScriptError;

/// Ordered, validated list of survey questions. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<SurveyQuestion>")]
pub struct SurveyScript {
    questions: Vec<SurveyQuestion>,
}

impl SurveyScript {
    pub fn new(questions: Vec<SurveyQuestion>) -> Result<Self, ScriptError> {
        if questions.is_empty() {
            return Err(ScriptError::Empty);
        }

        let mut fields = HashSet::new();
        for question in &questions {
            if !fields.insert(question.field.as_str()) {
                return Err(ScriptError::DuplicateField {
                    field: question.field.clone(),
                });
            }
            if question.options.is_empty() {
                return Err(ScriptError::NoOptions {
                    id: question.id.clone(),
                });
            }
            let mut values = HashSet::new();
            for option in &question.options {
                if !values.insert(&option.value) {
                    return Err(ScriptError::DuplicateOptionValue {
                        id: question.id.clone(),
                        value: option.value.clone(),
                    });
                }
            }
        }

        Ok(Self { questions })
    }

    /// The built-in five-question lifestyle survey.
    pub fn lifestyle() -> Self {
        Self {
            questions: lifestyle_questions(),
        }
    }

    pub fn questions(&self) -> &[SurveyQuestion] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&SurveyQuestion> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl TryFrom<Vec<SurveyQuestion>> for SurveyScript {
    type Error = ScriptError;

    fn try_from(questions: Vec<SurveyQuestion>) -> Result<Self, Self::Error> {
        Self::new(questions)
    }
}

impl Serialize for SurveyScript {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.questions.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestmatch_schema::SurveyOption;

    fn question(field: &str, options: Vec<SurveyOption>) -> SurveyQuestion {
        SurveyQuestion {
            id: field.to_string(),
            question: format!("{field}?"),
            description: None,
            options,
            field: field.to_string(),
        }
    }

    #[test]
    fn lifestyle_script_is_valid() {
        let script = SurveyScript::lifestyle();
        assert_eq!(script.len(), 5);
        assert_eq!(SurveyScript::new(script.questions().to_vec()).unwrap(), script);
    }

    #[test]
    fn rejects_empty_script() {
        assert_eq!(SurveyScript::new(vec![]).unwrap_err(), ScriptError::Empty);
    }

    #[test]
    fn rejects_duplicate_fields() {
        let err = SurveyScript::new(vec![
            question("sleep", vec![SurveyOption::new("Early", "Early")]),
            question("sleep", vec![SurveyOption::new("Late", "Late")]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ScriptError::DuplicateField {
                field: "sleep".into()
            }
        );
    }

    #[test]
    fn rejects_question_without_options() {
        let err = SurveyScript::new(vec![question("sleep", vec![])]).unwrap_err();
        assert!(matches!(err, ScriptError::NoOptions { id } if id == "sleep"));
    }

    #[test]
    fn rejects_repeated_option_value() {
        let err = SurveyScript::new(vec![question(
            "cleanliness",
            vec![SurveyOption::new("Tidy", 5), SurveyOption::new("Very tidy", 5)],
        )])
        .unwrap_err();
        assert!(err.to_string().contains("repeats option value 5"));
    }

    #[test]
    fn deserializes_from_yaml_with_validation() {
        let yaml = r#"
- id: sleep
  question: When do you usually go to bed?
  options:
    - { label: Early bird, value: Early }
    - { label: Night owl, value: Night owl }
  mlField: sleep
- id: cleanliness
  question: How tidy are you?
  options:
    - { label: Very tidy, value: 5 }
  field: cleanliness
"#;
        let script: SurveyScript = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.question(0).unwrap().field, "sleep");
        assert_eq!(
            script.question(1).unwrap().options[0].value,
            nestmatch_schema::AnswerValue::Number(5)
        );

        let duplicate = "- {id: a, question: a, options: [{label: x, value: x}], field: f}\n- {id: b, question: b, options: [{label: y, value: y}], field: f}\n";
        let err = serde_yaml::from_str::<SurveyScript>(duplicate).unwrap_err();
        assert!(err.to_string().contains("duplicate field"));
    }

    #[test]
    fn serializes_as_plain_list() {
        let script = SurveyScript::new(vec![question("sleep", vec![SurveyOption::new("Early", "Early")])]).unwrap();
        let json = serde_json::to_value(&script).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["field"], "sleep");
    }
}
