//! Core data model types for scorecalc.
//!
//! A [`Session`] is one respondent's submission: an ordered list of
//! [`Answer`]s, each pointing at the [`PossibleAnswer`] that was picked and
//! carrying the variable values the respondent typed in.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FormulaError;
use crate::formula::Bindings;

/// A question of the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub name: String,
}

/// One selectable answer of a question. Owns the scoring formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossibleAnswer {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub formula: String,
    pub question: Question,
}

/// A named input the respondent fills in (e.g. "distance").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
}

/// The value a respondent gave for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValue {
    pub variable: Variable,
    pub value: f64,
}

/// A respondent's pick of one possible answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub possible_answer: PossibleAnswer,
    #[serde(default)]
    pub variable_values: Vec<VariableValue>,
}

impl Answer {
    /// Identity of this answer inside a session.
    pub fn key(&self) -> AnswerKey {
        AnswerKey {
            question_id: self.possible_answer.question.id,
            possible_answer_id: self.possible_answer.id,
        }
    }

    pub fn formula(&self) -> &str {
        &self.possible_answer.formula
    }

    /// Binding map for the formula pipeline. Values are stringified.
    ///
    /// A variable name appearing twice is rejected.
    pub fn bindings(&self) -> Result<Bindings, FormulaError> {
        let mut bindings = BTreeMap::new();
        for vv in &self.variable_values {
            let name = vv.variable.name.clone();
            if bindings.insert(name.clone(), vv.value.to_string()).is_some() {
                return Err(FormulaError::DuplicateBinding(name));
            }
        }
        Ok(bindings)
    }
}

/// One respondent's submitted questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default, rename = "iskid")]
    pub is_kid: bool,
    #[serde(default, rename = "seminar_access_code")]
    pub seminar_access_code: Option<String>,
}

impl Session {
    pub fn category(&self) -> RespondentCategory {
        if self.is_kid {
            RespondentCategory::Kid
        } else {
            RespondentCategory::Adult
        }
    }
}

/// Respondent category flag carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RespondentCategory {
    Adult,
    Kid,
}

impl fmt::Display for RespondentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespondentCategory::Adult => write!(f, "adult"),
            RespondentCategory::Kid => write!(f, "kid"),
        }
    }
}

/// Identity of an answer: its question and the possible answer picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnswerKey {
    pub question_id: i64,
    pub possible_answer_id: i64,
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}/a{}", self.question_id, self.possible_answer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(formula: &str, vars: &[(&str, f64)]) -> Answer {
        Answer {
            possible_answer: PossibleAnswer {
                id: 11,
                name: "Car".into(),
                formula: formula.into(),
                question: Question {
                    id: 2,
                    name: "Commute".into(),
                },
            },
            variable_values: vars
                .iter()
                .map(|(name, value)| VariableValue {
                    variable: Variable {
                        id: None,
                        name: name.to_string(),
                    },
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn answer_key_display() {
        let a = answer("1", &[]);
        assert_eq!(a.key().to_string(), "q2/a11");
    }

    #[test]
    fn bindings_stringify_values() {
        let a = answer("distance * factor", &[("distance", 100.0), ("factor", 2.5)]);
        let bindings = a.bindings().unwrap();
        assert_eq!(bindings.get("distance").map(String::as_str), Some("100"));
        assert_eq!(bindings.get("factor").map(String::as_str), Some("2.5"));
    }

    #[test]
    fn duplicate_variable_names_rejected() {
        let a = answer("x", &[("x", 1.0), ("x", 2.0)]);
        assert_eq!(
            a.bindings().unwrap_err(),
            FormulaError::DuplicateBinding("x".into())
        );
    }

    #[test]
    fn session_json_uses_wire_names() {
        let json = r#"{
            "id": 1,
            "dateTime": "2024-03-01T10:00:00Z",
            "iskid": true,
            "seminar_access_code": "ABC",
            "answers": [{
                "possibleAnswer": {
                    "id": 5,
                    "formula": "distance * 2",
                    "question": { "id": 1, "name": "Travel" }
                },
                "variableValues": [
                    { "variable": { "id": 10, "name": "distance" }, "value": 50 }
                ]
            }]
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.is_kid);
        assert_eq!(session.category(), RespondentCategory::Kid);
        assert_eq!(session.seminar_access_code.as_deref(), Some("ABC"));
        assert_eq!(session.answers[0].variable_values[0].value, 50.0);
        assert_eq!(session.answers[0].key().possible_answer_id, 5);
    }
}
