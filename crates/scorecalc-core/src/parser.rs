//! Session file loader.
//!
//! Loads sessions from JSON or TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::formula::{self, builtin};
use crate::model::Session;

/// On-disk formats a session can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFormat {
    Json,
    Toml,
}

impl SessionFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(SessionFormat::Json),
            Some("toml") => Some(SessionFormat::Toml),
            _ => None,
        }
    }
}

/// A file may hold one session or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SessionFile {
    Many { sessions: Vec<Session> },
    One(Session),
}

/// Parse a single session file. The extension picks the format.
pub fn parse_sessions(path: &Path) -> Result<Vec<Session>> {
    let format = SessionFormat::from_path(path)
        .with_context(|| format!("unsupported session file type: {}", path.display()))?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file: {}", path.display()))?;

    parse_sessions_str(&content, format)
        .with_context(|| format!("failed to parse session file: {}", path.display()))
}

/// Parse session content from a string (useful for testing).
pub fn parse_sessions_str(content: &str, format: SessionFormat) -> Result<Vec<Session>> {
    let file: SessionFile = match format {
        SessionFormat::Json => serde_json::from_str(content)?,
        SessionFormat::Toml => toml::from_str(content)?,
    };
    Ok(match file {
        SessionFile::Many { sessions } => sessions,
        SessionFile::One(session) => vec![session],
    })
}

/// Load sessions from a file, or recursively from every `.json`/`.toml`
/// file of a directory.
pub fn load_sessions(path: &Path) -> Result<Vec<Session>> {
    if path.is_dir() {
        load_session_directory(path)
    } else {
        parse_sessions(path)
    }
}

/// Recursively load all session files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_session_directory(dir: &Path) -> Result<Vec<Session>> {
    let mut sessions = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            sessions.extend(load_session_directory(&path)?);
        } else if SessionFormat::from_path(&path).is_some() {
            match parse_sessions(&path) {
                Ok(parsed) => sessions.extend(parsed),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sessions)
}

/// A warning from session validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub session_id: i64,
    /// Index of the answer within the session (if applicable).
    pub answer_index: Option<usize>,
    pub message: String,
}

/// Validate a session for problems that would make scoring fail.
pub fn validate_session(session: &Session) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let warn = |answer_index: Option<usize>, message: String| ValidationWarning {
        session_id: session.id,
        answer_index,
        message,
    };

    if session.answers.is_empty() {
        warnings.push(warn(None, "session has no answers".into()));
    }

    for (index, answer) in session.answers.iter().enumerate() {
        let formula = answer.formula();
        if formula.trim().is_empty() {
            warnings.push(warn(Some(index), "formula is empty".into()));
            continue;
        }

        let mut seen = HashSet::new();
        for vv in &answer.variable_values {
            if !seen.insert(vv.variable.name.as_str()) {
                warnings.push(warn(
                    Some(index),
                    format!("variable '{}' is given more than once", vv.variable.name),
                ));
            }
        }

        match formula::free_variables(formula) {
            Ok(names) => {
                for name in names.iter().filter(|n| !seen.contains(n.as_str())) {
                    warnings.push(warn(
                        Some(index),
                        format!("formula uses '{name}' but the answer has no value for it"),
                    ));
                }
            }
            Err(e) => {
                warnings.push(warn(Some(index), format!("formula '{formula}' is invalid: {e}")));
                continue;
            }
        }

        if let Ok(tokens) = formula::tokenize(formula) {
            for token in tokens {
                if let formula::Token::Function { name, .. } = token {
                    if builtin(&name).is_none() {
                        warnings.push(warn(Some(index), format!("unknown function '{name}'")));
                    }
                }
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_JSON: &str = r#"{
        "id": 7,
        "dateTime": "2024-03-01T10:00:00Z",
        "iskid": false,
        "answers": [
            {
                "possibleAnswer": {
                    "id": 1,
                    "name": "Car",
                    "formula": "distance * factor",
                    "question": { "id": 1, "name": "Commute" }
                },
                "variableValues": [
                    { "variable": { "name": "distance" }, "value": 100 },
                    { "variable": { "name": "factor" }, "value": 2.5 }
                ]
            },
            {
                "possibleAnswer": {
                    "id": 4,
                    "formula": "round(ceil(4.2) + floor(3.8))",
                    "question": { "id": 2, "name": "Diet" }
                }
            }
        ]
    }"#;

    const VALID_TOML: &str = r#"
[[sessions]]
id = 1
dateTime = "2024-03-01T10:00:00Z"

[[sessions.answers]]
[sessions.answers.possibleAnswer]
id = 3
formula = "10 + 5"
[sessions.answers.possibleAnswer.question]
id = 1
name = "Heating"

[[sessions]]
id = 2
dateTime = "2024-03-02T10:00:00Z"
iskid = true
"#;

    #[test]
    fn parse_single_json_session() {
        let sessions = parse_sessions_str(VALID_JSON, SessionFormat::Json).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, 7);
        assert_eq!(sessions[0].answers.len(), 2);
        assert!(sessions[0].answers[1].variable_values.is_empty());
    }

    #[test]
    fn parse_toml_session_list() {
        let sessions = parse_sessions_str(VALID_TOML, SessionFormat::Toml).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].answers[0].formula(), "10 + 5");
        assert!(sessions[1].is_kid);
        assert!(sessions[1].answers.is_empty());
    }

    #[test]
    fn parse_malformed_json() {
        assert!(parse_sessions_str("{ not json", SessionFormat::Json).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        std::fs::write(&path, "id: 1").unwrap();
        assert!(parse_sessions(&path).is_err());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), VALID_JSON).unwrap();
        std::fs::write(dir.path().join("b.json"), "{ broken").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sessions = load_sessions(dir.path()).unwrap();
        assert_eq!(sessions.len(), 3);
    }

    #[test]
    fn valid_session_has_no_warnings() {
        let sessions = parse_sessions_str(VALID_JSON, SessionFormat::Json).unwrap();
        assert!(validate_session(&sessions[0]).is_empty());
    }

    #[test]
    fn validation_finds_problems() {
        let json = r#"{
            "id": 3,
            "dateTime": "2024-03-01T10:00:00Z",
            "answers": [
                { "possibleAnswer": { "id": 1, "formula": "  ", "question": { "id": 1, "name": "A" } } },
                { "possibleAnswer": { "id": 2, "formula": "2 +", "question": { "id": 2, "name": "B" } } },
                { "possibleAnswer": { "id": 3, "formula": "speed * 2", "question": { "id": 3, "name": "C" } } },
                { "possibleAnswer": { "id": 4, "formula": "sin(1)", "question": { "id": 4, "name": "D" } } },
                {
                    "possibleAnswer": { "id": 5, "formula": "x", "question": { "id": 5, "name": "E" } },
                    "variableValues": [
                        { "variable": { "name": "x" }, "value": 1 },
                        { "variable": { "name": "x" }, "value": 2 }
                    ]
                }
            ]
        }"#;
        let session = &parse_sessions_str(json, SessionFormat::Json).unwrap()[0];
        let warnings = validate_session(session);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("empty")));
        assert!(messages.iter().any(|m| m.contains("invalid")));
        assert!(messages.iter().any(|m| m.contains("'speed'")));
        assert!(messages.iter().any(|m| m.contains("unknown function 'sin'")));
        assert!(messages.iter().any(|m| m.contains("more than once")));
        assert_eq!(warnings[0].answer_index, Some(0));
    }

    #[test]
    fn empty_session_warns() {
        let session = Session {
            id: 1,
            date_time: chrono::Utc::now(),
            answers: vec![],
            is_kid: false,
            seminar_access_code: None,
        };
        let warnings = validate_session(&session);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].answer_index.is_none());
    }
}
