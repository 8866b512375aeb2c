use std::fmt;

use serde_json::Value;

const THOUGHT: &str = "Thought:";
const ACTION: &str = "Action:";
const ACTION_INPUT: &str = "Action Input:";
const ANSWER: &str = "Answer:";
const OBSERVATION: &str = "Observation:";

/// One step of a ReAct exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum ReasoningStep {
    Action {
        thought: String,
        action: String,
        input: Value,
    },
    Observation {
        observation: String,
    },
    Answer {
        thought: String,
        answer: String,
    },
}

impl fmt::Display for ReasoningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action {
                thought,
                action,
                input,
            } => write!(
                f,
                "{THOUGHT} {thought}\n{ACTION} {action}\n{ACTION_INPUT} {input}"
            ),
            Self::Observation { observation } => write!(f, "{OBSERVATION} {observation}"),
            Self::Answer { thought, answer } => write!(f, "{THOUGHT} {thought}\n{ANSWER} {answer}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("the response was empty")]
    Empty,

    #[error("the response has neither an `Action:` nor an `Answer:` line")]
    NoActionOrAnswer,

    #[error("`Action:` names no tool")]
    EmptyAction,

    #[error("`Action:` is not followed by an `Action Input:` line")]
    MissingActionInput,
}

/// Byte offset of `marker` where it starts a line, ignoring leading whitespace.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    text.match_indices(marker).map(|(idx, _)| idx).find(|&idx| {
        text[..idx]
            .rsplit('\n')
            .next()
            .is_none_or(|line| line.trim().is_empty())
    })
}

/// Text following `marker` at `start`, up to the next line that begins with any of `stops`.
fn section<'a>(text: &'a str, start: usize, marker: &str, stops: &[&str]) -> &'a str {
    let rest = &text[start + marker.len()..];
    let end = stops
        .iter()
        .filter_map(|stop| find_marker(rest, stop))
        .min()
        .unwrap_or(rest.len());
    rest[..end].trim()
}

fn strip_code_fence(raw: &str) -> &str {
    let Some(body) = raw.strip_prefix("```") else {
        return raw;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse an action input as JSON, falling back to `{"input": raw}`.
fn parse_action_input(raw: &str) -> Value {
    let raw = strip_code_fence(raw.trim());
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }
    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}'))
        && open < close
        && let Ok(value) = serde_json::from_str::<Value>(&raw[open..=close])
    {
        return value;
    }
    serde_json::json!({ "input": raw })
}

/// Parse one model reply into an action or a final answer.
///
/// Whichever of `Action:` and `Answer:` comes first wins. A reply with neither marker
/// and no `Thought:` is taken as an implicit answer.
///
/// # Errors
///
/// Returns a [`ParseError`] when the reply follows the format only partially.
pub fn parse_reasoning(text: &str) -> Result<ReasoningStep, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let thought_at = find_marker(text, THOUGHT);
    let action_at = find_marker(text, ACTION);
    let answer_at = find_marker(text, ANSWER);

    let thought = thought_at
        .map(|at| section(text, at, THOUGHT, &[ACTION, ANSWER, OBSERVATION]).to_owned())
        .unwrap_or_default();

    match (action_at, answer_at) {
        (Some(action), answer) if answer.is_none_or(|a| action < a) => {
            let name = section(text, action, ACTION, &[ACTION_INPUT, OBSERVATION, ANSWER]);
            let name = name.lines().next().unwrap_or_default().trim().trim_matches('`');
            if name.is_empty() {
                return Err(ParseError::EmptyAction);
            }
            let input_at = find_marker(&text[action..], ACTION_INPUT)
                .map(|at| action + at)
                .ok_or(ParseError::MissingActionInput)?;
            let raw_input = section(text, input_at, ACTION_INPUT, &[OBSERVATION, ANSWER]);
            Ok(ReasoningStep::Action {
                thought,
                action: name.to_owned(),
                input: parse_action_input(raw_input),
            })
        }
        (_, Some(answer)) => Ok(ReasoningStep::Answer {
            thought,
            answer: text[answer + ANSWER.len()..].trim().to_owned(),
        }),
        _ if thought_at.is_none() => Ok(ReasoningStep::Answer {
            thought: "(implicit) I can answer without using any tools.".into(),
            answer: text.to_owned(),
        }),
        _ => Err(ParseError::NoActionOrAnswer),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_action_with_json_input() {
        let reply = "Thought: I need Apple's numbers.\n\
                     Action: apple_8k\n\
                     Action Input: {\"input\": \"Apple revenue growth 2024\"}";
        let step = parse_reasoning(reply).unwrap();
        assert_eq!(
            step,
            ReasoningStep::Action {
                thought: "I need Apple's numbers.".into(),
                action: "apple_8k".into(),
                input: json!({"input": "Apple revenue growth 2024"}),
            }
        );
    }

    #[test]
    fn hallucinated_observation_is_dropped() {
        let reply = "Thought: add first\nAction: add\nAction Input: {\"a\": 2, \"b\": 3}\n\
                     Observation: 5\nThought: done\nAnswer: 5";
        let step = parse_reasoning(reply).unwrap();
        assert!(matches!(
            step,
            ReasoningStep::Action { ref action, ref input, .. }
                if action == "add" && *input == json!({"a": 2, "b": 3})
        ));
    }

    #[test]
    fn parses_final_answer() {
        let reply = "Thought: I can answer without using any more tools.\n\
                     Answer: Microsoft grew faster than Apple.";
        let step = parse_reasoning(reply).unwrap();
        assert_eq!(
            step,
            ReasoningStep::Answer {
                thought: "I can answer without using any more tools.".into(),
                answer: "Microsoft grew faster than Apple.".into(),
            }
        );
    }

    #[test]
    fn multiline_answer_is_kept_whole() {
        let step = parse_reasoning("Thought: ok\nAnswer: line one\nline two").unwrap();
        assert!(matches!(step, ReasoningStep::Answer { ref answer, .. } if answer == "line one\nline two"));
    }

    #[test]
    fn plain_text_is_an_implicit_answer() {
        let step = parse_reasoning("Why did the chicken cross the road?").unwrap();
        assert!(matches!(
            step,
            ReasoningStep::Answer { ref answer, .. } if answer == "Why did the chicken cross the road?"
        ));
    }

    #[test]
    fn fenced_json_input_is_accepted() {
        let reply = "Thought: t\nAction: multiply\nAction Input: ```json\n{\"a\": 70, \"b\": 5}\n```";
        let ReasoningStep::Action { input, .. } = parse_reasoning(reply).unwrap() else {
            panic!("expected action");
        };
        assert_eq!(input, json!({"a": 70, "b": 5}));
    }

    #[test]
    fn json_embedded_in_prose_is_extracted() {
        let reply = "Thought: t\nAction: add\nAction Input: use {\"a\": 1, \"b\": 2} please";
        let ReasoningStep::Action { input, .. } = parse_reasoning(reply).unwrap() else {
            panic!("expected action");
        };
        assert_eq!(input, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn invalid_json_falls_back_to_input_field() {
        let reply = "Thought: t\nAction: uber_8k\nAction Input: Uber revenue 2024";
        let ReasoningStep::Action { input, .. } = parse_reasoning(reply).unwrap() else {
            panic!("expected action");
        };
        assert_eq!(input, json!({"input": "Uber revenue 2024"}));
    }

    #[test]
    fn marker_inside_a_line_is_ignored() {
        let reply = "Thought: the filing says Answer: maybe\nAction: apple_8k\nAction Input: {}";
        assert!(matches!(
            parse_reasoning(reply).unwrap(),
            ReasoningStep::Action { .. }
        ));
    }

    #[test]
    fn partial_formats_are_errors() {
        assert_eq!(parse_reasoning("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_reasoning("Thought: still thinking"),
            Err(ParseError::NoActionOrAnswer)
        );
        assert_eq!(
            parse_reasoning("Thought: t\nAction: add"),
            Err(ParseError::MissingActionInput)
        );
        assert_eq!(
            parse_reasoning("Thought: t\nAction:\nAction Input: {}"),
            Err(ParseError::EmptyAction)
        );
    }

    #[test]
    fn display_round_trips_through_parser() {
        let step = ReasoningStep::Action {
            thought: "compute".into(),
            action: "subtract".into(),
            input: json!({"a": 100, "b": 30}),
        };
        assert_eq!(parse_reasoning(&step.to_string()).unwrap(), step);
    }

    mod proptest_parser {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics(text in "\\PC{0,200}") {
                let _ = parse_reasoning(&text);
            }

            #[test]
            fn answer_text_survives(answer in "[a-zA-Z0-9 ,.%]{1,80}") {
                let reply = format!("Thought: done\nAnswer: {answer}");
                let step = parse_reasoning(&reply).unwrap();
                prop_assert_eq!(step, ReasoningStep::Answer {
                    thought: "done".into(),
                    answer: answer.trim().to_owned(),
                });
            }
        }
    }
}
