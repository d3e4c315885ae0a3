use curedoc_types::AnswerRequest;

use crate::error::FollowupError;

/// Turn shown before the follow-up questions are asked
pub const FOLLOWUP_INTRO: &str =
    "To better understand your condition, please answer these follow-up questions:";

/// Questions the service asked about a query, waiting for answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFollowups {
    pub query: String,
    pub questions: Vec<String>,
}

impl PendingFollowups {
    /// Check the answers and build the `/answer` request.
    ///
    /// Answers are trimmed; every one must be non-empty. On rejection the
    /// error lists exactly the blank positions.
    pub fn validate(&self, answers: &[String]) -> Result<AnswerRequest, FollowupError> {
        if answers.len() != self.questions.len() {
            return Err(FollowupError::CountMismatch {
                expected: self.questions.len(),
                got: answers.len(),
            });
        }

        let blank: Vec<usize> = answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.trim().is_empty())
            .map(|(i, _)| i)
            .collect();
        if !blank.is_empty() {
            return Err(FollowupError::Blank(blank));
        }

        Ok(AnswerRequest {
            query: self.query.clone(),
            followups: self.questions.clone(),
            responses: answers.iter().map(|a| a.trim().to_string()).collect(),
        })
    }
}

/// Where the in-progress exchange stands with respect to follow-ups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FollowupState {
    #[default]
    Idle,
    AwaitingAnswers(PendingFollowups),
}

impl FollowupState {
    pub fn pending(&self) -> Option<&PendingFollowups> {
        match self {
            FollowupState::AwaitingAnswers(pending) => Some(pending),
            FollowupState::Idle => None,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, FollowupState::AwaitingAnswers(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingFollowups {
        PendingFollowups {
            query: "I have a cough".to_string(),
            questions: vec![
                "How long?".to_string(),
                "Any fever?".to_string(),
                "Smoker?".to_string(),
            ],
        }
    }

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_blank_answers_are_reported_by_index() {
        let err = pending().validate(&answers(&["two weeks", "  ", ""])).unwrap_err();
        assert_eq!(err, FollowupError::Blank(vec![1, 2]));
    }

    #[test]
    fn test_complete_answers_are_paired_in_order() {
        let request = pending().validate(&answers(&[" two weeks ", "no", "yes"])).unwrap();
        assert_eq!(request.query, "I have a cough");
        assert_eq!(request.followups, pending().questions);
        assert_eq!(request.responses, answers(&["two weeks", "no", "yes"]));
    }

    #[test]
    fn test_answer_count_must_match() {
        let err = pending().validate(&answers(&["one"])).unwrap_err();
        assert_eq!(err, FollowupError::CountMismatch { expected: 3, got: 1 });
    }
}
