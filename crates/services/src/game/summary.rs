use vocab_core::model::Answer;

/// Local results of a finished play-through.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    /// Rounded to the nearest whole percent; 0 when there are no questions.
    pub accuracy_percent: u32,
    pub average_response_time_ms: Option<f64>,
    pub fastest_response_ms: Option<u64>,
    pub slowest_response_ms: Option<u64>,
}

impl SessionSummary {
    /// Aggregate `answers` against `total_questions`.
    ///
    /// Answers without a response time still count toward accuracy.
    #[must_use]
    pub fn from_answers<'a>(
        total_questions: usize,
        answers: impl IntoIterator<Item = &'a Answer>,
    ) -> Self {
        let mut correct = 0usize;
        let mut answered = 0usize;
        let mut times = Vec::new();
        for answer in answers {
            answered += 1;
            if answer.is_correct {
                correct += 1;
            }
            if let Some(ms) = answer.response_time_ms {
                times.push(ms);
            }
        }

        let accuracy_percent = if total_questions == 0 {
            0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = correct as f64 / total_questions as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let percent = (ratio * 100.0).round() as u32;
            percent
        };

        #[allow(clippy::cast_precision_loss)]
        let average_response_time_ms = if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<u64>() as f64 / times.len() as f64)
        };

        Self {
            total: total_questions,
            correct,
            incorrect: answered.saturating_sub(correct),
            accuracy_percent,
            average_response_time_ms,
            fastest_response_ms: times.iter().min().copied(),
            slowest_response_ms: times.iter().max().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::play::tests::answer;

    #[test]
    fn accuracy_rounds_to_nearest_percent() {
        let answers = [
            answer(1, 1, true, 1000),
            answer(1, 2, false, 2000),
            answer(1, 3, true, 3000),
        ];
        let summary = SessionSummary::from_answers(3, &answers);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.incorrect, 1);
        assert_eq!(summary.accuracy_percent, 67);
        assert_eq!(summary.average_response_time_ms, Some(2000.0));
        assert_eq!(summary.fastest_response_ms, Some(1000));
        assert_eq!(summary.slowest_response_ms, Some(3000));
    }

    #[test]
    fn zero_questions_is_zero_percent() {
        let summary = SessionSummary::from_answers(0, std::iter::empty());
        assert_eq!(summary.accuracy_percent, 0);
        assert_eq!(summary.average_response_time_ms, None);
    }

    #[test]
    fn missing_response_times_are_skipped() {
        let mut untimed = answer(1, 1, true, 0);
        untimed.response_time_ms = None;
        let answers = [untimed, answer(1, 2, true, 500)];
        let summary = SessionSummary::from_answers(2, &answers);
        assert_eq!(summary.accuracy_percent, 100);
        assert_eq!(summary.average_response_time_ms, Some(500.0));
    }
}
