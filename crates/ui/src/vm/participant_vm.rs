use quiz_core::model::{Question, QuestionId};
use services::{ParticipantPhase, ParticipantView, SubmitMode, TimerView};

/// Seconds left at which the timer switches to its warning style.
pub const LOW_TIME_SECS: u32 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Join,
    Waiting,
    Answering,
    AnswerSheet,
    Submitting,
    Results,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub index: usize,
    pub label: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionVm {
    pub id: QuestionId,
    pub number: usize,
    pub prompt: String,
    pub options: Vec<OptionVm>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimerVm {
    pub label: String,
    pub percent: f64,
    pub low: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRowVm {
    pub prompt: String,
    pub answer: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub name: String,
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub rows: Vec<ResultRowVm>,
}

/// Everything the participant page renders, derived from one view snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticipantScreenVm {
    pub screen: Screen,
    pub session_label: String,
    pub progress_label: Option<String>,
    pub question: Option<QuestionVm>,
    pub sheet: Vec<QuestionVm>,
    pub results: Option<ResultsVm>,
    pub timer: Option<TimerVm>,
    pub notice: Option<String>,
    pub can_answer: bool,
    /// Sheet choices are still editable; false once time is up.
    pub can_select: bool,
    pub joining: bool,
}

#[must_use]
pub fn map_participant_screen(view: &ParticipantView) -> ParticipantScreenVm {
    let screen = screen_for(view);
    let progress = view.progress;

    let progress_label = (screen == Screen::Answering && progress.total > 0).then(|| {
        format!(
            "Question {} of {}",
            (progress.current_index + 1).min(progress.total),
            progress.total
        )
    });

    let question = view.question.as_ref().map(|q| QuestionVm {
        id: q.id.clone(),
        number: q.index + 1,
        prompt: q.prompt.clone(),
        options: options(&q.options, None),
    });

    let sheet = if view.mode == SubmitMode::Bulk {
        view.questions
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionVm {
                id: q.id.clone(),
                number: i + 1,
                prompt: q.prompt.clone(),
                options: options(&q.options, view.selected.get(&q.id).copied()),
            })
            .collect()
    } else {
        Vec::new()
    };

    ParticipantScreenVm {
        screen,
        session_label: format!("Session {}", view.session_id),
        progress_label,
        question,
        sheet,
        results: (screen == Screen::Results).then(|| results(view)),
        timer: view.timer.as_ref().map(timer),
        notice: view.notice.as_ref().map(|n| n.message.clone()),
        can_answer: view.can_answer,
        can_select: view.can_select,
        joining: view.joining,
    }
}

fn screen_for(view: &ParticipantView) -> Screen {
    match view.phase {
        ParticipantPhase::Joining => Screen::Join,
        ParticipantPhase::WaitingForStart => Screen::Waiting,
        ParticipantPhase::Advancing => Screen::Submitting,
        ParticipantPhase::Finished => Screen::Results,
        ParticipantPhase::Answering(_) => match view.mode {
            SubmitMode::PerQuestion => Screen::Answering,
            SubmitMode::Bulk => Screen::AnswerSheet,
        },
    }
}

fn options(labels: &[String], selected: Option<usize>) -> Vec<OptionVm> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| OptionVm {
            index,
            label: label.clone(),
            selected: selected == Some(index),
        })
        .collect()
}

fn timer(view: &TimerView) -> TimerVm {
    TimerVm {
        label: format_timer(view.remaining_secs),
        percent: view.percent,
        low: view.remaining_secs <= LOW_TIME_SECS,
    }
}

fn results(view: &ParticipantView) -> ResultsVm {
    let rows = view
        .answers
        .iter()
        .filter_map(|answer| {
            let question = view.questions.iter().find(|q| q.id == answer.question_id)?;
            Some(ResultRowVm {
                prompt: question.prompt.clone(),
                answer: option_label(question, answer.selected_option_index),
                is_correct: answer.is_correct,
            })
        })
        .collect();

    ResultsVm {
        name: view.participant_name.clone().unwrap_or_default(),
        score: view.score,
        correct: view.answers.iter().filter(|a| a.is_correct).count(),
        total: view.progress.total,
        rows,
    }
}

fn option_label(question: &Question, index: usize) -> String {
    question
        .options
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("Option {}", index + 1))
}

#[must_use]
pub fn format_timer(seconds: u32) -> String {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    format!("Time left: {minutes}:{remainder:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerRecord, SessionId};
    use services::{Notice, QuestionView, QuizProgress};

    fn questions() -> Vec<Question> {
        vec![
            Question::new("q1", "One?", vec!["a".into(), "b".into()]),
            Question::new("q2", "Two?", vec!["c".into(), "d".into()]),
        ]
    }

    fn answering(mode: SubmitMode) -> ParticipantView {
        let mut view = ParticipantView::pending(SessionId::new("s1"), mode);
        view.phase = ParticipantPhase::Answering(1);
        view.participant_name = Some("Ada".into());
        view.questions = questions();
        view.question = Some(QuestionView {
            index: 1,
            id: QuestionId::new("q2"),
            prompt: "Two?".into(),
            options: vec!["c".into(), "d".into()],
        });
        view.progress = QuizProgress {
            total: 2,
            answered: 1,
            current_index: 1,
            remaining: 1,
            is_finished: false,
        };
        view.can_answer = true;
        view
    }

    #[test]
    fn format_timer_pads_seconds() {
        assert_eq!(format_timer(0), "Time left: 0:00");
        assert_eq!(format_timer(65), "Time left: 1:05");
        assert_eq!(format_timer(300), "Time left: 5:00");
    }

    #[test]
    fn pending_view_shows_join_screen() {
        let vm = map_participant_screen(&ParticipantView::pending(
            SessionId::new("s1"),
            SubmitMode::PerQuestion,
        ));
        assert_eq!(vm.screen, Screen::Join);
        assert_eq!(vm.session_label, "Session s1");
        assert!(vm.progress_label.is_none());
        assert!(vm.results.is_none());
    }

    #[test]
    fn answering_screen_labels_progress() {
        let vm = map_participant_screen(&answering(SubmitMode::PerQuestion));
        assert_eq!(vm.screen, Screen::Answering);
        assert_eq!(vm.progress_label.as_deref(), Some("Question 2 of 2"));
        let question = vm.question.unwrap();
        assert_eq!(question.number, 2);
        assert_eq!(question.options.len(), 2);
        assert!(vm.sheet.is_empty());
    }

    #[test]
    fn bulk_mode_marks_selected_options() {
        let mut view = answering(SubmitMode::Bulk);
        view.selected.insert(QuestionId::new("q1"), 1);

        let vm = map_participant_screen(&view);
        assert_eq!(vm.screen, Screen::AnswerSheet);
        assert_eq!(vm.sheet.len(), 2);
        assert!(vm.sheet[0].options[1].selected);
        assert!(!vm.sheet[1].options.iter().any(|o| o.selected));
    }

    #[test]
    fn answer_sheet_locks_when_selection_closes() {
        let mut view = answering(SubmitMode::Bulk);
        view.can_select = true;
        assert!(map_participant_screen(&view).can_select);

        view.can_select = false;
        let vm = map_participant_screen(&view);
        assert_eq!(vm.screen, Screen::AnswerSheet);
        assert!(!vm.can_select);
    }

    #[test]
    fn timer_turns_low_near_the_end() {
        let mut view = answering(SubmitMode::PerQuestion);
        view.timer = Some(TimerView {
            remaining_secs: 45,
            total_secs: 300,
            percent: 15.0,
            running: true,
        });
        let timer = map_participant_screen(&view).timer.unwrap();
        assert_eq!(timer.label, "Time left: 0:45");
        assert!(timer.low);
    }

    #[test]
    fn results_list_answers_with_labels() {
        let mut view = answering(SubmitMode::PerQuestion);
        view.phase = ParticipantPhase::Finished;
        view.score = 10;
        view.answers = vec![
            AnswerRecord {
                question_id: QuestionId::new("q1"),
                selected_option_index: 1,
                is_correct: true,
            },
            AnswerRecord {
                question_id: QuestionId::new("q2"),
                selected_option_index: 0,
                is_correct: false,
            },
        ];
        view.notice = Some(Notice::submit_failed());

        let vm = map_participant_screen(&view);
        let results = vm.results.unwrap();
        assert_eq!(results.name, "Ada");
        assert_eq!(results.correct, 1);
        assert_eq!(results.total, 2);
        assert_eq!(results.rows[0].answer, "b");
        assert!(!results.rows[1].is_correct);
        assert_eq!(vm.notice.as_deref(), Some("Failed to submit answer"));
    }
}
