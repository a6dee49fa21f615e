use dioxus::prelude::*;

use quiz_core::model::{QuestionId, SessionId};
use services::ClientError;

use super::components::{AnswerSheet, JoinForm, NoticeBanner, QuestionCard, ResultsCard, TimerBar};
use crate::context::AppContext;
use crate::vm::{Screen, map_participant_screen};

/// Participant page for one session.
///
/// Opens a participant task on mount and shuts it down on unmount. The page
/// only mirrors the task's published view and forwards user intents.
#[component]
pub fn ParticipantPage(session_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let handle = use_hook(|| ctx.quiz_client().open(SessionId::new(session_id.clone())));
    let client = use_signal(|| handle.clone());
    let mut view = use_signal(|| handle.view());
    let mut name = use_signal(String::new);
    let mut closed = use_signal(|| false);

    use_future({
        let handle = handle.clone();
        move || {
            let mut updates = handle.subscribe();
            async move {
                while updates.changed().await.is_ok() {
                    let next = updates.borrow_and_update().clone();
                    view.set(next);
                }
                closed.set(true);
            }
        }
    });

    use_drop({
        let handle = handle.clone();
        move || handle.shutdown()
    });

    let mut dispatch = move |result: Result<(), ClientError>| {
        if result.is_err() {
            closed.set(true);
        }
    };

    let vm = map_participant_screen(&view.read());

    rsx! {
        div { class: "page participant",
            h2 { "{vm.session_label}" }

            if let Some(message) = vm.notice.clone() {
                NoticeBanner {
                    message,
                    on_dismiss: move |()| dispatch(client.read().dismiss_notice()),
                }
            }
            if closed() {
                p { class: "notice", "This session is no longer active." }
            }
            if let Some(timer) = vm.timer.clone() {
                TimerBar { timer }
            }

            match vm.screen {
                Screen::Join => rsx! {
                    JoinForm {
                        name: name(),
                        joining: vm.joining,
                        on_name: move |value: String| name.set(value),
                        on_join: move |()| dispatch(client.read().join(name())),
                    }
                },
                Screen::Waiting => rsx! {
                    p { class: "waiting", "Waiting for the host to start the quiz..." }
                },
                Screen::Answering => match vm.question.clone() {
                    Some(question) => rsx! {
                        QuestionCard {
                            question,
                            progress_label: vm.progress_label.clone(),
                            disabled: !vm.can_answer,
                            on_answer: move |option: usize| dispatch(client.read().answer(option)),
                        }
                    },
                    None => rsx! {},
                },
                Screen::AnswerSheet => rsx! {
                    AnswerSheet {
                        questions: vm.sheet.clone(),
                        locked: !vm.can_select,
                        on_select: move |(question_id, option): (QuestionId, usize)| {
                            dispatch(client.read().select(question_id, option));
                        },
                        on_submit: move |()| dispatch(client.read().submit_all()),
                    }
                },
                Screen::Submitting => rsx! {
                    p { class: "submitting", "Submitting..." }
                },
                Screen::Results => match vm.results.clone() {
                    Some(results) => rsx! { ResultsCard { results } },
                    None => rsx! {},
                },
            }
        }
    }
}
