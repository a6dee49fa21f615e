use dioxus::prelude::*;
use quiz_core::model::QuestionId;

use crate::vm::{QuestionVm, ResultsVm, TimerVm};

fn option_class(selected: bool) -> &'static str {
    if selected { "option selected" } else { "option" }
}

fn result_class(correct: bool) -> &'static str {
    if correct { "correct" } else { "wrong" }
}

fn timer_class(low: bool) -> &'static str {
    if low { "timer low" } else { "timer" }
}

#[component]
pub fn NoticeBanner(message: String, on_dismiss: EventHandler<()>) -> Element {
    rsx! {
        div { class: "notice", role: "alert",
            span { "{message}" }
            button { class: "dismiss", onclick: move |_| on_dismiss.call(()), "Dismiss" }
        }
    }
}

#[component]
pub fn JoinForm(
    name: String,
    joining: bool,
    on_name: EventHandler<String>,
    on_join: EventHandler<()>,
) -> Element {
    rsx! {
        form { class: "join",
            onsubmit: move |evt: FormEvent| {
                evt.prevent_default();
                on_join.call(());
            },
            label { r#for: "participant-name", "Your name" }
            input {
                id: "participant-name",
                value: "{name}",
                placeholder: "Name",
                disabled: joining,
                oninput: move |evt: FormEvent| on_name.call(evt.value()),
            }
            button { r#type: "submit", disabled: joining,
                if joining { "Joining..." } else { "Join" }
            }
        }
    }
}

#[component]
pub fn TimerBar(timer: TimerVm) -> Element {
    let width = format!("{:.0}%", timer.percent.clamp(0.0, 100.0));
    rsx! {
        div { class: timer_class(timer.low),
            span { class: "timer-label", "{timer.label}" }
            div { class: "timer-track",
                div { class: "timer-fill", style: "width: {width}" }
            }
        }
    }
}

#[component]
pub fn QuestionCard(
    question: QuestionVm,
    progress_label: Option<String>,
    disabled: bool,
    on_answer: EventHandler<usize>,
) -> Element {
    rsx! {
        section { class: "question",
            if let Some(label) = progress_label {
                p { class: "progress", "{label}" }
            }
            h3 { "{question.prompt}" }
            ul { class: "options",
                for option in question.options {
                    li { key: "{option.index}",
                        button {
                            class: "option",
                            disabled,
                            onclick: move |_| on_answer.call(option.index),
                            "{option.label}"
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn AnswerSheet(
    questions: Vec<QuestionVm>,
    locked: bool,
    on_select: EventHandler<(QuestionId, usize)>,
    on_submit: EventHandler<()>,
) -> Element {
    rsx! {
        section { class: "answer-sheet",
            if locked {
                p { class: "time-up", "Time is up. Your answers are being submitted." }
            }
            for question in questions {
                fieldset { key: "{question.id}", class: "sheet-question",
                    legend { "{question.number}. {question.prompt}" }
                    for option in question.options.clone() {
                        label { key: "{option.index}", class: option_class(option.selected),
                            input {
                                r#type: "radio",
                                name: "{question.id}",
                                checked: option.selected,
                                disabled: locked,
                                onchange: {
                                    let id = question.id.clone();
                                    move |_| on_select.call((id.clone(), option.index))
                                },
                            }
                            "{option.label}"
                        }
                    }
                }
            }
            button { class: "submit-all", onclick: move |_| on_submit.call(()),
                "Submit answers"
            }
        }
    }
}

#[component]
pub fn ResultsCard(results: ResultsVm) -> Element {
    rsx! {
        section { class: "results",
            h3 { "Quiz complete" }
            if !results.name.is_empty() {
                p { "Well done, {results.name}!" }
            }
            p { class: "score", "Score: {results.score}" }
            if !results.rows.is_empty() {
                p { "{results.correct} of {results.total} correct" }
                ul { class: "result-rows",
                    for (i, row) in results.rows.iter().enumerate() {
                        li { key: "{i}", class: result_class(row.is_correct),
                            span { class: "prompt", "{row.prompt}" }
                            span { class: "answer", "{row.answer}" }
                        }
                    }
                }
            }
        }
    }
}
