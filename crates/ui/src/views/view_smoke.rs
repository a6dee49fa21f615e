use std::sync::Arc;
use std::time::Duration;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use quiz_core::model::{Participant, ParticipantId, QuestionId, SessionId};
use services::{ClientConfig, InMemoryBackend, QuizClient};
use storage::{InMemoryStore, ProgressStore};

use crate::context::{UiApp, build_app_context};
use crate::views::{AnswerSheet, ParticipantPage, QuestionCard, ResultsCard, TimerBar};
use crate::vm::{OptionVm, QuestionVm, ResultRowVm, ResultsVm, TimerVm};

struct TestApp {
    client: Arc<QuizClient>,
}

impl UiApp for TestApp {
    fn quiz_client(&self) -> Arc<QuizClient> {
        Arc::clone(&self.client)
    }

    fn initial_session(&self) -> Option<SessionId> {
        None
    }
}

#[derive(Props, Clone)]
struct PageHarnessProps {
    app: Arc<TestApp>,
    session_id: String,
}

impl PartialEq for PageHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn PageHarness(props: PageHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! { ParticipantPage { session_id: props.session_id.clone() } }
}

#[component]
fn ComponentsHarness() -> Element {
    let question = QuestionVm {
        id: QuestionId::new("q1"),
        number: 1,
        prompt: "Which keyword declares a binding?".into(),
        options: vec![
            OptionVm {
                index: 0,
                label: "var".into(),
                selected: false,
            },
            OptionVm {
                index: 1,
                label: "let".into(),
                selected: false,
            },
        ],
    };
    let results = ResultsVm {
        name: "Ada".into(),
        score: 10,
        correct: 1,
        total: 1,
        rows: vec![ResultRowVm {
            prompt: "Which keyword declares a binding?".into(),
            answer: "let".into(),
            is_correct: true,
        }],
    };
    let timer = TimerVm {
        label: "Time left: 0:45".into(),
        percent: 15.0,
        low: true,
    };

    rsx! {
        TimerBar { timer }
        QuestionCard {
            question: question.clone(),
            progress_label: Some("Question 1 of 3".to_string()),
            disabled: false,
            on_answer: |_| {},
        }
        AnswerSheet {
            questions: vec![question],
            locked: true,
            on_select: |_| {},
            on_submit: |()| {},
        }
        ResultsCard { results }
    }
}

fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

async fn drive_async(dom: &mut VirtualDom) {
    let _ = tokio::time::timeout(Duration::from_millis(50), dom.wait_for_work()).await;
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

fn page_dom(backend: &InMemoryBackend, kv: &InMemoryStore, session_id: &str) -> VirtualDom {
    let client = QuizClient::new(
        ClientConfig::default(),
        Arc::new(backend.clone()),
        ProgressStore::new(Arc::new(kv.clone())),
        tokio::runtime::Handle::current(),
    );
    VirtualDom::new_with_props(
        PageHarness,
        PageHarnessProps {
            app: Arc::new(TestApp {
                client: Arc::new(client),
            }),
            session_id: session_id.to_string(),
        },
    )
}

#[test]
fn stateless_components_render() {
    let mut dom = VirtualDom::new(ComponentsHarness);
    dom.rebuild_in_place();
    drive_dom(&mut dom);
    let html = dioxus_ssr::render(&dom);

    assert!(html.contains("Time left: 0:45"), "missing timer in {html}");
    assert!(html.contains("timer low"), "missing low class in {html}");
    assert!(html.contains("Question 1 of 3"), "missing progress in {html}");
    assert!(html.contains("let"), "missing option in {html}");
    assert!(html.contains("Score: 10"), "missing score in {html}");
    assert!(html.contains("1 of 1 correct"), "missing tally in {html}");
    assert!(html.contains("Time is up"), "missing locked sheet in {html}");
    assert!(html.contains("Submit answers"), "missing submit in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn participant_page_starts_on_join_form() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let mut dom = page_dom(&backend, &kv, "demo");
    dom.rebuild_in_place();
    drive_dom(&mut dom);
    let html = dioxus_ssr::render(&dom);

    assert!(html.contains("Session demo"), "missing title in {html}");
    assert!(html.contains("Your name"), "missing join form in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn restored_participant_sees_the_current_question() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let store = ProgressStore::new(Arc::new(kv.clone()));
    store
        .save_participant(
            &SessionId::new("demo"),
            &Participant::new(ParticipantId::new("p1"), "Ada"),
        )
        .unwrap();

    let mut dom = page_dom(&backend, &kv, "demo");
    dom.rebuild_in_place();
    drive_dom(&mut dom);

    let mut html = dioxus_ssr::render(&dom);
    for _ in 0..40 {
        if html.contains("Question 1 of 3") {
            break;
        }
        drive_async(&mut dom).await;
        html = dioxus_ssr::render(&dom);
    }

    assert!(html.contains("Question 1 of 3"), "missing progress in {html}");
    assert!(
        html.contains("Which keyword declares an immutable binding in Rust?"),
        "missing prompt in {html}"
    );
    assert!(!html.contains("Your name"), "join form still shown in {html}");
}
