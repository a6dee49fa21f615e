use dioxus::prelude::*;
use dioxus_router::use_navigator;

use crate::context::AppContext;
use crate::routes::Route;

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut code = use_signal(String::new);
    let mut error = use_signal(|| None::<&'static str>);

    use_effect(move || {
        if let Some(session_id) = ctx.take_initial_session() {
            let _ = navigator.replace(Route::Session {
                session_id: session_id.to_string(),
            });
        }
    });

    rsx! {
        div { class: "page home",
            h2 { "Join a quiz" }
            form { class: "join",
                onsubmit: move |evt: FormEvent| {
                    evt.prevent_default();
                    let session_id = code().trim().to_owned();
                    if session_id.is_empty() {
                        error.set(Some("Please enter a session code"));
                        return;
                    }
                    error.set(None);
                    let _ = navigator.push(Route::Session { session_id });
                },
                label { r#for: "session-code", "Session code" }
                input {
                    id: "session-code",
                    value: "{code}",
                    oninput: move |evt: FormEvent| code.set(evt.value()),
                }
                button { r#type: "submit", "Open" }
            }
            if let Some(message) = error() {
                p { class: "notice", "{message}" }
            }
        }
    }
}
