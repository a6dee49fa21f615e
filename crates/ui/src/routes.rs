use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::views::{HomeView, ParticipantPage};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/session/:session_id", SessionRoute)] Session { session_id: String },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            header { class: "topbar",
                Link { to: Route::Home {}, h1 { "Quiz" } }
            }
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

// Keyed so that navigating to another session opens a fresh participant task.
#[component]
fn SessionRoute(session_id: String) -> Element {
    rsx! {
        ParticipantPage { key: "{session_id}", session_id: session_id.clone() }
    }
}
