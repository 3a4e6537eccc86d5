use crate::prompt::Persona;
use axum::extract::State;
use axum::response::Html;
use std::sync::Arc;

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../templates/index.html");

struct PageText {
    title: &'static str,
    subtitle: &'static str,
    accent: &'static str,
    upload_label: &'static str,
    welcome: &'static str,
    disclaimer: &'static str,
    placeholder: &'static str,
    footer: &'static str,
}

fn page_text(persona: Persona) -> PageText {
    match persona {
        Persona::General => PageText {
            title: "PDF Chatbot",
            subtitle: "Ask questions about any PDF document",
            accent: "#1565c0",
            upload_label: "Upload PDF",
            welcome: "Upload a PDF in the sidebar and click Load Document. \
                      Answers come only from the document you upload.",
            disclaimer: "Answers are generated by an AI model and may contain mistakes. \
                         Check important details against the document.",
            placeholder: "Ask a question about your PDF...",
            footer: "PDF Chatbot",
        },
        Persona::Medical => PageText {
            title: "Medical Document Assistant",
            subtitle: "Understanding Your Medical Documents Made Simple",
            accent: "#2e7d32",
            upload_label: "Upload Medical Document",
            welcome: "Upload a blood report, prescription, or other medical document. \
                      I can explain lab results, prescriptions, medical terms, and \
                      normal vs abnormal values in simple language.",
            disclaimer: "Important Medical Disclaimer: this assistant provides educational \
                         information only and is not a substitute for professional medical \
                         advice. Always consult your doctor or healthcare provider.",
            placeholder: "Ask a question about your medical document...",
            footer: "Medical Document Assistant | For educational purposes only",
        },
    }
}

/// Render the chat page for a persona.
pub fn render_index(persona: Persona) -> Html<String> {
    let text = page_text(persona);
    let html = INDEX_HTML
        .replace("{{ title }}", text.title)
        .replace("{{ subtitle }}", text.subtitle)
        .replace("{{ accent }}", text.accent)
        .replace("{{ upload_label }}", text.upload_label)
        .replace("{{ welcome }}", text.welcome)
        .replace("{{ disclaimer }}", text.disclaimer)
        .replace("{{ placeholder }}", text.placeholder)
        .replace("{{ footer }}", text.footer)
        .replace("{{ user_label }}", persona.user_label())
        .replace("{{ assistant_label }}", persona.assistant_label());
    Html(html)
}

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    render_index(state.settings.persona)
}
