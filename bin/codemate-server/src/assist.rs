//! The three code-assistance actions and the pure steps around the
//! completion call: language check, prompt text, answer clean-up.

/// Value the language selector submits when nothing was picked.
pub const LANGUAGE_PLACEHOLDER: &str = "Select programming language";

/// A code-assistance action offered by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fix,
    Suggest,
    Explain,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Fix, Action::Suggest, Action::Explain];

    /// Template that renders both the form and the answer for this action.
    pub fn template(self) -> &'static str {
        match self {
            Action::Fix => "home.html",
            Action::Suggest => "suggest.html",
            Action::Explain => "explain.html",
        }
    }

    /// Route the action's form posts to.
    pub fn path(self) -> &'static str {
        match self {
            Action::Fix => "/",
            Action::Suggest => "/suggest",
            Action::Explain => "/explain",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Fix => "fix",
            Action::Suggest => "suggest",
            Action::Explain => "explain",
        }
    }

    /// Text on the form's submit button.
    pub fn label(self) -> &'static str {
        match self {
            Action::Fix => "Fix",
            Action::Suggest => "Suggest",
            Action::Explain => "Explain",
        }
    }

    /// Prompt sent to the completion API.
    pub fn prompt(self, lang: &str, code: &str) -> String {
        match self {
            Action::Fix => format!("Respond only with code. Fix this {lang} code: {code}"),
            Action::Suggest => format!("Respond only with code. {code}"),
            Action::Explain => format!("Explain the following {lang} code: \n {code}"),
        }
    }
}

/// Returns the language to use, or `None` when the selector was left on the
/// placeholder (or not sent at all).
pub fn selected_language(lang: Option<&str>) -> Option<&str> {
    lang.filter(|l| *l != LANGUAGE_PLACEHOLDER)
}

/// Clean up raw completion text before it is stored and shown.
///
/// Only surrounding whitespace is removed. Newlines survive so the explain
/// view can turn them into line breaks when rendering.
pub fn finish_answer(raw: &str) -> String {
    raw.trim().to_owned()
}
