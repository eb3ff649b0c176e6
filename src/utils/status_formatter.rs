use serde::Serialize;
use std::fmt::Write;

use crate::bootstrap::{BootstrapResult, BootstrapSnapshot};
use crate::localization::Lang;

/// what the UI shows for one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusScreen {
    pub title: String,
    pub body: String,
    pub detail: Option<String>,
    pub retry_available: bool,
}

pub struct StatusFormatter;

impl StatusFormatter {
    pub fn escape_html(text: &str) -> String {
        html_escape::encode_text(text).to_string()
    }

    /// language of the verified user, then of the unverified one, then English
    pub fn lang_for(snapshot: &BootstrapSnapshot) -> Lang {
        let code = snapshot
            .result
            .verified_user()
            .and_then(|user| user.language_code())
            .or_else(|| {
                snapshot
                    .unverified_user
                    .as_ref()
                    .and_then(|user| user.language_code.as_deref())
            });
        Lang::from_code(code)
    }

    pub fn render(snapshot: &BootstrapSnapshot, lang: Lang) -> StatusScreen {
        let retry_available = snapshot.retry_available();
        let unverified = snapshot
            .unverified_user
            .as_ref()
            .map(|user| lang.unverified_notice(&user.display_name()));

        match &snapshot.result {
            BootstrapResult::AwaitingValidation => StatusScreen {
                title: lang.loading_title().to_string(),
                body: lang.loading_body().to_string(),
                detail: None,
                retry_available,
            },
            BootstrapResult::NotInHost => StatusScreen {
                title: lang.not_in_host_title().to_string(),
                body: lang.not_in_host_body().to_string(),
                detail: None,
                retry_available,
            },
            BootstrapResult::Validated(user) => StatusScreen {
                title: lang.validated_title().to_string(),
                body: lang.welcome(&user.display_name()),
                detail: None,
                retry_available,
            },
            BootstrapResult::ValidationFailed(reason) => StatusScreen {
                title: lang.auth_failed_title().to_string(),
                body: lang.auth_failed_body().to_string(),
                detail: Some(join_detail(reason, unverified)),
                retry_available,
            },
            BootstrapResult::Error(reason) => StatusScreen {
                title: lang.error_title().to_string(),
                body: lang.error_body().to_string(),
                detail: Some(join_detail(reason, unverified)),
                retry_available,
            },
        }
    }

    /// html fragment; all dynamic text is escaped
    pub fn to_html(screen: &StatusScreen, lang: Lang) -> String {
        let mut html = String::from("<section class=\"bootstrap-status\">\n");
        let _ = writeln!(html, "  <h1>{}</h1>", Self::escape_html(&screen.title));
        let _ = writeln!(html, "  <p>{}</p>", Self::escape_html(&screen.body));
        if let Some(detail) = &screen.detail {
            let _ = writeln!(
                html,
                "  <pre class=\"detail\">{}</pre>",
                Self::escape_html(detail)
            );
        }
        if screen.retry_available {
            let _ = writeln!(
                html,
                "  <button class=\"retry\">{}</button>",
                Self::escape_html(lang.retry_button())
            );
        }
        html.push_str("</section>");
        html
    }
}

fn join_detail(reason: &str, unverified: Option<String>) -> String {
    match unverified {
        Some(notice) => format!("{}\n{}", reason, notice),
        None => reason.to_string(),
    }
}
