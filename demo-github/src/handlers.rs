use askama::Template;
use axum::{Json, http::StatusCode, response::Html};
use oauth2_github_axum::{GitHubSession, IntoResponseError};

#[derive(Template)]
#[template(path = "index_user.j2", escape = "html")]
struct IndexTemplateUser<'a> {
    login: &'a str,
    name: &'a str,
}

#[derive(Template)]
#[template(path = "index_anon.j2", escape = "html")]
struct IndexTemplateAnon<'a> {
    message: &'a str,
    signin_path: &'a str,
}

pub(crate) async fn index(github: GitHubSession) -> Result<Html<String>, (StatusCode, String)> {
    let html = match github.profile().await.into_response_error()? {
        Some(profile) => {
            let login = profile["login"].as_str().unwrap_or_default();
            let name = profile["name"].as_str().unwrap_or(login);
            IndexTemplateUser { login, name }.render()
        }
        None => IndexTemplateAnon {
            message: "Click the Login button below.",
            signin_path: "/github/auth",
        }
        .render(),
    };
    html.map(Html)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Raw profile JSON for signed-in visitors.
pub(crate) async fn profile(
    github: GitHubSession,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    match github.profile().await.into_response_error()? {
        Some(profile) => Ok(Json(profile)),
        None => {
            tracing::debug!("Profile requested without sign-in");
            Err((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))
        }
    }
}
