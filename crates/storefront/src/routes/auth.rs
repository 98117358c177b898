//! Email authentication route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::filters;
use crate::forms::auth::{LoginForm, LoginInput, RegisterForm, RegisterInput};
use crate::forms::{FieldErrors, Submission};
use crate::middleware::{CurrentSession, Preferences};
use crate::models::AuthUser;
use crate::routes::layout::LayoutContext;
use crate::state::AppState;

/// Form-level error shown for rejected credentials.
pub const INVALID_CREDENTIALS: &str = "Failed to login. Invalid email or password";

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: LayoutContext,
    pub email: String,
    pub errors: FieldErrors,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: LayoutContext,
    pub name: String,
    pub email: String,
    pub errors: FieldErrors,
}

/// Display login page.
#[instrument(skip(session, preferences))]
pub async fn login_page(mut session: CurrentSession, preferences: Preferences) -> Response {
    if session.user().is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        layout: LayoutContext::new(&mut session, preferences, "/login"),
        email: String::new(),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, preferences, submission))]
pub async fn login(
    State(state): State<AppState>,
    mut session: CurrentSession,
    preferences: Preferences,
    submission: Submission<LoginInput>,
) -> Response {
    let LoginForm { email, .. } = submission.form;

    let input = match submission.result {
        Ok(input) => input,
        Err(errors) => {
            return render_login(&mut session, preferences, email, errors, StatusCode::BAD_REQUEST);
        }
    };

    match state
        .auth()
        .sign_in_email(input.email.as_str(), &input.password)
        .await
    {
        Ok(response) => {
            let user = AuthUser::from(response);
            tracing::info!(user_id = %user.user_id, "User logged in");
            let toast = format!("Welcome back, {}!", user.user.name);
            session.sign_in(user, toast);
            Redirect::to("/").into_response()
        }
        Err(e) if e.is_client_error() => {
            tracing::info!("Login rejected: {e}");
            render_login(
                &mut session,
                preferences,
                email,
                FieldErrors::form(INVALID_CREDENTIALS),
                StatusCode::UNAUTHORIZED,
            )
        }
        Err(e) => {
            tracing::error!("Login failed: {e}");
            render_login(
                &mut session,
                preferences,
                email,
                FieldErrors::form("We couldn't sign you in right now. Please try again."),
                StatusCode::BAD_GATEWAY,
            )
        }
    }
}

fn render_login(
    session: &mut CurrentSession,
    preferences: Preferences,
    email: String,
    errors: FieldErrors,
    status: StatusCode,
) -> Response {
    let template = LoginTemplate {
        layout: LayoutContext::new(session, preferences, "/login"),
        email,
        errors,
    };
    (status, template).into_response()
}

/// Display registration page.
#[instrument(skip(session, preferences))]
pub async fn register_page(mut session: CurrentSession, preferences: Preferences) -> Response {
    if session.user().is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        layout: LayoutContext::new(&mut session, preferences, "/register"),
        name: String::new(),
        email: String::new(),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Handle registration form submission.
#[instrument(skip(state, session, preferences, submission))]
pub async fn register(
    State(state): State<AppState>,
    mut session: CurrentSession,
    preferences: Preferences,
    submission: Submission<RegisterInput>,
) -> Response {
    let RegisterForm { name, email, .. } = submission.form;

    let errors = match submission.result {
        Ok(input) => match state
            .auth()
            .sign_up_email(&input.name, input.email.as_str(), &input.password)
            .await
        {
            Ok(response) => {
                let user = AuthUser::from(response);
                tracing::info!(user_id = %user.user_id, "User registered");
                let toast = format!("Welcome to Clacie, {}!", user.user.name);
                session.sign_in(user, toast);
                return Redirect::to("/").into_response();
            }
            Err(e) if e.is_client_error() => {
                tracing::info!("Registration rejected: {e}");
                FieldErrors::form(
                    e.user_message()
                        .unwrap_or("Failed to register. Please check your details."),
                )
            }
            Err(e) => {
                tracing::error!("Registration failed: {e}");
                FieldErrors::form("We couldn't create your account right now. Please try again.")
            }
        },
        Err(errors) => errors,
    };

    let template = RegisterTemplate {
        layout: LayoutContext::new(&mut session, preferences, "/register"),
        name,
        email,
        errors,
    };
    (StatusCode::BAD_REQUEST, template).into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(mut session: CurrentSession) -> Redirect {
    session.destroy();
    session.flash("You have been logged out");
    Redirect::to("/")
}
