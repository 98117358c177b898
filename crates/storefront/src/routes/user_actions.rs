//! Profile and address sub-form actions.
//!
//! Both forms appear on the checkout page and the dashboard. HTMX
//! submissions get the form fragment back (always `200` so HTMX swaps it);
//! plain posts are redirected to the page named in `redirectTo`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::api::{ApiError, UpdateProfileRequest};
use crate::error::add_breadcrumb;
use crate::forms::address::{AddressForm, AddressSubmission};
use crate::forms::profile::ProfileForm;
use crate::forms::{FieldErrors, Submission, local_redirect_target};
use crate::middleware::{AuthRejection, HxRequest, RequireAuth};
use crate::state::AppState;

/// Profile form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/profile_form.html")]
pub struct ProfileFormTemplate {
    pub profile_form: ProfileForm,
    pub profile_errors: FieldErrors,
    pub profile_saved: bool,
    pub redirect_to: String,
}

/// Address form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/address_form.html")]
pub struct AddressFormTemplate {
    pub address_form: AddressForm,
    pub address_errors: FieldErrors,
    pub redirect_to: String,
}

/// Resolve the page a plain submission returns to.
fn return_path(redirect_to: &str) -> String {
    local_redirect_target(redirect_to)
        .unwrap_or("/dashboard")
        .to_string()
}

/// Save name and phone.
#[instrument(skip(state, auth, submission))]
pub async fn update_profile(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    HxRequest(htmx): HxRequest,
    submission: Submission<UpdateProfileRequest>,
) -> Response {
    let back = return_path(&submission.form.redirect_to);

    let errors = match submission.result {
        Ok(request) => match state.auth().update_profile(auth.token(), &request).await {
            Ok(()) => {
                add_breadcrumb("account", "Updated profile", None);
                auth.session.set_display_name(&request.name);
                if !htmx {
                    auth.session.flash("Profile updated");
                    return Redirect::to(&back).into_response();
                }
                return ProfileFormTemplate {
                    profile_form: submission.form,
                    profile_errors: FieldErrors::new(),
                    profile_saved: true,
                    redirect_to: back,
                }
                .into_response();
            }
            Err(ApiError::Unauthorized) => {
                return AuthRejection::expired(htmx).into_response();
            }
            Err(e) => {
                tracing::error!("Failed to update profile: {e}");
                FieldErrors::form(
                    e.user_message()
                        .unwrap_or("Could not save your profile. Please try again."),
                )
            }
        },
        Err(errors) => errors,
    };

    if !htmx {
        auth.session
            .flash(errors.first_message().unwrap_or("Could not save your profile").to_string());
        return Redirect::to(&back).into_response();
    }

    ProfileFormTemplate {
        profile_form: submission.form,
        profile_errors: errors,
        profile_saved: false,
        redirect_to: back,
    }
    .into_response()
}

/// Create or update a shipping address.
///
/// On success HTMX requests get `HX-Refresh` so address pickers elsewhere on
/// the page pick up the change.
#[instrument(skip(state, auth, submission))]
pub async fn save_address(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    HxRequest(htmx): HxRequest,
    submission: Submission<AddressSubmission>,
) -> Response {
    let back = return_path(&submission.form.redirect_to);

    let errors = match submission.result {
        Ok(AddressSubmission { id, input }) => {
            let result = match &id {
                Some(id) => {
                    state
                        .commerce()
                        .update_address(auth.token(), id, &input)
                        .await
                }
                None => state.commerce().create_address(auth.token(), &input).await,
            };

            match result {
                Ok(()) => {
                    add_breadcrumb("account", "Saved address", None);
                    auth.session.flash("Address saved");
                    return if htmx {
                        AppendHeaders([("HX-Refresh", "true")]).into_response()
                    } else {
                        Redirect::to(&back).into_response()
                    };
                }
                Err(ApiError::Unauthorized) => {
                    return AuthRejection::expired(htmx).into_response();
                }
                Err(e) => {
                    tracing::error!("Failed to save address: {e}");
                    FieldErrors::form(
                        e.user_message()
                            .unwrap_or("Could not save this address. Please try again."),
                    )
                }
            }
        }
        Err(errors) => errors,
    };

    if !htmx {
        auth.session
            .flash(errors.first_message().unwrap_or("Could not save this address").to_string());
        return Redirect::to(&back).into_response();
    }

    AddressFormTemplate {
        address_form: submission.form,
        address_errors: errors,
        redirect_to: back,
    }
    .into_response()
}
