//! Checkout route handlers.
//!
//! The checkout page combines four independently edited pieces: the profile
//! and address sub-forms (posted to their own actions), and the method
//! selection plus notes submitted with "Pay Now".

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::api::{Address, ApiError, Cart, PaymentMethod, ShippingMethod};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::forms::FieldErrors;
use crate::forms::Submission;
use crate::forms::address::AddressForm;
use crate::forms::checkout::{CheckoutForm, CheckoutInput, CheckoutSelection};
use crate::forms::profile::ProfileForm;
use crate::middleware::{Preferences, RequireAuth};
use crate::routes::layout::LayoutContext;
use crate::services::checkout::{self, CheckoutData, CheckoutRedirect, OrderSummary, summarize};
use crate::state::AppState;

const CHECKOUT_PATH: &str = "/checkout";

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: LayoutContext,
    pub cart: Cart,
    pub addresses: Vec<Address>,
    pub addresses_unavailable: bool,
    pub shipping: Vec<ShippingMethod>,
    pub payment: Vec<PaymentMethod>,
    pub form: CheckoutForm,
    pub errors: FieldErrors,
    pub summary: OrderSummary,
    pub profile_form: ProfileForm,
    pub profile_errors: FieldErrors,
    pub profile_saved: bool,
    pub address_form: AddressForm,
    pub address_errors: FieldErrors,
    pub redirect_to: &'static str,
}

/// Order summary fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_summary.html")]
pub struct CheckoutSummaryTemplate {
    pub summary: OrderSummary,
}

impl CheckoutTemplate {
    fn new(
        layout: LayoutContext,
        data: CheckoutData,
        form: CheckoutForm,
        errors: FieldErrors,
    ) -> Self {
        let summary = summarize(&data.cart, &data.shipping, &data.payment, &form.selection());
        Self {
            layout,
            profile_form: ProfileForm::from(&data.profile),
            cart: data.cart,
            addresses: data.addresses,
            addresses_unavailable: data.addresses_unavailable,
            shipping: data.shipping,
            payment: data.payment,
            form,
            errors,
            summary,
            profile_errors: FieldErrors::new(),
            profile_saved: false,
            address_form: AddressForm::blank(),
            address_errors: FieldErrors::new(),
            redirect_to: CHECKOUT_PATH,
        }
    }
}

/// Send the browser away when checkout data is missing.
fn redirect_away(auth: &mut RequireAuth, redirect: CheckoutRedirect) -> Response {
    if redirect == CheckoutRedirect::Login {
        auth.session.destroy();
    }
    if let Some(toast) = redirect.toast() {
        auth.session.flash(toast);
    }
    Redirect::to(redirect.path()).into_response()
}

/// Display checkout page.
///
/// Method choices may be passed as query parameters; blanks default to the
/// first available method.
#[instrument(skip(state, auth, preferences))]
pub async fn show(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    preferences: Preferences,
    Query(selection): Query<CheckoutSelection>,
) -> Response {
    let data = match checkout::load(state.auth(), state.commerce(), auth.token()).await {
        Ok(data) => data,
        Err(redirect) => return redirect_away(&mut auth, redirect),
    };

    let selection = selection.or_defaults(&data.shipping, &data.payment);
    let form = CheckoutForm {
        address_id: data
            .preselected_address()
            .map(ToString::to_string)
            .unwrap_or_default(),
        shipping_method: selection.shipping_method,
        payment_method: selection.payment_method,
        notes: String::new(),
    };

    let layout = LayoutContext::new(&mut auth.session, preferences, CHECKOUT_PATH);
    CheckoutTemplate::new(layout, data, form, FieldErrors::new()).into_response()
}

/// Recalculate the order summary for a method selection (HTMX).
#[instrument(skip(state, auth))]
pub async fn summary(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(selection): Query<CheckoutSelection>,
) -> Result<CheckoutSummaryTemplate> {
    let token = auth.token();
    let (cart, shipping, payment) = tokio::join!(
        state.commerce().cart(token),
        state.commerce().shipping_methods(token),
        state.commerce().payment_methods(token),
    );
    let (cart, shipping, payment) = (cart?, shipping?, payment?);

    let selection = selection.or_defaults(&shipping, &payment);
    Ok(CheckoutSummaryTemplate {
        summary: summarize(&cart, &shipping, &payment, &selection),
    })
}

/// Place the order ("Pay Now").
///
/// Method slugs must be in the fetched catalogs; unlike the summary there is
/// no fallback shipping cost here, and a rejected order is re-rendered with
/// offered methods only.
#[instrument(skip(state, auth, preferences, submission))]
pub async fn place_order(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    preferences: Preferences,
    submission: Submission<CheckoutInput>,
) -> Response {
    let data = match checkout::load(state.auth(), state.commerce(), auth.token()).await {
        Ok(data) => data,
        Err(redirect) => return redirect_away(&mut auth, redirect),
    };

    let request = submission
        .result
        .and_then(|input| input.into_request(&data.shipping, &data.payment));

    let errors = match request {
        Ok(request) => match state.commerce().checkout(auth.token(), &request).await {
            Ok(order) => {
                add_breadcrumb(
                    "checkout",
                    "Order placed",
                    Some(&[("order_id", order.id.as_str())]),
                );
                tracing::info!(order_id = %order.id, "Order placed");
                auth.session.flash("Order placed! Thank you for shopping at Clacie.");

                return match order.payment_url.as_deref() {
                    Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
                        Redirect::to(url).into_response()
                    }
                    _ => Redirect::to(&format!("/orders/{}", order.id)).into_response(),
                };
            }
            Err(ApiError::Unauthorized) => {
                return AppError::Api(ApiError::Unauthorized).into_response();
            }
            Err(e) => {
                tracing::error!("Checkout failed: {e}");
                FieldErrors::form(
                    e.user_message()
                        .unwrap_or("We couldn't place your order. Please try again."),
                )
            }
        },
        Err(errors) => errors,
    };

    let mut form = submission.form;
    let offered = form
        .selection()
        .offered_or_defaults(&data.shipping, &data.payment);
    form.shipping_method = offered.shipping_method;
    form.payment_method = offered.payment_method;

    let layout = LayoutContext::new(&mut auth.session, preferences, CHECKOUT_PATH);
    (
        StatusCode::BAD_REQUEST,
        CheckoutTemplate::new(layout, data, form, errors),
    )
        .into_response()
}
