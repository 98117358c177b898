//! Account route handlers: dashboard and order detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use clacie_core::OrderId;
use serde::Deserialize;
use tracing::instrument;

use crate::api::{Address, ApiError, Order, User};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{FieldErrors, is_resource_id};
use crate::forms::address::AddressForm;
use crate::forms::profile::ProfileForm;
use crate::middleware::{LOGIN_PATH, Preferences, RequireAuth};
use crate::routes::layout::LayoutContext;
use crate::state::AppState;

const DASHBOARD_PATH: &str = "/dashboard";

/// Dashboard query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    /// Address to load into the address form.
    pub edit: String,
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: LayoutContext,
    pub profile: User,
    pub orders: Vec<Order>,
    pub orders_unavailable: bool,
    pub addresses: Vec<Address>,
    pub addresses_unavailable: bool,
    pub profile_form: ProfileForm,
    pub profile_errors: FieldErrors,
    pub profile_saved: bool,
    pub address_form: AddressForm,
    pub address_errors: FieldErrors,
    pub redirect_to: &'static str,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: LayoutContext,
    pub order: Order,
}

/// Display the account dashboard.
///
/// The profile is required; orders and addresses degrade to a notice.
#[instrument(skip(state, auth, preferences))]
pub async fn dashboard(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    preferences: Preferences,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let token = auth.token();
    let (profile, orders, addresses) = tokio::join!(
        state.auth().profile(token),
        state.commerce().orders(token),
        state.commerce().addresses(token),
    );

    let profile = match profile {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Dashboard: failed to load profile: {e}");
            auth.session.destroy();
            auth.session.flash("Please sign in again");
            return Redirect::to(LOGIN_PATH).into_response();
        }
    };

    let (orders, orders_unavailable) = orders.map_or_else(
        |e| {
            tracing::warn!("Dashboard: failed to load orders: {e}");
            (Vec::new(), true)
        },
        |orders| (orders, false),
    );
    let (addresses, addresses_unavailable) = addresses.map_or_else(
        |e| {
            tracing::warn!("Dashboard: failed to load addresses: {e}");
            (Vec::new(), true)
        },
        |addresses| (addresses, false),
    );

    let address_form = addresses
        .iter()
        .find(|address| address.id.as_str() == query.edit)
        .map_or_else(AddressForm::blank, AddressForm::from_address);

    DashboardTemplate {
        layout: LayoutContext::new(&mut auth.session, preferences, DASHBOARD_PATH),
        profile_form: ProfileForm::from(&profile),
        profile,
        orders,
        orders_unavailable,
        addresses,
        addresses_unavailable,
        profile_errors: FieldErrors::new(),
        profile_saved: false,
        address_form,
        address_errors: FieldErrors::new(),
        redirect_to: DASHBOARD_PATH,
    }
    .into_response()
}

/// Display one order.
#[instrument(skip(state, auth, preferences))]
pub async fn order(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    preferences: Preferences,
    Path(id): Path<String>,
) -> Result<OrderTemplate> {
    if !is_resource_id(&id) {
        return Err(AppError::BadRequest(format!("Invalid order id: {id:.32}")));
    }
    let order_id = OrderId::new(id);
    let order = state
        .commerce()
        .order(auth.token(), &order_id)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => AppError::NotFound(format!("Order not found: {order_id}")),
            other => AppError::Api(other),
        })?;

    Ok(OrderTemplate {
        layout: LayoutContext::new(
            &mut auth.session,
            preferences,
            &format!("/orders/{}", order.id),
        ),
        order,
    })
}
