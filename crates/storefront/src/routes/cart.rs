//! Cart route handlers.
//!
//! Quantity edits come from HTMX (debounced on input) and get the cart items
//! fragment back; plain form posts are redirected to `/cart`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::api::{ApiError, Cart};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::forms::cart::{AddToCartInput, CartQuantityInput, MAX_QUANTITY};
use crate::forms::{FieldErrors, Submission, local_redirect_target};
use crate::middleware::{AuthRejection, HxRequest, Preferences, RequireAuth};
use crate::routes::layout::LayoutContext;
use crate::services::cart::{QuantityChange, apply_quantity};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: LayoutContext,
    pub cart: Cart,
    pub errors: FieldErrors,
    pub max_quantity: u32,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: Cart,
    pub errors: FieldErrors,
    pub max_quantity: u32,
}

/// Confirmation fragment after adding to cart (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_added.html")]
pub struct CartAddedTemplate {
    pub quantity: u32,
}

/// Display cart page.
#[instrument(skip(state, auth, preferences))]
pub async fn show(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    preferences: Preferences,
) -> Result<CartShowTemplate> {
    let cart = state.commerce().cart(auth.token()).await?;

    Ok(CartShowTemplate {
        layout: LayoutContext::new(&mut auth.session, preferences, "/cart"),
        cart,
        errors: FieldErrors::new(),
        max_quantity: MAX_QUANTITY,
    })
}

/// Update or remove a cart line.
///
/// `quantity=0` deletes the line, anything else is clamped to stock.
#[instrument(skip(state, auth, submission))]
pub async fn update_quantity(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    HxRequest(htmx): HxRequest,
    submission: Submission<CartQuantityInput>,
) -> Response {
    let errors = match submission.result {
        Ok(input) => match apply_quantity(state.commerce(), auth.token(), &input).await {
            Ok(change) => {
                let action = match change {
                    QuantityChange::Remove => "Removed cart item",
                    QuantityChange::Update(_) => "Updated cart quantity",
                };
                add_breadcrumb("cart", action, Some(&[("item_id", input.item_id.as_str())]));
                FieldErrors::new()
            }
            Err(ApiError::Unauthorized) => return AuthRejection::expired(htmx).into_response(),
            Err(ApiError::NotFound(_)) => {
                FieldErrors::form("That item is no longer in your cart.")
            }
            Err(e) => {
                tracing::error!("Failed to update cart quantity: {e}");
                FieldErrors::form("Could not update your cart. Please try again.")
            }
        },
        Err(errors) => errors,
    };

    if !htmx {
        if let Some(message) = errors.first_message() {
            auth.session.flash(message.to_string());
        }
        return Redirect::to("/cart").into_response();
    }

    match state.commerce().cart(auth.token()).await {
        Ok(cart) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate {
                cart,
                errors,
                max_quantity: MAX_QUANTITY,
            },
        )
            .into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}

/// Add a product to the cart.
#[instrument(skip(state, auth, submission))]
pub async fn add(
    State(state): State<AppState>,
    mut auth: RequireAuth,
    HxRequest(htmx): HxRequest,
    submission: Submission<AddToCartInput>,
) -> Response {
    let back = local_redirect_target(&submission.form.redirect_to)
        .unwrap_or("/products")
        .to_string();

    let input = match submission.result {
        Ok(input) => input,
        Err(errors) => {
            auth.session
                .flash(errors.first_message().unwrap_or("Invalid quantity").to_string());
            return Redirect::to(&back).into_response();
        }
    };

    match state
        .commerce()
        .add_to_cart(auth.token(), &input.product_id, input.quantity)
        .await
    {
        Ok(()) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", input.product_id.as_str())]),
            );
            if htmx {
                (
                    AppendHeaders([("HX-Trigger", "cart-updated")]),
                    CartAddedTemplate {
                        quantity: input.quantity,
                    },
                )
                    .into_response()
            } else {
                auth.session.flash("Added to your cart");
                Redirect::to("/cart").into_response()
            }
        }
        Err(ApiError::Unauthorized) => AuthRejection::expired(htmx).into_response(),
        Err(e) => {
            tracing::error!("Failed to add item to cart: {e}");
            let message = e
                .user_message()
                .unwrap_or("Could not add this item to your cart. Please try again.")
                .to_string();
            auth.session.flash(message);
            Redirect::to(&back).into_response()
        }
    }
}

/// Remove every item from the cart.
#[instrument(skip(state, auth))]
pub async fn clear(State(state): State<AppState>, mut auth: RequireAuth) -> Response {
    match state.commerce().clear_cart(auth.token()).await {
        Ok(()) => auth.session.flash("Your cart is now empty"),
        Err(ApiError::Unauthorized) => return AuthRejection::expired(false).into_response(),
        Err(e) => {
            tracing::error!("Failed to clear cart: {e}");
            auth.session.flash("Could not clear your cart. Please try again.");
        }
    }
    Redirect::to("/cart").into_response()
}
