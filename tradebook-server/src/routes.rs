use crate::AppState;
use crate::auth::{AdminUser, TradingUser};
use crate::error::AppError;
use crate::helpers::{found, now};
use crate::pages;
use crate::validation;

use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use axum_macros::debug_handler;
use serde::Deserialize;
use std::sync::Arc;
use tradebook_sheets::Dataset;

#[derive(Deserialize)]
pub(crate) struct TradeForm {
    #[serde(default)]
    units: String,
}

pub(crate) async fn root() -> Html<String> {
    Html(pages::root_page())
}

pub(crate) async fn css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], pages::CSS)
}

pub(crate) async fn invalid_url() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(pages::invalid_url_page()))
}

#[debug_handler]
pub(crate) async fn trade(
    State(state): State<Arc<AppState>>,
    TradingUser(user): TradingUser,
) -> Result<Html<String>, AppError> {
    let balance = state.sheet.balance(&user.name).await?;
    Ok(Html(pages::trade_page(&user.name, balance)))
}

#[debug_handler]
pub(crate) async fn submit_trade(
    State(state): State<Arc<AppState>>,
    TradingUser(user): TradingUser,
    Form(form): Form<TradeForm>,
) -> Result<Response, AppError> {
    let units = validation::validate_units(&form.units)?;

    state.sheet.record_trade(&user.name, units, now()).await?;
    // Balances are computed in the sheet from the trade log
    state.sheet.refresh_units().await?;

    Ok(found("/trade"))
}

pub(crate) async fn units(
    State(state): State<Arc<AppState>>,
    TradingUser(_user): TradingUser,
) -> Result<Html<String>, AppError> {
    let units = state.sheet.units().await?;
    Ok(Html(pages::units_page(&units)))
}

pub(crate) async fn admin(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Html<String> {
    Html(pages::admin_page(
        state.sheet.is_cached(Dataset::Users),
        state.sheet.is_cached(Dataset::Units),
    ))
}

pub(crate) async fn refresh_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Response, AppError> {
    state.sheet.refresh_users().await?;
    Ok(found("/admin"))
}

pub(crate) async fn refresh_units(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Response, AppError> {
    state.sheet.refresh_units().await?;
    Ok(found("/admin"))
}

pub(crate) async fn clear_trades(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
) -> Result<Response, AppError> {
    state.sheet.clear_trades().await?;
    state.sheet.refresh_units().await?;
    Ok(found("/admin"))
}
