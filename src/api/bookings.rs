//! Booking endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{Booking, BookingState, NewBooking},
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, PageParams, SharerUserId};

/// Create booking request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Item to book
    pub item_id: i64,
    /// Start of the booked period (RFC 3339)
    pub start: DateTime<Utc>,
    /// End of the booked period, strictly after `start`
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DecisionParams {
    /// true to approve, false to reject
    pub approved: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StateParams {
    /// ALL, CURRENT, PAST, FUTURE, WAITING or REJECTED (case-insensitive), defaults to ALL
    pub state: Option<String>,
}

impl StateParams {
    /// Check the state keyword before anything reaches the service
    fn state(&self) -> AppResult<BookingState> {
        self.state
            .as_deref()
            .unwrap_or(BookingState::All.as_str())
            .parse()
    }
}

/// Book an item
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Booker user ID")
    ),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created in WAITING status", body = Booking),
        (status = 400, description = "Invalid period or item unavailable", body = crate::error::ErrorResponse),
        (status = 404, description = "User or item not found, or caller owns the item", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let booking = NewBooking {
        item_id: request.item_id,
        booker_id: user_id,
        start: request.start,
        end: request.end,
    };
    let created = state.services.bookings.create(booking).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Approve or reject a waiting booking of one of the caller's items
#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    tag = "bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Item owner user ID"),
        ("id" = i64, Path, description = "Booking ID"),
        DecisionParams
    ),
    responses(
        (status = 200, description = "Booking decided", body = Booking),
        (status = 400, description = "Booking already decided", body = crate::error::ErrorResponse),
        (status = 404, description = "User or booking not found, or caller is not the owner", body = crate::error::ErrorResponse)
    )
)]
pub async fn decide_booking(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<DecisionParams>,
) -> AppResult<Json<Booking>> {
    let booking = state
        .services
        .bookings
        .approve(user_id, id, params.approved)
        .await?;
    Ok(Json(booking))
}

/// Get a booking as its booker or as the item owner
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Caller user ID"),
        ("id" = i64, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking", body = Booking),
        (status = 404, description = "Not found or not visible to the caller", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.get_by_id(user_id, id).await?;
    Ok(Json(booking))
}

/// Bookings made by the caller
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Booker user ID"),
        StateParams,
        PageParams
    ),
    responses(
        (status = 200, description = "Bookings, latest start first", body = Vec<Booking>),
        (status = 400, description = "Unknown state or invalid page", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_booker_bookings(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiQuery(filter): ApiQuery<StateParams>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> AppResult<Json<Vec<Booking>>> {
    let booking_state = filter.state()?;
    let (from, size) = page.resolve(state.config.bookings.default_page_size);

    let bookings = state
        .services
        .bookings
        .list_for_booker(user_id, booking_state.as_str(), from, size)
        .await?;
    Ok(Json(bookings))
}

/// Bookings of items owned by the caller
#[utoipa::path(
    get,
    path = "/bookings/owner",
    tag = "bookings",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Owner user ID"),
        StateParams,
        PageParams
    ),
    responses(
        (status = 200, description = "Bookings, latest start first", body = Vec<Booking>),
        (status = 400, description = "Unknown state or invalid page", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_owner_bookings(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiQuery(filter): ApiQuery<StateParams>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> AppResult<Json<Vec<Booking>>> {
    let booking_state = filter.state()?;
    let (from, size) = page.resolve(state.config.bookings.default_page_size);

    let bookings = state
        .services
        .bookings
        .list_for_owner(user_id, booking_state.as_str(), from, size)
        .await?;
    Ok(Json(bookings))
}
