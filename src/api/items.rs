//! Item endpoints: listing, search, details and comments

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{
        comment::CreateComment,
        item::{CreateItem, UpdateItem},
        CommentDetails, Item, ItemDetails,
    },
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery, PageParams, SharerUserId};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Text looked up in item name and description
    #[serde(default)]
    pub text: String,
}

/// Items owned by the caller
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Caller user ID"),
        PageParams
    ),
    responses(
        (status = 200, description = "Caller's items", body = Vec<ItemDetails>),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_own_items(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiQuery(params): ApiQuery<PageParams>,
) -> AppResult<Json<Vec<ItemDetails>>> {
    let (from, size) = params.resolve(state.config.bookings.default_page_size);
    let items = state.services.items.list_for_owner(user_id, from, size).await?;
    Ok(Json(items))
}

/// Search available items
#[utoipa::path(
    get,
    path = "/items/search",
    tag = "items",
    params(SearchParams, PageParams),
    responses(
        (status = 200, description = "Matching available items", body = Vec<Item>)
    )
)]
pub async fn search_items(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<SearchParams>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> AppResult<Json<Vec<Item>>> {
    let (from, size) = page.resolve(state.config.bookings.default_page_size);
    let items = state.services.items.search(&search.text, from, size).await?;
    Ok(Json(items))
}

/// Item details, with last and next bookings for the owner
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Caller user ID"),
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item details", body = ItemDetails),
        (status = 404, description = "User or item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<ItemDetails>> {
    let item = state.services.items.get(user_id, id).await?;
    Ok(Json(item))
}

/// Create a new item owned by the caller
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Caller user ID")
    ),
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiJson(item): ApiJson<CreateItem>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let created = state.services.items.create(user_id, item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an item owned by the caller
#[utoipa::path(
    patch,
    path = "/items/{id}",
    tag = "items",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Caller user ID"),
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 403, description = "Caller does not own the item", body = crate::error::ErrorResponse),
        (status = 404, description = "User or item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiPath(id): ApiPath<i64>,
    ApiJson(item): ApiJson<UpdateItem>,
) -> AppResult<Json<Item>> {
    let updated = state.services.items.update(user_id, id, item).await?;
    Ok(Json(updated))
}

/// Comment an item the caller has finished a booking of
#[utoipa::path(
    post,
    path = "/items/{id}/comment",
    tag = "items",
    params(
        ("X-Sharer-User-Id" = i64, Header, description = "Caller user ID"),
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = CreateComment,
    responses(
        (status = 201, description = "Comment added", body = CommentDetails),
        (status = 400, description = "No finished booking of the item", body = crate::error::ErrorResponse),
        (status = 404, description = "User or item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_comment(
    State(state): State<AppState>,
    SharerUserId(user_id): SharerUserId,
    ApiPath(id): ApiPath<i64>,
    ApiJson(comment): ApiJson<CreateComment>,
) -> AppResult<(StatusCode, Json<CommentDetails>)> {
    let created = state.services.items.add_comment(user_id, id, comment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
