//! Locations and subjects endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::reference::{CreateNamed, Location, Subject},
    AppState,
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/locations",
    tag = "reference",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Locations", body = Vec<Location>)
    )
)]
pub async fn list_locations(State(state): State<AppState>, user: AuthenticatedUser) -> AppResult<Json<Vec<Location>>> {
    let locations = state.services.equipment.list_locations(&user.caller()).await?;
    Ok(Json(locations))
}

#[utoipa::path(
    post,
    path = "/locations",
    tag = "reference",
    security(("bearer_auth" = [])),
    request_body = CreateNamed,
    responses(
        (status = 201, description = "Location created", body = Location)
    )
)]
pub async fn create_location(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(data): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<Location>)> {
    let location = state.services.equipment.create_location(&user.caller(), &data).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    get,
    path = "/subjects",
    tag = "reference",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subjects", body = Vec<Subject>)
    )
)]
pub async fn list_subjects(State(state): State<AppState>, user: AuthenticatedUser) -> AppResult<Json<Vec<Subject>>> {
    let subjects = state.services.equipment.list_subjects(&user.caller()).await?;
    Ok(Json(subjects))
}

#[utoipa::path(
    post,
    path = "/subjects",
    tag = "reference",
    security(("bearer_auth" = [])),
    request_body = CreateNamed,
    responses(
        (status = 201, description = "Subject created", body = Subject)
    )
)]
pub async fn create_subject(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(data): Json<CreateNamed>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    let subject = state.services.equipment.create_subject(&user.caller(), &data).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}
