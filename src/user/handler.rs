use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::event::service::EventService;
use crate::user;
use crate::user::model::UserDto;

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<i64>,
}

pub async fn search(
    Extension(logged_sub): Extension<user::Sub>,
    Query(params): Query<SearchParams>,
    user_service: State<user::Service>,
    event_service: State<EventService>,
) -> crate::Result<Json<Vec<UserDto>>> {
    let q = params
        .q
        .ok_or(crate::Error::QueryParamRequired("q".to_owned()))?;

    let users = user_service.search(&q, &logged_sub, params.limit).await?;

    let users = users
        .into_iter()
        .map(|u| {
            let online = event_service.online(&u.sub);
            u.with_online(online)
        })
        .collect();

    Ok(Json(users))
}
