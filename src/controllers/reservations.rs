use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::controllers::show_sessions::session_dome;
use crate::error::{db_write_error, ApiError};
use crate::middleware::AuthUser;
use crate::models::Ticket;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route(
            "/reservations/{id}",
            get(get_reservation).delete(delete_reservation),
        )
}

const SEAT_TAKEN: &str = "The fields show_session, row, seat must make a unique set.";

/* ---------- requests / responses ---------- */

#[derive(Debug, Deserialize)]
struct TicketRequest {
    row: i32,
    seat: i32,
    show_session: i64,
}

#[derive(Debug, Deserialize)]
struct ReservationRequest {
    tickets: Vec<TicketRequest>,
}

#[derive(Debug, Serialize)]
struct TicketResponse {
    id: i64,
    row: i32,
    seat: i32,
    show_session: i64,
}

#[derive(Debug, Serialize)]
struct ReservationResponse {
    id: i64,
    tickets: Vec<TicketResponse>,
    created_at: DateTime<Utc>,
}

/* ---------- RESERVATIONS ---------- */

// POST /api/reservations
//
// One transaction for the reservation row and every ticket row: a failed seat
// validation or a lost uniqueness race rolls the whole thing back.
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<ReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.tickets.is_empty() {
        return Err(ApiError::validation("tickets", "This list may not be empty."));
    }

    let mut tx = state.db.pool.begin().await?;

    let (reservation_id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
        "INSERT INTO reservations (user_id) VALUES ($1) RETURNING id, created_at",
    )
    .bind(user.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut tickets = Vec::with_capacity(req.tickets.len());
    for ticket in &req.tickets {
        let dome = session_dome(&state.db.pool, ticket.show_session)
            .await?
            .ok_or(ApiError::NotFound("show session"))?;

        // Same validation as the standalone ticket path
        Ticket::validate_seat(ticket.row, ticket.seat, &dome)?;

        let (ticket_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO tickets (show_session_id, reservation_id, "row", seat)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(ticket.show_session)
        .bind(reservation_id)
        .bind(ticket.row)
        .bind(ticket.seat)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_write_error(e, SEAT_TAKEN, "show session"))?;

        tickets.push(TicketResponse {
            id: ticket_id,
            row: ticket.row,
            seat: ticket.seat,
            show_session: ticket.show_session,
        });
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            id: reservation_id,
            tickets,
            created_at,
        }),
    ))
}

/* ---------- listing ---------- */

#[derive(Debug, FromRow)]
struct TicketSessionRow {
    id: i64,
    reservation_id: i64,
    row: i32,
    seat: i32,
    session_id: i64,
    show_time: DateTime<Utc>,
    astronomy_show_title: String,
    planetarium_dome_name: String,
    planetarium_dome_capacity: i32,
    tickets_available: i32,
}

#[derive(Debug, Serialize)]
struct TicketListItem {
    id: i64,
    row: i32,
    seat: i32,
    show_session: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ReservationListItem {
    id: i64,
    tickets: Vec<TicketListItem>,
    created_at: DateTime<Utc>,
}

async fn tickets_for_reservations(
    pool: &sqlx::PgPool,
    reservation_ids: &[i64],
) -> Result<BTreeMap<i64, Vec<TicketListItem>>, ApiError> {
    let rows = sqlx::query_as::<_, TicketSessionRow>(
        r#"
        SELECT t.id, t.reservation_id, t."row", t.seat,
               ss.id AS session_id, ss.show_time,
               a.title AS astronomy_show_title,
               d.name AS planetarium_dome_name,
               d."rows" * d.seats_in_row AS planetarium_dome_capacity,
               d."rows" * d.seats_in_row
                 - (SELECT COUNT(*) FROM tickets tt WHERE tt.show_session_id = ss.id)::INT
                 AS tickets_available
        FROM tickets t
        JOIN show_sessions ss ON ss.id = t.show_session_id
        JOIN astronomy_shows a ON a.id = ss.astronomy_show_id
        JOIN planetarium_domes d ON d.id = ss.planetarium_dome_id
        WHERE t.reservation_id = ANY($1)
        ORDER BY t."row", t.seat
        "#,
    )
    .bind(reservation_ids)
    .fetch_all(pool)
    .await?;

    let mut map: BTreeMap<i64, Vec<TicketListItem>> = BTreeMap::new();
    for row in rows {
        map.entry(row.reservation_id).or_default().push(TicketListItem {
            id: row.id,
            row: row.row,
            seat: row.seat,
            show_session: serde_json::json!({
                "id": row.session_id,
                "show_time": row.show_time,
                "astronomy_show_title": row.astronomy_show_title,
                "planetarium_dome_name": row.planetarium_dome_name,
                "planetarium_dome_capacity": row.planetarium_dome_capacity,
                "tickets_available": row.tickets_available,
            }),
        });
    }
    Ok(map)
}

// GET /api/reservations
async fn list_reservations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let reservations = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
        "SELECT id, created_at FROM reservations WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db.pool)
    .await?;

    let ids: Vec<i64> = reservations.iter().map(|(id, _)| *id).collect();
    let mut tickets = tickets_for_reservations(&state.db.pool, &ids).await?;

    let payload: Vec<ReservationListItem> = reservations
        .into_iter()
        .map(|(id, created_at)| ReservationListItem {
            id,
            tickets: tickets.remove(&id).unwrap_or_default(),
            created_at,
        })
        .collect();

    Ok(Json(payload))
}

// GET /api/reservations/{id}
async fn get_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let reservation = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
        "SELECT id, created_at FROM reservations WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or(ApiError::NotFound("reservation"))?;

    let mut tickets = tickets_for_reservations(&state.db.pool, &[reservation.0]).await?;

    Ok(Json(ReservationListItem {
        id: reservation.0,
        tickets: tickets.remove(&reservation.0).unwrap_or_default(),
        created_at: reservation.1,
    }))
}

// DELETE /api/reservations/{id}
//
// A reservation owns its tickets: both are removed in one transaction.
async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.pool.begin().await?;

    sqlx::query("DELETE FROM tickets WHERE reservation_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM reservations WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        // Not this user's reservation (or none at all): roll back the ticket delete too
        return Err(ApiError::NotFound("reservation"));
    }

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
