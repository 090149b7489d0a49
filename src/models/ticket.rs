use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;
use crate::models::PlanetariumDome;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub show_session_id: i64,
    pub reservation_id: i64,
    pub row: i32,
    pub seat: i32,
}

impl Ticket {
    /// Checks that a seat coordinate lies inside the dome grid. This is the
    /// single validation entry point for every ticket write, including the
    /// nested path through reservation creation.
    pub fn validate_seat(row: i32, seat: i32, dome: &PlanetariumDome) -> Result<(), ApiError> {
        for (value, field, bound_name, bound) in [
            (row, "row", "rows", dome.rows),
            (seat, "seat", "seats_in_row", dome.seats_in_row),
        ] {
            if !(1..=bound).contains(&value) {
                return Err(ApiError::validation(
                    field,
                    format!(
                        "{field} number must be in available range: (1, {bound_name}): (1, {bound})"
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dome(rows: i32, seats_in_row: i32) -> PlanetariumDome {
        PlanetariumDome {
            id: 1,
            name: "Main dome".to_string(),
            rows,
            seats_in_row,
        }
    }

    #[test]
    fn seat_inside_grid_is_valid() {
        let d = dome(10, 10);
        assert!(Ticket::validate_seat(1, 1, &d).is_ok());
        assert!(Ticket::validate_seat(10, 10, &d).is_ok());
        assert!(Ticket::validate_seat(5, 7, &d).is_ok());
    }

    #[test]
    fn row_out_of_range_names_row_field() {
        let result = Ticket::validate_seat(11, 1, &dome(10, 10));
        match result {
            Err(ApiError::Validation { field, message }) => {
                assert_eq!(field, "row");
                assert_eq!(
                    message,
                    "row number must be in available range: (1, rows): (1, 10)"
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn seat_out_of_range_names_seat_field() {
        let result = Ticket::validate_seat(3, 0, &dome(20, 15));
        match result {
            Err(ApiError::Validation { field, message }) => {
                assert_eq!(field, "seat");
                assert_eq!(
                    message,
                    "seat number must be in available range: (1, seats_in_row): (1, 15)"
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn row_is_checked_before_seat() {
        // Both out of range: the row error wins, same as single-field clients expect.
        let result = Ticket::validate_seat(0, 0, &dome(10, 10));
        match result {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field, "row"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn row_fails_iff_outside_bounds(
            row in -50i32..=50,
            rows in 1i32..=40,
        ) {
            let result = Ticket::validate_seat(row, 1, &dome(rows, 100));
            prop_assert_eq!(result.is_err(), row < 1 || row > rows);
        }

        #[test]
        fn seat_fails_iff_outside_bounds(
            seat in -50i32..=50,
            seats_in_row in 1i32..=40,
        ) {
            let result = Ticket::validate_seat(1, seat, &dome(100, seats_in_row));
            prop_assert_eq!(result.is_err(), seat < 1 || seat > seats_in_row);
        }
    }
}
