use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlanetariumDome {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

impl PlanetariumDome {
    pub fn capacity(&self) -> i32 {
        self.rows * self.seats_in_row
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
    fn capacity_is_rows_times_seats() {
        assert_eq!(dome(10, 10).capacity(), 100);
        assert_eq!(dome(30, 10).capacity(), 300);
        assert_eq!(dome(1, 1).capacity(), 1);
    }

    proptest! {
        #[test]
        fn capacity_matches_grid(rows in 1i32..=1000, seats in 1i32..=1000) {
            prop_assert_eq!(dome(rows, seats).capacity(), rows * seats);
        }
    }
}
