//! Investment calculation engine.
//!
//! A pure function over the flat's pricing inputs and its room list,
//! producing a per-room sale breakdown and annualized yield figures.
//! Inputs that would divide by zero are rejected up front.

use crate::models::RefusalStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("Invalid calculation input: {0}")]
    InvalidInput(String),
}

/// One room as the engine sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInput {
    pub number_on_plan: String,
    pub area: f64,
    pub refusal_status: RefusalStatus,
}

/// Pricing inputs for a whole-flat buyout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldInput {
    pub flat_area: f64,
    pub rooms: Vec<RoomInput>,
    pub price_per_meter_buy: f64,
    pub agent_commission_pct: f64,
    pub living_period_months: f64,
    pub price_per_meter_sell: f64,
}

/// Sale projection for one room slated for direct or cross sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSale {
    pub room_sale_price: i64,
    pub annual_yield_pct: i64,
}

/// Per-room line of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLineItem {
    pub number_on_plan: String,
    pub area: f64,
    pub part_price: i64,
    pub sale: Option<RoomSale>,
}

/// The full profitability report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldReport {
    pub flat_price: i64,
    pub agent_commission_price: i64,
    pub margin_per_meter: f64,
    pub rooms: Vec<RoomLineItem>,
}

/// Compute the per-room profitability report for buying out a flat.
///
/// `total_living_area` is the sum of room areas; the non-living remainder
/// of the flat is what generates the margin. Rooms whose refusal status
/// marks them for direct or cross sale additionally get a sale price and
/// an annualized yield.
pub fn compute_yield(input: &YieldInput) -> Result<YieldReport, CalcError> {
    let total_living_area: f64 = input.rooms.iter().map(|r| r.area).sum();
    if total_living_area <= 0.0 {
        return Err(CalcError::InvalidInput(
            "total living area must be positive".to_string(),
        ));
    }
    if input.living_period_months <= 0.0 {
        return Err(CalcError::InvalidInput(
            "living period must be positive".to_string(),
        ));
    }
    let has_sale_rooms = input.rooms.iter().any(|r| r.refusal_status.is_for_sale());
    if has_sale_rooms && input.price_per_meter_sell <= 0.0 {
        return Err(CalcError::InvalidInput(
            "sale price per meter must be positive for rooms slated for sale".to_string(),
        ));
    }

    let non_living_area = input.flat_area - total_living_area;
    let flat_price = (input.price_per_meter_buy * input.flat_area).round() as i64;
    let agent_commission_price =
        (flat_price as f64 * input.agent_commission_pct / 100.0).round() as i64;
    let margin_per_meter = (non_living_area * input.price_per_meter_buy
        - agent_commission_price as f64)
        / total_living_area;

    let rooms = input
        .rooms
        .iter()
        .map(|room| {
            let part_price = (input.price_per_meter_buy * input.flat_area * room.area
                / total_living_area
                * (1.0 - input.agent_commission_pct / 100.0))
                .round() as i64;

            let sale = if room.refusal_status.is_for_sale() {
                let sale_value = input.price_per_meter_sell * room.area;
                let room_sale_price = sale_value.round() as i64;
                let annual_yield_pct = ((part_price as f64 - sale_value) / sale_value
                    * 100.0
                    * (12.0 / input.living_period_months))
                    .round() as i64;
                Some(RoomSale {
                    room_sale_price,
                    annual_yield_pct,
                })
            } else {
                None
            };

            RoomLineItem {
                number_on_plan: room.number_on_plan.clone(),
                area: room.area,
                part_price,
                sale,
            }
        })
        .collect();

    Ok(YieldReport {
        flat_price,
        agent_commission_price,
        margin_per_meter,
        rooms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn room(number: &str, area: f64) -> RoomInput {
        RoomInput {
            number_on_plan: number.to_string(),
            area,
            refusal_status: RefusalStatus::No,
        }
    }

    fn sample_input() -> YieldInput {
        YieldInput {
            flat_area: 112.6,
            rooms: vec![room("1", 28.6), room("2", 33.0), room("3", 24.9)],
            price_per_meter_buy: 165.0,
            agent_commission_pct: 10.0,
            living_period_months: 6.0,
            price_per_meter_sell: 160.0,
        }
    }

    #[test]
    fn test_worked_example() {
        let report = compute_yield(&sample_input()).unwrap();
        assert_eq!(report.flat_price, 18579);
        assert_eq!(report.agent_commission_price, 1858);
        assert_eq!(report.rooms.len(), 3);
    }

    #[test]
    fn test_sale_rooms_get_yield() {
        let mut input = sample_input();
        input.rooms[0].refusal_status = RefusalStatus::DirectSale;
        let report = compute_yield(&input).unwrap();
        let sale = report.rooms[0].sale.as_ref().unwrap();
        assert_eq!(sale.room_sale_price, (160.0f64 * 28.6).round() as i64);
        assert!(report.rooms[1].sale.is_none());
    }

    #[test]
    fn test_zero_living_area_rejected() {
        let mut input = sample_input();
        input.rooms.clear();
        assert!(matches!(
            compute_yield(&input),
            Err(CalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_sale_price_rejected_only_for_sale_rooms() {
        let mut input = sample_input();
        input.price_per_meter_sell = 0.0;
        // No room slated for sale: still computable
        assert!(compute_yield(&input).is_ok());

        input.rooms[0].refusal_status = RefusalStatus::CrossSale;
        assert!(matches!(
            compute_yield(&input),
            Err(CalcError::InvalidInput(_))
        ));
    }

    proptest! {
        #[test]
        fn test_invariant_under_room_reordering(
            areas in prop::collection::vec(1.0f64..80.0, 1..6),
            flat_area in 50.0f64..200.0,
            buy in 50.0f64..300.0,
            pct in 0.0f64..30.0,
        ) {
            let rooms: Vec<RoomInput> = areas
                .iter()
                .enumerate()
                .map(|(i, a)| room(&format!("{}", i + 1), *a))
                .collect();
            let mut reversed = rooms.clone();
            reversed.reverse();

            let make = |rooms: Vec<RoomInput>| YieldInput {
                flat_area,
                rooms,
                price_per_meter_buy: buy,
                agent_commission_pct: pct,
                living_period_months: 6.0,
                price_per_meter_sell: 160.0,
            };

            let forward = compute_yield(&make(rooms)).unwrap();
            let backward = compute_yield(&make(reversed)).unwrap();

            prop_assert_eq!(forward.flat_price, backward.flat_price);
            prop_assert_eq!(forward.agent_commission_price, backward.agent_commission_price);
            prop_assert!((forward.margin_per_meter - backward.margin_per_meter).abs() < 1e-9);

            let mut forward_parts: Vec<i64> =
                forward.rooms.iter().map(|r| r.part_price).collect();
            let mut backward_parts: Vec<i64> =
                backward.rooms.iter().map(|r| r.part_price).collect();
            forward_parts.sort_unstable();
            backward_parts.sort_unstable();
            prop_assert_eq!(forward_parts, backward_parts);
        }
    }
}
