//! Repair/delivery status taxonomy and the total status-mapping function.
//!
//! The backend emits opaque status codes. Every code resolves to exactly one
//! canonical pipeline stage, or degrades to [`OrderStatus::Unknown`] carrying
//! the original string; mapping never fails.

use serde::{Deserialize, Serialize};

/// Canonical stages of the repair/delivery pipeline, in pipeline order.
///
/// Step indices are strictly increasing with no gaps; progress bars use
/// `step_index / MAX_STEP_INDEX`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStage {
    Requested,
    Estimating,
    EstimateCompleted,
    PaymentPending,
    Paid,
    PickupRequested,
    PickupCompleted,
    Arrived,
    WaitingForRepair,
    RepairStarted,
    Repairing,
    RepairCompleted,
    DeliveryStarted,
    DeliveryCompleted,
    Completed,
}

/// Highest step index in the canonical sequence (zero-indexed, 15 stages).
pub const MAX_STEP_INDEX: u8 = 14;

impl RepairStage {
    /// All canonical stages in pipeline order.
    pub const ALL: [RepairStage; 15] = [
        RepairStage::Requested,
        RepairStage::Estimating,
        RepairStage::EstimateCompleted,
        RepairStage::PaymentPending,
        RepairStage::Paid,
        RepairStage::PickupRequested,
        RepairStage::PickupCompleted,
        RepairStage::Arrived,
        RepairStage::WaitingForRepair,
        RepairStage::RepairStarted,
        RepairStage::Repairing,
        RepairStage::RepairCompleted,
        RepairStage::DeliveryStarted,
        RepairStage::DeliveryCompleted,
        RepairStage::Completed,
    ];

    /// Canonical backend code for this stage.
    pub fn code(&self) -> &'static str {
        match self {
            RepairStage::Requested => "REQUESTED",
            RepairStage::Estimating => "ESTIMATING",
            RepairStage::EstimateCompleted => "ESTIMATE_COMPLETED",
            RepairStage::PaymentPending => "PAYMENT_PENDING",
            RepairStage::Paid => "PAID",
            RepairStage::PickupRequested => "PICKUP_REQUESTED",
            RepairStage::PickupCompleted => "PICKUP_COMPLETED",
            RepairStage::Arrived => "ARRIVED",
            RepairStage::WaitingForRepair => "WAITING_FOR_REPAIR",
            RepairStage::RepairStarted => "REPAIR_STARTED",
            RepairStage::Repairing => "REPAIRING",
            RepairStage::RepairCompleted => "REPAIR_COMPLETED",
            RepairStage::DeliveryStarted => "DELIVERY_STARTED",
            RepairStage::DeliveryCompleted => "DELIVERY_COMPLETED",
            RepairStage::Completed => "COMPLETED",
        }
    }

    /// Display label shown in the customer UI.
    pub fn label(&self) -> &'static str {
        match self {
            RepairStage::Requested => "수선 신청",
            RepairStage::Estimating => "견적 확인중",
            RepairStage::EstimateCompleted => "견적 완료",
            RepairStage::PaymentPending => "결제 대기",
            RepairStage::Paid => "결제 완료",
            RepairStage::PickupRequested => "수거 신청",
            RepairStage::PickupCompleted => "수거 완료",
            RepairStage::Arrived => "입고 완료",
            RepairStage::WaitingForRepair => "수선 대기",
            RepairStage::RepairStarted => "수선 시작",
            RepairStage::Repairing => "수선중",
            RepairStage::RepairCompleted => "수선 완료",
            RepairStage::DeliveryStarted => "배송 시작",
            RepairStage::DeliveryCompleted => "배송 완료",
            RepairStage::Completed => "처리 완료",
        }
    }

    /// Zero-based position in the canonical pipeline.
    pub fn step_index(&self) -> u8 {
        match self {
            RepairStage::Requested => 0,
            RepairStage::Estimating => 1,
            RepairStage::EstimateCompleted => 2,
            RepairStage::PaymentPending => 3,
            RepairStage::Paid => 4,
            RepairStage::PickupRequested => 5,
            RepairStage::PickupCompleted => 6,
            RepairStage::Arrived => 7,
            RepairStage::WaitingForRepair => 8,
            RepairStage::RepairStarted => 9,
            RepairStage::Repairing => 10,
            RepairStage::RepairCompleted => 11,
            RepairStage::DeliveryStarted => 12,
            RepairStage::DeliveryCompleted => 13,
            RepairStage::Completed => 14,
        }
    }

    /// Resolve a backend code (canonical or known alias) to its stage.
    ///
    /// Exact-match only; returns `None` for anything outside the table.
    pub fn from_code(code: &str) -> Option<RepairStage> {
        let stage = match code {
            "REQUESTED" => RepairStage::Requested,
            "ESTIMATING" => RepairStage::Estimating,
            "ESTIMATE_COMPLETED" => RepairStage::EstimateCompleted,
            "PAYMENT_PENDING" => RepairStage::PaymentPending,
            "PAID" | "PAYMENT_COMPLETED" => RepairStage::Paid,
            "PICKUP_REQUESTED" => RepairStage::PickupRequested,
            "PICKUP_COMPLETED" => RepairStage::PickupCompleted,
            "ARRIVED" => RepairStage::Arrived,
            "WAITING_FOR_REPAIR" => RepairStage::WaitingForRepair,
            "REPAIR_STARTED" => RepairStage::RepairStarted,
            "REPAIRING" | "PROCESSING" | "IN_REPAIR" => RepairStage::Repairing,
            "REPAIR_COMPLETED" => RepairStage::RepairCompleted,
            "DELIVERY_STARTED" | "SHIPPING" | "SHIPPED" => RepairStage::DeliveryStarted,
            "DELIVERY_COMPLETED" => RepairStage::DeliveryCompleted,
            "COMPLETED" => RepairStage::Completed,
            _ => return None,
        };
        Some(stage)
    }
}

/// Mapped status of an order: a known pipeline stage, or the raw code when
/// the backend emits something outside the table.
///
/// The `Unknown` variant makes the fallback-over-failure policy total by
/// construction: callers match exhaustively instead of relying on a
/// dictionary default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderStatus {
    Known(RepairStage),
    Unknown(String),
}

impl OrderStatus {
    /// Map an arbitrary backend code. Total; never fails.
    pub fn parse(code: &str) -> OrderStatus {
        match RepairStage::from_code(code) {
            Some(stage) => OrderStatus::Known(stage),
            None => OrderStatus::Unknown(code.to_string()),
        }
    }

    /// Display label; unknown codes show the raw code itself.
    pub fn label(&self) -> &str {
        match self {
            OrderStatus::Known(stage) => stage.label(),
            OrderStatus::Unknown(code) => code,
        }
    }

    /// Step index; unknown codes degrade to the beginning of the pipeline.
    pub fn step_index(&self) -> u8 {
        match self {
            OrderStatus::Known(stage) => stage.step_index(),
            OrderStatus::Unknown(_) => 0,
        }
    }
}

/// Proportional progress for a progress bar: 0.0 at the first stage, 1.0 at
/// the last.
pub fn progress_fraction(step_index: u8) -> f64 {
    f64::from(step_index.min(MAX_STEP_INDEX)) / f64::from(MAX_STEP_INDEX)
}

/// Ordered canonical codes (no aliases), one per pipeline tile.
pub fn canonical_codes() -> [&'static str; 15] {
    let mut codes = [""; 15];
    for (i, stage) in RepairStage::ALL.iter().enumerate() {
        codes[i] = stage.code();
    }
    codes
}

/// Position of a code in the canonical sequence.
///
/// `None` for alias or unknown codes; UI treats that as "no tile
/// highlighted", not an error.
pub fn canonical_position(code: &str) -> Option<usize> {
    RepairStage::ALL.iter().position(|stage| stage.code() == code)
}
