//! Status enums for returns, refunds and return shipments.
//!
//! Two status vocabularies exist for the same return:
//!
//! - [`RequestStatus`] is what this system writes into WooCommerce order
//!   metadata (`pending` → `processed` | `rejected`).
//! - [`JloReturnStatus`] is the richer lifecycle tracked by the JLO returns
//!   service. [`JloReturnStatus::coarse`] projects it onto [`RequestStatus`].
//!
//! The two are only eventually consistent; nothing enforces agreement.

use serde::{Deserialize, Serialize};

/// Coarse status of a return or refund request as stored on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, waiting for an admin decision.
    #[default]
    Pending,
    /// Approved and acted upon (refund issued or replacement arranged).
    Processed,
    /// Declined.
    Rejected,
}

impl RequestStatus {
    /// The string written to `_return_request_status` / `_refund_request_status`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processed" => Ok(Self::Processed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid request status: {s}")),
        }
    }
}

/// Return lifecycle as reported by the JLO returns service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JloReturnStatus {
    /// Customer submitted the return.
    Requested,
    /// Courier pickup booked.
    PickupScheduled,
    /// Parcel on its way to the hub.
    InTransit,
    /// Parcel received at the returns hub.
    DeliveredToHub,
    /// Hub staff inspecting the items.
    InspectionInProgress,
    /// Inspection passed.
    Approved,
    /// Inspection failed or return declined.
    Rejected,
    /// Refund initiated.
    RefundProcessing,
    /// Refund settled.
    RefundCompleted,
}

impl JloReturnStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Requested,
        Self::PickupScheduled,
        Self::InTransit,
        Self::DeliveredToHub,
        Self::InspectionInProgress,
        Self::Approved,
        Self::Rejected,
        Self::RefundProcessing,
        Self::RefundCompleted,
    ];

    /// Wire representation used by JLO.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::PickupScheduled => "pickup_scheduled",
            Self::InTransit => "in_transit",
            Self::DeliveredToHub => "delivered_to_hub",
            Self::InspectionInProgress => "inspection_in_progress",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RefundProcessing => "refund_processing",
            Self::RefundCompleted => "refund_completed",
        }
    }

    /// Project the JLO lifecycle onto the coarse WooCommerce-side status.
    #[must_use]
    pub const fn coarse(&self) -> RequestStatus {
        match self {
            Self::Rejected => RequestStatus::Rejected,
            Self::Approved | Self::RefundProcessing | Self::RefundCompleted => {
                RequestStatus::Processed
            }
            Self::Requested
            | Self::PickupScheduled
            | Self::InTransit
            | Self::DeliveredToHub
            | Self::InspectionInProgress => RequestStatus::Pending,
        }
    }
}

impl std::fmt::Display for JloReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JloReturnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("invalid JLO return status: {s}"))
    }
}

/// What the customer wants in exchange for the returned items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreferredResolution {
    /// Money back.
    #[default]
    Refund,
    /// Same item again.
    Replacement,
}

impl PreferredResolution {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Replacement => "replacement",
        }
    }
}

impl std::fmt::Display for PreferredResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PreferredResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refund" => Ok(Self::Refund),
            "replacement" => Ok(Self::Replacement),
            _ => Err(format!("invalid preferred resolution: {s}")),
        }
    }
}

/// How the returned parcel gets back to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnMethod {
    /// A courier collects the parcel from the customer.
    Pickup,
    /// The customer drops the parcel at a hub or partner location.
    Dropoff,
}

impl ReturnMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
        }
    }
}

impl std::fmt::Display for ReturnMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReturnMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(Self::Pickup),
            "dropoff" => Ok(Self::Dropoff),
            _ => Err(format!("invalid return method: {s}")),
        }
    }
}
