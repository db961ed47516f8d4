use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{BookingId, CoreError, CoreResult, EstateId, UserId};

pub const OVERLAP_MESSAGE: &str = "Booking dates overlap with an existing approved booking.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Declined,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Declined => "declined",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Checks that `party` may move a booking from `self` to `to`.
    pub fn ensure_transition(self, to: BookingStatus, party: Party) -> CoreResult<()> {
        let required = match (self, to) {
            (BookingStatus::Pending, BookingStatus::Approved)
            | (BookingStatus::Pending, BookingStatus::Declined) => Party::Landlord,
            (BookingStatus::Pending, BookingStatus::Cancelled)
            | (BookingStatus::Approved, BookingStatus::Cancelled) => Party::Tenant,
            _ => {
                return Err(CoreError::validation(format!(
                    "Cannot change booking status from {} to {}.",
                    self, to
                )))
            }
        };

        if party != required {
            return Err(CoreError::PermissionDenied(match required {
                Party::Landlord => "Only the estate owner can approve or decline a booking.".to_string(),
                Party::Tenant => "Only the tenant can cancel a booking.".to_string(),
            }));
        }
        Ok(())
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "declined" => Ok(BookingStatus::Declined),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::validation(format!(
                "\"{}\" is not a valid booking status.",
                other
            ))),
        }
    }
}

/// Which side of a booking the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Tenant,
    Landlord,
}

/// Half-open stay `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl DateRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> CoreResult<Self> {
        if check_in >= check_out {
            return Err(CoreError::validation("check_out must be after check_in."));
        }
        Ok(Self { check_in, check_out })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        other.check_in < self.check_out && other.check_out > self.check_in
    }
}

/// Rejects `proposed` if it collides with any approved stay.
pub fn ensure_no_overlap<'a, I>(proposed: &DateRange, approved: I) -> CoreResult<()>
where
    I: IntoIterator<Item = &'a DateRange>,
{
    if approved.into_iter().any(|existing| existing.overlaps(proposed)) {
        return Err(CoreError::validation(OVERLAP_MESSAGE));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub estate: EstateId,
    pub tenant: UserId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: BookingStatus,
}

impl Booking {
    pub fn range(&self) -> DateRange {
        DateRange {
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }

    /// An approved stay that has started entitles its tenant to a review.
    pub fn grants_review(&self, estate: EstateId, tenant: UserId, today: NaiveDate) -> bool {
        self.estate == estate
            && self.tenant == tenant
            && self.status == BookingStatus::Approved
            && self.check_in <= today
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub estate: EstateId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl BookingRequest {
    pub fn into_new(self, tenant: UserId) -> CoreResult<NewBooking> {
        Ok(NewBooking {
            estate: self.estate,
            tenant,
            range: DateRange::new(self.check_in, self.check_out)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub estate: EstateId,
    pub tenant: UserId,
    pub range: DateRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: BookingStatus,
}
