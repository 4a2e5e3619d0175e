//! Check whether a proposed booking fits into free time.
//!
//! A booking must lie inside ONE free interval. Two intervals separated by a
//! booked session are never bridged, and neither are intervals that merely
//! touch: adjacent free intervals are kept separate all the way from masking.

use crate::error::{Result, SlotError};
use crate::model::{BookingRequest, FreeInterval};

/// True iff a single free interval contains the whole request.
///
/// Requests with a non-positive duration, or one that runs past the
/// representable range, never fit.
pub fn fits(request: &BookingRequest, free: &[FreeInterval]) -> bool {
    find_host(request, free).is_some()
}

/// The free interval that would host `request`, if any.
pub fn find_host<'a>(request: &BookingRequest, free: &'a [FreeInterval]) -> Option<&'a FreeInterval> {
    if request.duration_minutes <= 0 {
        return None;
    }
    let wanted = request.span()?;
    free.iter().find(|interval| interval.span().contains(&wanted))
}

/// [`fits`] as a `Result` for callers that propagate with `?`.
///
/// # Errors
/// Returns `SlotError::BookingOutsideAvailability` when the request does not fit.
pub fn validate_booking(request: &BookingRequest, free: &[FreeInterval]) -> Result<()> {
    if fits(request, free) {
        return Ok(());
    }
    Err(SlotError::BookingOutsideAvailability {
        start: request.proposed_start,
        duration_minutes: request.duration_minutes,
    })
}
