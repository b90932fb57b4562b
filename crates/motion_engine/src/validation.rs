//! Frame contract checks applied before any analysis.
//!
//! Only a non-finite `accG` is fatal. Malformed optional values degrade:
//! non-finite `linAcc`/gyro components reach the feature extractor, which
//! drops them, and unusable GPS fields are removed here.

use contracts::{ContractError, Frame, GpsFix};

/// Reject frames whose required values are not finite
pub fn validate_frame(index: usize, frame: &Frame) -> Result<(), ContractError> {
    if !frame.acc_g.is_finite() {
        return Err(ContractError::invalid_frame(
            index,
            "accG",
            "components must be finite",
        ));
    }
    Ok(())
}

/// Validate every frame, stopping at the first violation
pub fn validate_frames(frames: &[Frame]) -> Result<(), ContractError> {
    frames
        .iter()
        .enumerate()
        .try_for_each(|(index, frame)| validate_frame(index, frame))
}

/// Drop GPS values that cannot be used.
///
/// A fix without finite position or accuracy is removed; non-finite
/// speed or heading becomes absent. Returns whether anything changed.
pub fn sanitize_frame(frame: &mut Frame) -> bool {
    let Some(fix) = frame.gps else {
        return false;
    };
    if !(fix.latitude.is_finite() && fix.longitude.is_finite() && fix.accuracy.is_finite()) {
        frame.gps = None;
        return true;
    }
    let cleaned = GpsFix {
        speed: fix.speed.filter(|v| v.is_finite()),
        heading: fix.heading.filter(|v| v.is_finite()),
        ..fix
    };
    let changed = cleaned.speed != fix.speed || cleaned.heading != fix.heading;
    frame.gps = Some(cleaned);
    changed
}

/// Validate, then return sanitized copies of `frames`
pub fn prepare_frames(frames: &[Frame]) -> Result<Vec<Frame>, ContractError> {
    validate_frames(frames)?;
    let mut prepared = frames.to_vec();
    let dropped = prepared.iter_mut().map(sanitize_frame).filter(|&changed| changed).count();
    if dropped > 0 {
        tracing::debug!(frames = dropped, "malformed gps values dropped");
        metrics::counter!("ride_gps_values_dropped_total").increment(dropped as u64);
    }
    Ok(prepared)
}
