//! Pure lifecycle guards for the complaint state machine.
//!
//! Every mutation in [`crate::writer`] runs one of these decision
//! functions against the row it just locked, then applies the returned
//! effect. Keeping the guards free of I/O makes the state machine
//! directly unit-testable.

use uuid::Uuid;

use civitas_common::{CivitasError, ComplaintStatus, NewComplaint, Result};

/// Minimum description length accepted at creation.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Validate a creation payload. Collects every failure into a single
/// `Validation` error, mirroring the intake form's combined message.
pub fn validate_new_complaint(new: &NewComplaint) -> Result<()> {
    let mut problems = Vec::new();

    if new.sub_type.trim().is_empty() {
        problems.push("Complaint sub-type is required");
    }
    if new.description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
        problems.push("Description must be at least 10 characters long");
    }
    if new.address.trim().is_empty() {
        problems.push("Address is required");
    }
    if !new.location.is_valid() {
        problems.push("Valid coordinates are required");
    }
    if new.photo.trim().is_empty() {
        problems.push("Photo is required");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CivitasError::Validation(problems.join(", ")))
    }
}

/// Reraise is submitter-only and blocked in terminal states.
pub fn check_reraise(status: ComplaintStatus, submitted_by: Uuid, actor: Uuid) -> Result<()> {
    if actor != submitted_by {
        return Err(CivitasError::Forbidden(
            "only the submitter may reraise a complaint".to_string(),
        ));
    }
    if status.is_terminal() {
        return Err(CivitasError::InvalidState(format!(
            "complaint cannot be reraised, current status: {status}"
        )));
    }
    Ok(())
}

/// Assignment guard. Returns the status the complaint should advance to,
/// if any: a `Pending` complaint moves to `Process Ongoing` on first
/// assignment; otherwise the status is left alone.
pub fn decide_assign(
    status: ComplaintStatus,
    current_assignee: Option<Uuid>,
    target: Uuid,
) -> Result<Option<ComplaintStatus>> {
    if current_assignee == Some(target) {
        return Err(CivitasError::Conflict(
            "complaint is already assigned to this entity".to_string(),
        ));
    }
    if status == ComplaintStatus::Pending {
        Ok(Some(ComplaintStatus::ProcessOngoing))
    } else {
        Ok(None)
    }
}

/// Resolution updates come only from the current assignee, only while the
/// complaint is open, and must carry a note and/or a photo.
/// Guard order matches the intake flow: permission, then state, then payload.
pub fn check_resolution_update(
    status: ComplaintStatus,
    assigned_to: Option<Uuid>,
    actor: Uuid,
    note: Option<&str>,
    photo: Option<&str>,
) -> Result<()> {
    if assigned_to != Some(actor) {
        return Err(CivitasError::Forbidden(
            "complaint is not assigned to this user".to_string(),
        ));
    }
    if status.is_terminal() {
        return Err(CivitasError::InvalidState(format!(
            "complaint is already {status}"
        )));
    }
    let has_note = note.is_some_and(|n| !n.trim().is_empty());
    let has_photo = photo.is_some_and(|p| !p.trim().is_empty());
    if !has_note && !has_photo {
        return Err(CivitasError::Validation(
            "resolution update requires either a photo or a note".to_string(),
        ));
    }
    Ok(())
}

/// Outcome of an administrative status/notes update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// New status to write, when it actually differs from the current one.
    pub status: Option<ComplaintStatus>,
    /// The single audit-log entry this action appends.
    pub entry: String,
}

/// Administrative override: any status may be set unconditionally, a note
/// may be appended, but a request that changes nothing is a `NoOp`.
pub fn decide_status_update(
    current: ComplaintStatus,
    requested: Option<ComplaintStatus>,
    note: Option<&str>,
) -> Result<StatusChange> {
    let new_status = requested.filter(|s| *s != current);
    let note = note.map(str::trim).filter(|n| !n.is_empty());

    match (new_status, note) {
        (None, None) => Err(CivitasError::NoOp),
        (status, Some(note)) => Ok(StatusChange {
            status,
            entry: note.to_string(),
        }),
        (Some(status), None) => Ok(StatusChange {
            status: Some(status),
            entry: format!("Status changed to {status} by administrator."),
        }),
    }
}

/// Feedback is submitter-only, post-resolution, write-once, rating 1-5.
pub fn check_feedback(
    status: ComplaintStatus,
    submitted_by: Uuid,
    actor: Uuid,
    already_submitted: bool,
    rating: u8,
) -> Result<()> {
    if actor != submitted_by {
        return Err(CivitasError::Forbidden(
            "only the submitter may leave feedback".to_string(),
        ));
    }
    if status != ComplaintStatus::Resolved {
        return Err(CivitasError::InvalidState(
            "feedback is only accepted on resolved complaints".to_string(),
        ));
    }
    if already_submitted {
        return Err(CivitasError::Conflict(
            "feedback has already been submitted".to_string(),
        ));
    }
    if !(1..=5).contains(&rating) {
        return Err(CivitasError::Validation(
            "feedback rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use civitas_common::{ComplaintCategory, GeoPoint, Severity};

    fn payload() -> NewComplaint {
        NewComplaint {
            category: ComplaintCategory::RoadInfrastructure,
            sub_type: "Pothole / Damaged Road".to_string(),
            description: "large pothole on main road".to_string(),
            address: "MG Road, near metro station".to_string(),
            location: GeoPoint::new(12.9716, 77.5946),
            photo: "uploads/photo-1.jpg".to_string(),
            severity: Severity::default(),
        }
    }

    fn matches_validation(err: &CivitasError, needle: &str) -> bool {
        matches!(err, CivitasError::Validation(msg) if msg.contains(needle))
    }

    // --- create ---

    #[test]
    fn valid_payload_passes() {
        assert!(validate_new_complaint(&payload()).is_ok());
    }

    #[test]
    fn short_description_rejected() {
        let mut p = payload();
        p.description = "too short".to_string();
        let err = validate_new_complaint(&p).unwrap_err();
        assert!(matches_validation(&err, "at least 10 characters"));
    }

    #[test]
    fn missing_photo_rejected() {
        let mut p = payload();
        p.photo = "  ".to_string();
        let err = validate_new_complaint(&p).unwrap_err();
        assert!(matches_validation(&err, "Photo is required"));
    }

    #[test]
    fn out_of_range_coordinates_rejected() {
        let mut p = payload();
        p.location = GeoPoint::new(95.0, 77.5946);
        assert!(validate_new_complaint(&p).is_err());
    }

    #[test]
    fn multiple_problems_are_collected() {
        let mut p = payload();
        p.description = "short".to_string();
        p.address = String::new();
        let err = validate_new_complaint(&p).unwrap_err();
        assert!(matches_validation(&err, "at least 10 characters"));
        assert!(matches_validation(&err, "Address is required"));
    }

    // --- reraise ---

    #[test]
    fn reraise_by_submitter_while_open() {
        let owner = Uuid::new_v4();
        assert!(check_reraise(ComplaintStatus::Pending, owner, owner).is_ok());
        assert!(check_reraise(ComplaintStatus::ProcessOngoing, owner, owner).is_ok());
    }

    #[test]
    fn reraise_by_stranger_is_forbidden() {
        let err = check_reraise(ComplaintStatus::Pending, Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, CivitasError::Forbidden(_)));
    }

    #[test]
    fn reraise_in_terminal_state_is_invalid() {
        let owner = Uuid::new_v4();
        for status in [ComplaintStatus::Resolved, ComplaintStatus::Rejected] {
            let err = check_reraise(status, owner, owner).unwrap_err();
            assert!(matches!(err, CivitasError::InvalidState(_)));
        }
    }

    #[test]
    fn forbidden_wins_over_terminal_state() {
        // A stranger poking a resolved complaint gets Forbidden, not InvalidState.
        let err = check_reraise(ComplaintStatus::Resolved, Uuid::new_v4(), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, CivitasError::Forbidden(_)));
    }

    // --- assign ---

    #[test]
    fn assign_pending_advances_status() {
        let decided = decide_assign(ComplaintStatus::Pending, None, Uuid::new_v4()).unwrap();
        assert_eq!(decided, Some(ComplaintStatus::ProcessOngoing));
    }

    #[test]
    fn assign_ongoing_keeps_status() {
        let decided =
            decide_assign(ComplaintStatus::ProcessOngoing, None, Uuid::new_v4()).unwrap();
        assert_eq!(decided, None);
    }

    #[test]
    fn reassign_same_target_conflicts() {
        let ngo = Uuid::new_v4();
        let err = decide_assign(ComplaintStatus::ProcessOngoing, Some(ngo), ngo).unwrap_err();
        assert!(matches!(err, CivitasError::Conflict(_)));
    }

    #[test]
    fn reassign_different_target_succeeds() {
        let decided =
            decide_assign(ComplaintStatus::ProcessOngoing, Some(Uuid::new_v4()), Uuid::new_v4())
                .unwrap();
        assert_eq!(decided, None);
    }

    // --- resolution update ---

    #[test]
    fn resolution_update_by_assignee_with_note() {
        let ngo = Uuid::new_v4();
        assert!(check_resolution_update(
            ComplaintStatus::ProcessOngoing,
            Some(ngo),
            ngo,
            Some("cleared the blockage"),
            None,
        )
        .is_ok());
    }

    #[test]
    fn resolution_update_with_photo_only() {
        let ngo = Uuid::new_v4();
        assert!(check_resolution_update(
            ComplaintStatus::ProcessOngoing,
            Some(ngo),
            ngo,
            None,
            Some("uploads/after-1.jpg"),
        )
        .is_ok());
    }

    #[test]
    fn resolution_update_by_non_assignee_is_forbidden() {
        let err = check_resolution_update(
            ComplaintStatus::ProcessOngoing,
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            Some("note"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CivitasError::Forbidden(_)));
    }

    #[test]
    fn resolution_update_on_unassigned_is_forbidden() {
        let err = check_resolution_update(
            ComplaintStatus::Pending,
            None,
            Uuid::new_v4(),
            Some("note"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CivitasError::Forbidden(_)));
    }

    #[test]
    fn resolution_update_on_terminal_is_invalid() {
        let ngo = Uuid::new_v4();
        let err = check_resolution_update(
            ComplaintStatus::Resolved,
            Some(ngo),
            ngo,
            Some("note"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CivitasError::InvalidState(_)));
    }

    #[test]
    fn resolution_update_without_payload_is_invalid() {
        let ngo = Uuid::new_v4();
        let err = check_resolution_update(
            ComplaintStatus::ProcessOngoing,
            Some(ngo),
            ngo,
            Some("   "),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CivitasError::Validation(_)));
    }

    // --- status update ---

    #[test]
    fn same_status_empty_note_is_noop() {
        let err = decide_status_update(
            ComplaintStatus::Pending,
            Some(ComplaintStatus::Pending),
            Some("  "),
        )
        .unwrap_err();
        assert!(matches!(err, CivitasError::NoOp));
    }

    #[test]
    fn nothing_requested_is_noop() {
        let err = decide_status_update(ComplaintStatus::Pending, None, None).unwrap_err();
        assert!(matches!(err, CivitasError::NoOp));
    }

    #[test]
    fn status_only_change_appends_entry() {
        let change = decide_status_update(
            ComplaintStatus::ProcessOngoing,
            Some(ComplaintStatus::Rejected),
            None,
        )
        .unwrap();
        assert_eq!(change.status, Some(ComplaintStatus::Rejected));
        assert!(change.entry.contains("Rejected"));
    }

    #[test]
    fn note_with_unchanged_status_keeps_status() {
        let change = decide_status_update(
            ComplaintStatus::Pending,
            Some(ComplaintStatus::Pending),
            Some("inspection scheduled"),
        )
        .unwrap();
        assert_eq!(change.status, None);
        assert_eq!(change.entry, "inspection scheduled");
    }

    #[test]
    fn admin_override_reopens_terminal_state() {
        // The administrator override is unconditional, even out of Resolved.
        let change = decide_status_update(
            ComplaintStatus::Resolved,
            Some(ComplaintStatus::ProcessOngoing),
            None,
        )
        .unwrap();
        assert_eq!(change.status, Some(ComplaintStatus::ProcessOngoing));
    }

    // --- feedback ---

    #[test]
    fn feedback_on_resolved_by_submitter() {
        let owner = Uuid::new_v4();
        assert!(check_feedback(ComplaintStatus::Resolved, owner, owner, false, 4).is_ok());
    }

    #[test]
    fn feedback_before_resolution_is_invalid() {
        let owner = Uuid::new_v4();
        let err =
            check_feedback(ComplaintStatus::ProcessOngoing, owner, owner, false, 4).unwrap_err();
        assert!(matches!(err, CivitasError::InvalidState(_)));
    }

    #[test]
    fn feedback_twice_conflicts() {
        let owner = Uuid::new_v4();
        let err = check_feedback(ComplaintStatus::Resolved, owner, owner, true, 4).unwrap_err();
        assert!(matches!(err, CivitasError::Conflict(_)));
    }

    #[test]
    fn feedback_rating_bounds() {
        let owner = Uuid::new_v4();
        for rating in [0, 6] {
            let err =
                check_feedback(ComplaintStatus::Resolved, owner, owner, false, rating).unwrap_err();
            assert!(matches!(err, CivitasError::Validation(_)));
        }
    }
}
