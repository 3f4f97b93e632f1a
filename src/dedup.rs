//! "Last seen" dedup tracking over [`PollState`].

use crate::domain::{Issue, PollState};

/// An issue is new iff its id is above everything already notified.
pub fn is_new(issue: &Issue, state: &PollState) -> bool {
    issue.id > state.last_seen_id
}

/// Record a dispatched issue.
///
/// The issues endpoint orders by creation time, not by id, so this takes the
/// max instead of assigning: assigning could move `last_seen_id` backwards
/// and re-notify an issue on the next poll.
pub fn advance(issue: &Issue, state: &mut PollState) {
    state.last_seen_id = state.last_seen_id.max(issue.id);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::id::{IssueId, IssueNumber};

    fn issue(id: u64) -> Issue {
        Issue {
            id: IssueId::new(id),
            number: IssueNumber::new(id),
            title: "title".into(),
            created_at: Utc::now(),
            html_url: "https://github.com/octo/repo/issues/1".into(),
            state: Default::default(),
            pull_request: None,
        }
    }

    #[test]
    fn new_only_above_last_seen() {
        let state = PollState { last_seen_id: IssueId::new(60), ..Default::default() };
        assert!(is_new(&issue(61), &state));
        assert!(!is_new(&issue(60), &state));
        assert!(!is_new(&issue(59), &state));
    }

    /// Check-then-advance over a batch, the way a poll cycle walks it.
    fn walk(ids: &[u64], state: &mut PollState) -> Vec<u64> {
        let mut accepted = Vec::new();
        for issue in ids.iter().copied().map(issue) {
            if is_new(&issue, state) {
                accepted.push(issue.id.value());
                advance(&issue, state);
            }
        }
        accepted
    }

    #[test]
    fn unordered_batch_skips_ids_below_the_running_max() {
        let mut state = PollState::default();
        assert_eq!(walk(&[50, 70, 60], &mut state), [50, 70]);
        assert_eq!(state.last_seen_id, IssueId::new(70));
    }

    #[test]
    fn seen_ids_are_dropped_and_order_kept() {
        let mut state = PollState { last_seen_id: IssueId::new(55), ..Default::default() };
        assert_eq!(walk(&[50, 60, 55, 70], &mut state), [60, 70]);
        assert_eq!(walk(&[70, 60], &mut state), Vec::<u64>::new());
    }

    #[test]
    fn advance_never_regresses() {
        let mut state = PollState { last_seen_id: IssueId::new(100), ..Default::default() };
        advance(&issue(10), &mut state);
        assert_eq!(state.last_seen_id, IssueId::new(100));
    }
}
