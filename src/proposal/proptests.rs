//! Property-based tests for state derivation and majority computation
//!
//! Tests for:
//! - Priority order of the state rules
//! - Absence (never zero) of tally fields before sync
//! - Division-by-zero safety and agreement with a reference ratio

use super::majority::{passes, ratio_bp};
use super::state::{map_state, ProposalState};
use super::view::fixtures::{child, metadata, zdao};
use super::view::ProposalView;
use crate::types::{Address, ChildProposalRecord, ProposalId, QuorumPolicy, RootProposalRecord};
use proptest::prelude::*;

fn policy_strategy() -> impl Strategy<Value = QuorumPolicy> {
    (any::<bool>(), 0u32..=10_000, 0u64..5, 0u128..1_000).prop_map(
        |(relative, threshold, participants, tokens)| QuorumPolicy {
            is_relative_majority: relative,
            voting_threshold_bp: threshold,
            minimum_voting_participants: participants,
            minimum_total_voting_tokens: tokens,
        },
    )
}

fn root_strategy() -> impl Strategy<Value = RootProposalRecord> {
    (1u64..50, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(id, canceled, calculated, executed)| RootProposalRecord {
            id: ProposalId(id),
            created_by: Address::from_bytes([7; 20]),
            metadata_ref: "ipfs://QmProp".to_string(),
            created_at: 0,
            canceled,
            calculated,
            executed,
        },
    )
}

fn child_strategy(id: u64) -> impl Strategy<Value = ChildProposalRecord> {
    (
        0u64..1_000,
        prop::collection::vec(0u128..100_000, 0..4),
        0u64..10,
        any::<bool>(),
    )
        .prop_map(move |(end, tally, voters, calculated)| {
            let mut record = child(id, end, tally);
            record.voters = voters;
            record.calculated = calculated;
            record
        })
}

fn synced_view() -> impl Strategy<Value = ProposalView> {
    (policy_strategy(), 0u128..1_000_000, root_strategy()).prop_flat_map(|(policy, supply, root)| {
        child_strategy(root.id.0).prop_map(move |c| {
            ProposalView::merge(&zdao(policy, supply), root.clone(), Some(c), metadata())
        })
    })
}

proptest! {
    /// Property: an unmirrored, uncanceled proposal is Pending with every
    /// tally field absent
    #[test]
    fn unsynced_is_pending_with_absent_fields(
        policy in policy_strategy(),
        mut root in root_strategy(),
        now in any::<u64>(),
        executed in any::<bool>(),
    ) {
        root.canceled = false;
        let view = ProposalView::merge(&zdao(policy, 1_000), root, None, metadata())
            .derive(now, executed);

        prop_assert_eq!(view.state(), ProposalState::Pending);
        prop_assert!(view.scores().is_none());
        prop_assert!(view.voters().is_none());
        prop_assert!(view.start().is_none());
        prop_assert!(view.end().is_none());
        prop_assert!(view.snapshot().is_none());
        prop_assert!(!view.can_execute());
    }

    /// Property: canceled wins regardless of timing or tally
    #[test]
    fn canceled_always_wins(
        mut view in synced_view(),
        now in any::<u64>(),
        executed in any::<bool>(),
    ) {
        view.canceled = true;
        prop_assert_eq!(map_state(&view, now, executed), ProposalState::Canceled);
    }

    /// Property: inside the voting window a live proposal is Active
    #[test]
    fn open_window_is_active(
        mut view in synced_view(),
        executed in any::<bool>(),
    ) {
        view.canceled = false;
        let end = view.end().unwrap_or(0);
        prop_assert_eq!(map_state(&view, end, executed), ProposalState::Active);
    }

    /// Property: same inputs, same state
    #[test]
    fn map_state_is_deterministic(
        view in synced_view(),
        now in any::<u64>(),
        executed in any::<bool>(),
    ) {
        prop_assert_eq!(map_state(&view, now, executed), map_state(&view, now, executed));
    }

    /// Property: after the window closes, the executed flag beats the tally
    #[test]
    fn executed_flag_after_window(mut view in synced_view()) {
        view.canceled = false;
        let after = view.end().unwrap_or(0) + 1;
        prop_assert_eq!(map_state(&view, after, true), ProposalState::Executed);
    }

    /// Property: a zero denominator never passes and never panics
    #[test]
    fn zero_denominator_never_passes(
        mut policy in policy_strategy(),
        voters in any::<u64>(),
        tally_len in 0usize..4,
    ) {
        policy.minimum_voting_participants = 0;
        policy.minimum_total_voting_tokens = 0;
        let zeros = vec![0u128; tally_len];

        policy.is_relative_majority = true;
        prop_assert!(!passes(&policy, &zeros, voters, 0));

        policy.is_relative_majority = false;
        prop_assert!(!passes(&policy, &[5, 5], voters, 0));
    }

    /// Property: relative majority agrees with the direct basis-point formula
    #[test]
    fn relative_majority_matches_reference(
        yes in 0u128..1_000_000,
        no in 0u128..1_000_000,
        threshold in 0u32..=10_000,
    ) {
        let policy = QuorumPolicy {
            is_relative_majority: true,
            voting_threshold_bp: threshold,
            minimum_voting_participants: 0,
            minimum_total_voting_tokens: 0,
        };
        let sum = yes + no;
        let expected = sum != 0 && yes * 10_000 / sum >= u128::from(threshold);
        prop_assert_eq!(passes(&policy, &[yes, no], 2, 0), expected);
    }

    /// Property: the overflow-safe ratio equals plain division when both fit
    #[test]
    fn ratio_matches_plain_division(n in any::<u64>(), d in 1u64..) {
        let plain = u128::from(n) * 10_000 / u128::from(d);
        prop_assert_eq!(ratio_bp(u128::from(n), u128::from(d)), Some(plain));
    }

    /// Property: the overflow path agrees with scaling both sides down
    #[test]
    fn ratio_overflow_path_is_exact(k in 1u128..1_000, d in 1u128..1_000) {
        let scale = u128::MAX / 2_000;
        let expected = k * 10_000 / d;
        prop_assert_eq!(ratio_bp(k * scale, d * scale), Some(expected));
    }
}
