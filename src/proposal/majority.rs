//! Pass/fail computation from vote tallies.
//!
//! Integer basis-point arithmetic only: `ratio = numerator * 10000 /
//! denominator`, floored.

use super::view::ProposalView;
use crate::types::QuorumPolicy;

/// 100% in basis points.
pub const BASIS_POINTS: u128 = 10_000;

/// Tally slot of the approving choice.
pub const YES: usize = 0;

/// Tally slot of the rejecting choice.
pub const NO: usize = 1;

/// `numerator * 10000 / denominator`, floored. `None` when the denominator is
/// zero.
pub fn ratio_bp(numerator: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    if let Some(scaled) = numerator.checked_mul(BASIS_POINTS) {
        return Some(scaled / denominator);
    }

    // numerator * 10000 overflows u128: quotient plus four decimal digits of
    // the remainder, each digit found by ten modular additions.
    let quotient = numerator / denominator;
    let mut rem = numerator % denominator;
    let mut fraction = 0u128;
    for _ in 0..4 {
        let mut digit = 0u128;
        let mut acc = 0u128;
        for _ in 0..10 {
            if acc >= denominator - rem {
                acc -= denominator - rem;
                digit += 1;
            } else {
                acc += rem;
            }
        }
        rem = acc;
        fraction = fraction * 10 + digit;
    }
    Some(quotient.saturating_mul(BASIS_POINTS).saturating_add(fraction))
}

/// Whether a tally passes under `policy`.
///
/// Only the YES slot is the numerator. Under relative majority the
/// denominator is the sum of every slot; under absolute majority it is the
/// total supply of the voting token.
pub fn passes(policy: &QuorumPolicy, tally: &[u128], voters: u64, total_supply: u128) -> bool {
    let total_votes = tally.iter().fold(0u128, |acc, v| acc.saturating_add(*v));

    if voters < policy.minimum_voting_participants
        || total_votes < policy.minimum_total_voting_tokens
    {
        return false;
    }

    let yes = tally.get(YES).copied().unwrap_or(0);
    // TODO(open question): choices past NO still count toward the relative
    // denominator. Switch to YES + NO once product decides extra choices are
    // informational only.
    let denominator = if policy.is_relative_majority {
        total_votes
    } else {
        total_supply
    };

    match ratio_bp(yes, denominator) {
        Some(ratio) => ratio >= u128::from(policy.voting_threshold_bp),
        None => false,
    }
}

/// Whether the proposal's tally passes. Always false without a mirrored
/// tally.
pub fn can_execute(view: &ProposalView) -> bool {
    match view.tally() {
        Some(tally) => passes(&view.policy, &tally.scores, tally.voters, view.total_supply),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::view::fixtures::*;
    use super::*;

    fn policy(relative: bool, threshold: u32, participants: u64, tokens: u128) -> QuorumPolicy {
        QuorumPolicy {
            is_relative_majority: relative,
            voting_threshold_bp: threshold,
            minimum_voting_participants: participants,
            minimum_total_voting_tokens: tokens,
        }
    }

    #[test]
    fn test_relative_majority_passes() {
        // 6000 * 10000 / 10000 = 6000 >= 5001
        assert!(passes(&policy(true, 5001, 0, 0), &[6000, 4000], 2, 0));
    }

    #[test]
    fn test_relative_majority_tie_fails() {
        // 5000 < 5001
        assert!(!passes(&policy(true, 5001, 0, 0), &[5000, 5000], 2, 0));
    }

    #[test]
    fn test_zero_denominator_is_false() {
        assert!(!passes(&policy(true, 0, 0, 0), &[0, 0], 0, 0));
        assert!(!passes(&policy(false, 0, 0, 0), &[10, 0], 1, 0));
        assert!(!passes(&policy(true, 0, 0, 0), &[], 0, 0));
    }

    #[test]
    fn test_absolute_majority_uses_supply() {
        // 6000 of 20000 supply = 3000bp
        let p = policy(false, 3000, 0, 0);
        assert!(passes(&p, &[6000, 0], 1, 20_000));
        assert!(!passes(&p, &[5999, 0], 1, 20_000));
    }

    #[test]
    fn test_minimum_participants_gate() {
        let p = policy(true, 5001, 3, 0);
        assert!(!passes(&p, &[100, 0], 2, 0));
        assert!(passes(&p, &[100, 0], 3, 0));
    }

    #[test]
    fn test_minimum_tokens_gate() {
        let p = policy(true, 5001, 0, 1000);
        assert!(!passes(&p, &[600, 399], 5, 0));
        assert!(passes(&p, &[600, 400], 5, 0));
    }

    #[test]
    fn test_extra_choices_count_toward_relative_denominator() {
        // 6000 / (6000 + 2000 + 2000) = 6000bp
        assert!(passes(&policy(true, 6000, 0, 0), &[6000, 2000, 2000], 3, 0));
        assert!(!passes(&policy(true, 6001, 0, 0), &[6000, 2000, 2000], 3, 0));
    }

    #[test]
    fn test_ratio_bp_floors() {
        assert_eq!(ratio_bp(1, 3), Some(3333));
        assert_eq!(ratio_bp(2, 3), Some(6666));
        assert_eq!(ratio_bp(5, 0), None);
    }

    #[test]
    fn test_ratio_bp_huge_values() {
        let big = u128::MAX / 2;
        assert_eq!(ratio_bp(big, big), Some(BASIS_POINTS));
        assert_eq!(ratio_bp(big, big * 2), Some(5000));
    }

    #[test]
    fn test_can_execute_requires_tally() {
        let v = view(relative(1), 0, root(1), None);
        assert!(!can_execute(&v));

        let v = view(relative(5001), 0, root(1), Some(child(1, 10, vec![6000, 4000])));
        assert!(can_execute(&v));
    }
}
