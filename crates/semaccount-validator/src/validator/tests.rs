use super::*;
use crate::accumulator::DEFAULT_ROOT_HISTORY_SIZE;
use rand::rngs::OsRng;
use semaccount_crypto::{Identity, MembershipKeys, PackedProof, PublicInputs};
use semaccount_types::{Address, NullifierHash, Root, U256};
use std::sync::OnceLock;

const SCENARIO_DEPTH: usize = 20;
const SMALL_DEPTH: usize = 3;

fn scenario_keys() -> &'static MembershipKeys {
    static KEYS: OnceLock<MembershipKeys> = OnceLock::new();
    KEYS.get_or_init(|| MembershipKeys::setup(SCENARIO_DEPTH, &mut OsRng).unwrap())
}

fn small_keys() -> &'static MembershipKeys {
    static KEYS: OnceLock<MembershipKeys> = OnceLock::new();
    KEYS.get_or_init(|| MembershipKeys::setup(SMALL_DEPTH, &mut OsRng).unwrap())
}

struct AcceptAll;

impl ProofVerifier for AcceptAll {
    fn verify(&self, _proof: &PackedProof, _inputs: &PublicInputs) -> bool {
        true
    }
}

fn domain() -> DomainContext {
    DomainContext::new(Address::repeat_byte(0xe4), 31337)
}

fn operation(nonce: u64) -> UserOperation {
    let mut op = UserOperation::new(Address::repeat_byte(0xac), U256::from(nonce));
    op.call_gas_limit = U256::from(200_000u64);
    op.verification_gas_limit = U256::from(100_000u64);
    op.pre_verification_gas = U256::from(21_000u64);
    op.max_fee_per_gas = U256::from(3_000_000_000u64);
    op.max_priority_fee_per_gas = U256::from(1_000_000_000u64);
    op
}

async fn groth16_setup(keys: &'static MembershipKeys, scope: ScopeId) -> (Validator, Identity) {
    let registry = Arc::new(ScopeRegistry::default());
    registry.create_scope(scope, keys.depth()).await.unwrap();

    let identity = Identity::random(&mut OsRng);
    registry
        .insert_member(&scope, identity.commitment())
        .await
        .unwrap();

    let validator = Validator::new(registry, Arc::new(keys.verifier().unwrap()));
    (validator, identity)
}

async fn prove(
    validator: &Validator,
    keys: &MembershipKeys,
    identity: &Identity,
    scope: ScopeId,
    op: &UserOperation,
) -> ProofEnvelope {
    let path = validator
        .registry()
        .membership_path(&scope, &identity.commitment())
        .await
        .unwrap()
        .unwrap();
    keys.prove(identity, &path, &scope, operation_signal(op, &domain()), &mut OsRng)
        .unwrap()
}

/// Validator with a verifier that accepts everything, for the state checks
/// that do not depend on the proof itself.
async fn stub_setup(scope: ScopeId, history: usize) -> (Validator, Root) {
    let registry = Arc::new(ScopeRegistry::new(history));
    registry.create_scope(scope, 8).await.unwrap();
    let root = registry
        .insert_member(&scope, Identity::from_seed(b"stub member").commitment())
        .await
        .unwrap()
        .root;
    (Validator::new(registry, Arc::new(AcceptAll)), root)
}

fn stub_envelope(scope: ScopeId, root: Root, nullifier: u8) -> ProofEnvelope {
    ProofEnvelope {
        depth: 8,
        root,
        nullifier_hash: NullifierHash::from_bytes([nullifier; 32]),
        signal_hash: Default::default(),
        scope,
        proof: PackedProof::default(),
    }
}

#[tokio::test]
async fn test_scenario_accept_then_replay() {
    let keys = scenario_keys();
    let scope = ScopeId::from_u64(2023);
    let (validator, identity) = groth16_setup(keys, scope).await;

    let op_a = operation(1);
    let p1 = prove(&validator, keys, &identity, scope, &op_a).await;
    assert!(validator.registry().is_known_root(&scope, &p1.root).await);

    let first = validator.validate(&op_a, &p1, &domain()).await.unwrap();
    assert_eq!(first, ValidationOutcome::Accepted);
    assert_eq!(first.validation_data(), 0);

    // Same operation resubmitted: signature bytes are not hashed.
    let resubmitted = op_a.clone().with_signature(p1.to_abi_bytes());
    let replay = validator.validate_user_op(&resubmitted, &domain()).await.unwrap();
    assert_eq!(replay, ValidationOutcome::Rejected(RejectReason::NullifierReused));
    assert_eq!(replay.validation_data(), 1);

    // A fresh, valid proof by the same identity in the same scope carries the
    // same nullifier hash, so it reaches the ledger check and is refused there.
    let op_b = operation(2);
    let p1_again = prove(&validator, keys, &identity, scope, &op_b).await;
    assert_eq!(p1_again.nullifier_hash, p1.nullifier_hash);
    let trace = validator.validate_traced(&op_b, &p1_again, &domain()).await.unwrap();
    assert_eq!(
        trace.states,
        vec![
            ValidationState::Received,
            ValidationState::RootChecked,
            ValidationState::ProofChecked,
            ValidationState::Rejected(RejectReason::NullifierReused),
        ]
    );

    // The old proof attached to a different operation no longer matches the signal.
    let other = validator.validate(&op_b, &p1, &domain()).await.unwrap();
    assert_eq!(other, ValidationOutcome::Rejected(RejectReason::InvalidProof));
}

#[tokio::test]
async fn test_scenario_signal_mismatch() {
    let keys = scenario_keys();
    let scope = ScopeId::from_u64(2023);
    let (validator, identity) = groth16_setup(keys, scope).await;

    let op_a = operation(1);
    let op_b = operation(2);
    let p2 = prove(&validator, keys, &identity, scope, &op_b).await;

    let trace = validator.validate_traced(&op_a, &p2, &domain()).await.unwrap();
    assert_eq!(
        trace.states,
        vec![
            ValidationState::Received,
            ValidationState::RootChecked,
            ValidationState::Rejected(RejectReason::InvalidProof),
        ]
    );
    assert!(trace.state().is_terminal());

    // Rejection left the nullifier unused: the right operation still passes.
    let outcome = validator.validate(&op_b, &p2, &domain()).await.unwrap();
    assert_eq!(outcome, ValidationOutcome::Accepted);
}

#[tokio::test]
async fn test_claimed_signal_is_ignored() {
    let keys = small_keys();
    let scope = ScopeId::from_u64(11);
    let (validator, identity) = groth16_setup(keys, scope).await;

    let op = operation(1);
    let mut envelope = prove(&validator, keys, &identity, scope, &op).await;
    envelope.signal_hash = Default::default();

    let outcome = validator.validate(&op, &envelope, &domain()).await.unwrap();
    assert!(outcome.is_accepted());
}

#[tokio::test]
async fn test_wrong_domain_is_invalid_proof() {
    let keys = small_keys();
    let scope = ScopeId::from_u64(12);
    let (validator, identity) = groth16_setup(keys, scope).await;

    let op = operation(1);
    let envelope = prove(&validator, keys, &identity, scope, &op).await;
    let other_chain = DomainContext::new(domain().entry_point, 1);

    let outcome = validator.validate(&op, &envelope, &other_chain).await.unwrap();
    assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::InvalidProof));
}

#[tokio::test]
async fn test_stale_root_within_history_accepted() {
    let keys = small_keys();
    let scope = ScopeId::from_u64(13);
    let (validator, identity) = groth16_setup(keys, scope).await;

    let op = operation(1);
    let envelope = prove(&validator, keys, &identity, scope, &op).await;

    validator
        .registry()
        .insert_member(&scope, Identity::from_seed(b"late joiner").commitment())
        .await
        .unwrap();
    assert_ne!(validator.registry().current_root(&scope).await.unwrap(), envelope.root);

    let outcome = validator.validate(&op, &envelope, &domain()).await.unwrap();
    assert!(outcome.is_accepted());
}

#[tokio::test]
async fn test_compact_signature() {
    let keys = small_keys();
    let scope = ScopeId::from_u64(2023);
    let (validator, identity) = groth16_setup(keys, scope).await;

    let op = operation(1);
    let envelope = prove(&validator, keys, &identity, scope, &op).await;
    let signed = op.with_signature(envelope.to_compact_bytes());

    let outcome = validator
        .validate_compact_user_op(&signed, &scope, &domain())
        .await
        .unwrap();
    assert!(outcome.is_accepted());

    let replay = validator
        .validate_compact_user_op(&signed, &scope, &domain())
        .await
        .unwrap();
    assert_eq!(replay, ValidationOutcome::Rejected(RejectReason::NullifierReused));

    let unknown = validator
        .validate_compact_user_op(&signed, &ScopeId::from_u64(1), &domain())
        .await
        .unwrap();
    assert_eq!(unknown, ValidationOutcome::Rejected(RejectReason::UnknownRoot));
}

#[tokio::test]
async fn test_unknown_root() {
    let scope = ScopeId::from_u64(2023);
    let (validator, root) = stub_setup(scope, DEFAULT_ROOT_HISTORY_SIZE).await;
    let op = operation(1);

    let never_produced = stub_envelope(scope, Root::from_bytes([9; 32]), 1);
    let trace = validator
        .validate_traced(&op, &never_produced, &domain())
        .await
        .unwrap();
    assert_eq!(
        trace.states,
        vec![
            ValidationState::Received,
            ValidationState::Rejected(RejectReason::UnknownRoot),
        ]
    );

    let unknown_scope = stub_envelope(ScopeId::from_u64(1), root, 1);
    let outcome = validator.validate(&op, &unknown_scope, &domain()).await.unwrap();
    assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::UnknownRoot));

    assert!(!validator
        .registry()
        .is_nullifier_used(&scope, &NullifierHash::from_bytes([1; 32]))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_empty_scope_root_unknown() {
    let registry = Arc::new(ScopeRegistry::default());
    let scope = ScopeId::from_u64(4);
    registry.create_scope(scope, 8).await.unwrap();
    let empty_root = registry.current_root(&scope).await.unwrap();
    let validator = Validator::new(registry, Arc::new(AcceptAll));

    let outcome = validator
        .validate(&operation(1), &stub_envelope(scope, empty_root, 1), &domain())
        .await
        .unwrap();
    assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::UnknownRoot));
}

#[tokio::test]
async fn test_aged_out_root() {
    let scope = ScopeId::from_u64(2023);
    let (validator, first_root) = stub_setup(scope, 2).await;
    let registry = validator.registry().clone();

    let second_root = registry
        .insert_member(&scope, Identity::from_seed(b"two").commitment())
        .await
        .unwrap()
        .root;
    let op = operation(1);

    assert!(validator
        .validate(&op, &stub_envelope(scope, first_root, 1), &domain())
        .await
        .unwrap()
        .is_accepted());

    registry
        .insert_member(&scope, Identity::from_seed(b"three").commitment())
        .await
        .unwrap();

    let outcome = validator
        .validate(&op, &stub_envelope(scope, first_root, 2), &domain())
        .await
        .unwrap();
    assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::UnknownRoot));

    assert!(validator
        .validate(&op, &stub_envelope(scope, second_root, 3), &domain())
        .await
        .unwrap()
        .is_accepted());
}

#[tokio::test]
async fn test_declared_depth_must_match_scope() {
    let scope = ScopeId::from_u64(2023);
    let (validator, root) = stub_setup(scope, DEFAULT_ROOT_HISTORY_SIZE).await;

    let mut envelope = stub_envelope(scope, root, 1);
    envelope.depth = 20;

    let outcome = validator.validate(&operation(1), &envelope, &domain()).await.unwrap();
    assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::InvalidProof));
}

#[tokio::test]
async fn test_malformed_signatures_are_invalid_proofs() {
    let keys = small_keys();
    let scope = ScopeId::from_u64(14);
    let (validator, identity) = groth16_setup(keys, scope).await;
    let op = operation(1);
    let envelope = prove(&validator, keys, &identity, scope, &op).await;

    let short = op.clone().with_signature(vec![0u8; 100]);
    let empty = op.clone();

    let mut out_of_range = envelope.clone();
    out_of_range.proof.0[0] = [0xff; 32];
    let out_of_range = op.clone().with_signature(out_of_range.to_abi_bytes());

    let mut off_curve = envelope.clone();
    off_curve.proof.0[1][31] ^= 1;
    let off_curve = op.clone().with_signature(off_curve.to_abi_bytes());

    for signed in [short, empty, out_of_range, off_curve] {
        let outcome = validator.validate_user_op(&signed, &domain()).await.unwrap();
        assert_eq!(outcome, ValidationOutcome::Rejected(RejectReason::InvalidProof));
    }

    // None of the rejections consumed the nullifier.
    let valid = op.with_signature(envelope.to_abi_bytes());
    assert!(validator
        .validate_user_op(&valid, &domain())
        .await
        .unwrap()
        .is_accepted());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_nullifier_single_accept() {
    let scope = ScopeId::from_u64(2023);
    let (validator, root) = stub_setup(scope, DEFAULT_ROOT_HISTORY_SIZE).await;
    let validator = Arc::new(validator);
    let envelope = stub_envelope(scope, root, 42);

    let tasks = (0..32u64).map(|nonce| {
        let validator = validator.clone();
        let envelope = envelope.clone();
        tokio::spawn(async move {
            validator
                .validate(&operation(nonce), &envelope, &domain())
                .await
                .unwrap()
        })
    });

    let outcomes: Vec<ValidationOutcome> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect();

    let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
    let reused = outcomes
        .iter()
        .filter(|o| o.reject_reason() == Some(RejectReason::NullifierReused))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(reused, 31);

    let stats = validator.stats();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected_nullifier_reused, 31);
    assert_eq!(stats.total(), 32);
}

#[tokio::test]
async fn test_stats_by_reason() {
    let scope = ScopeId::from_u64(2023);
    let (validator, root) = stub_setup(scope, DEFAULT_ROOT_HISTORY_SIZE).await;
    let op = operation(1);

    validator
        .validate(&op, &stub_envelope(scope, root, 1), &domain())
        .await
        .unwrap();
    validator
        .validate(&op, &stub_envelope(scope, root, 1), &domain())
        .await
        .unwrap();
    validator
        .validate(&op, &stub_envelope(scope, Root::from_bytes([5; 32]), 2), &domain())
        .await
        .unwrap();
    validator
        .validate_user_op(&op.clone().with_signature(vec![1, 2, 3]), &domain())
        .await
        .unwrap();

    assert_eq!(
        validator.stats(),
        StatsSnapshot {
            accepted: 1,
            rejected_unknown_root: 1,
            rejected_invalid_proof: 1,
            rejected_nullifier_reused: 1,
        }
    );
    assert_eq!(validator.stats().rejected(), 3);
}

#[test]
fn test_outcome_json() {
    let accepted = serde_json::to_value(ValidationOutcome::Accepted).unwrap();
    assert_eq!(accepted["status"], "accepted");

    let rejected =
        serde_json::to_value(ValidationOutcome::Rejected(RejectReason::NullifierReused)).unwrap();
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["reason"], "nullifier_reused");
}
