//! Encrypted model aggregation across reveal epochs.

mod common;

use common::{assert_dao_err, TestContext};
use fhe_data_dao::{DaoError, RequestTarget};
use proptest::prelude::*;

fn reveal_current_epoch(ctx: &mut TestContext) -> (u64, u64) {
    let ix = ctx.as_user(1);
    let request_id = ctx.dao.request_aggregate_reveal(&ix).unwrap();
    let target = ctx.deliver(request_id).unwrap();
    let RequestTarget::Aggregate { epoch } = target else {
        panic!("unexpected target {:?}", target);
    };
    (epoch, ctx.dao.epoch(epoch).unwrap().revealed.unwrap())
}

#[test]
fn test_reveal_before_any_contribution_rejected() {
    let mut ctx = TestContext::new();
    let ix = ctx.as_user(1);
    assert_dao_err(
        ctx.dao.request_aggregate_reveal(&ix),
        DaoError::ModelNotInitialized,
    );
    assert!(!ctx.dao.model().initialized);
}

#[test]
fn test_contributions_sum_into_reveal() {
    let mut ctx = TestContext::new();
    ctx.contribute(1, 5);
    ctx.contribute(2, 7);
    ctx.contribute(3, 30);

    let (epoch, total) = reveal_current_epoch(&mut ctx);
    assert_eq!((epoch, total), (1, 42));
    assert_eq!(ctx.dao.model().last_revealed, Some(42));
    assert_eq!(ctx.dao.epoch(1).unwrap().contributions, 3);
}

#[test]
fn test_contribution_during_reveal_lands_in_next_epoch() {
    let mut ctx = TestContext::new();
    ctx.contribute(1, 10);
    let ix = ctx.as_user(1);
    let request_id = ctx.dao.request_aggregate_reveal(&ix).unwrap();

    // Arrives while the oracle is still working on epoch 1.
    assert_eq!(ctx.contribute(2, 3), 2);
    assert_eq!(ctx.dao.model().epoch, 2);

    ctx.deliver(request_id).unwrap();
    assert_eq!(ctx.dao.epoch(1).unwrap().revealed, Some(10));

    let (epoch, total) = reveal_current_epoch(&mut ctx);
    assert_eq!((epoch, total), (2, 3));
    let sealed: Vec<(u64, Option<u64>)> = ctx
        .dao
        .epochs()
        .map(|snapshot| (snapshot.epoch, snapshot.revealed))
        .collect();
    assert_eq!(sealed, vec![(1, Some(10)), (2, Some(3))]);
    assert_eq!(ctx.dao.stats(ctx.now).contributions, 2);
    assert_eq!(ctx.dao.stats(ctx.now).current_epoch, 3);
}

#[test]
fn test_sealed_epoch_cannot_be_revealed_again() {
    let mut ctx = TestContext::new();
    ctx.contribute(1, 4);
    let (_, total) = reveal_current_epoch(&mut ctx);
    assert_eq!(total, 4);

    // The fresh epoch has nothing in it yet.
    let ix = ctx.as_user(1);
    assert_dao_err(
        ctx.dao.request_aggregate_reveal(&ix),
        DaoError::ModelNotInitialized,
    );
}

#[test]
fn test_replayed_aggregate_callback_rejected() {
    let mut ctx = TestContext::new();
    ctx.contribute(1, 6);
    let ix = ctx.as_user(1);
    let request_id = ctx.dao.request_aggregate_reveal(&ix).unwrap();
    ctx.deliver(request_id).unwrap();
    ctx.contribute(2, 100);
    let events = ctx.dao.events().len();

    assert_dao_err(ctx.deliver(request_id), DaoError::AlreadyConsumed);
    assert_eq!(ctx.dao.epoch(1).unwrap().revealed, Some(6));
    assert_eq!(ctx.dao.model().last_revealed, Some(6));
    assert_eq!(ctx.dao.events().len(), events);
}

#[test]
fn test_aggregate_rejects_text_cleartext() {
    let mut ctx = TestContext::new();
    ctx.contribute(1, 4);
    let ix = ctx.as_user(1);
    let request_id = ctx.dao.request_aggregate_reveal(&ix).unwrap();

    assert_dao_err(
        ctx.deliver_signed(request_id, b"four"),
        DaoError::MalformedCleartext,
    );
    assert_eq!(ctx.dao.epoch(1).unwrap().revealed, None);
}

#[test]
fn test_text_contribution_rejected_without_side_effects() {
    let mut ctx = TestContext::new();
    ctx.contribute(1, 4);
    let text = ctx.dao.engine_mut().encrypt_text("not a number");
    let ix = ctx.as_user(2);

    assert_dao_err(ctx.dao.contribute(&ix, text), DaoError::CiphertextRejected);
    assert_eq!(ctx.dao.model().contributions, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_revealed_sum_is_order_independent(
        values in prop::collection::vec(0u64..1_000_000, 1..12)
    ) {
        let mut forward = TestContext::new();
        let mut backward = TestContext::new();
        for (i, value) in values.iter().enumerate() {
            forward.contribute(i as u8, *value);
        }
        for (i, value) in values.iter().rev().enumerate() {
            backward.contribute(i as u8, *value);
        }

        let expected: u64 = values.iter().sum();
        prop_assert_eq!(reveal_current_epoch(&mut forward).1, expected);
        prop_assert_eq!(reveal_current_epoch(&mut backward).1, expected);
    }
}
