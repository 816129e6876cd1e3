//! Settlement-order tests for Output joins.
//!
//! Joins must produce the same result whatever order their inputs settle in.
//! The property tests below settle inputs in a randomly permuted order and
//! compare against the value computed directly from the inputs.

use tessera_system::output::{Combine, Output, OutputError, OutputState};

#[test]
fn tuple_join_waits_for_every_input() {
    let host: Output<String> = Output::pending();
    let port: Output<u16> = Output::pending();
    let tls = Output::resolved(false);

    let url = (host.clone(), port.clone(), tls)
        .combine()
        .map(|(host, port, tls)| {
            let scheme = if tls { "rediss" } else { "redis" };
            format!("{scheme}://{host}:{port}")
        });

    port.resolve(6379).unwrap();
    assert_eq!(url.state(), OutputState::Pending);

    host.resolve("cache.internal".into()).unwrap();
    assert_eq!(url.try_get(), Some(Ok("redis://cache.internal:6379".into())));
}

#[test]
fn eight_way_join() {
    let outputs: Vec<Output<u8>> = (0..8).map(|_| Output::pending()).collect();
    let joined = (
        outputs[0].clone(),
        outputs[1].clone(),
        outputs[2].clone(),
        outputs[3].clone(),
        outputs[4].clone(),
        outputs[5].clone(),
        outputs[6].clone(),
        outputs[7].clone(),
    )
        .combine()
        .map(|(a, b, c, d, e, f, g, h)| [a, b, c, d, e, f, g, h].iter().map(|&v| u32::from(v)).sum::<u32>());

    for (i, output) in outputs.iter().enumerate().rev() {
        assert_eq!(joined.state(), OutputState::Pending);
        output.resolve(i as u8).unwrap();
    }
    assert_eq!(joined.try_get(), Some(Ok(28)));
}

#[tokio::test]
async fn awaiting_a_join() {
    let a: Output<u32> = Output::pending();
    let b: Output<u32> = Output::pending();
    let sum = a.zip(&b).map(|(a, b)| a + b);

    let waiter = tokio::spawn(sum.into_future());
    a.resolve(40).unwrap();
    b.resolve(2).unwrap();

    assert_eq!(waiter.await.unwrap(), Ok(42));
}

#[tokio::test]
async fn dropped_output_is_abandoned() {
    let never: Output<u32> = Output::pending();
    let future = never.map(|n| n + 1).into_future();
    drop(never);
    assert_eq!(future.await, Err(OutputError::Abandoned));
}

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    /// Values paired with a permutation of their indices, the order in which
    /// they are settled.
    fn values_and_order() -> impl Strategy<Value = (Vec<u32>, Vec<usize>)> {
        prop::collection::vec(any::<u32>(), 0..12).prop_flat_map(|values| {
            let order: Vec<usize> = (0..values.len()).collect();
            (Just(values), Just(order).prop_shuffle())
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// `all` preserves input order regardless of settlement order.
        #[test]
        fn prop_all_preserves_input_order((values, order) in values_and_order()) {
            let outputs: Vec<Output<u32>> = values.iter().map(|_| Output::pending()).collect();
            let joined = Output::all(outputs.clone());

            for &index in &order {
                prop_assert_eq!(joined.state(), OutputState::Pending);
                outputs[index].resolve(values[index]).unwrap();
            }

            prop_assert_eq!(joined.try_get(), Some(Ok(values)));
        }

        /// The first input to fail decides the join's error; later failures
        /// and resolutions are ignored.
        #[test]
        fn prop_first_failure_wins(
            (values, order) in values_and_order(),
            failing in prop::collection::vec(any::<bool>(), 12),
        ) {
            let outputs: Vec<Output<u32>> = values.iter().map(|_| Output::pending()).collect();
            let joined = Output::all(outputs.clone());

            let mut first_failure = None;
            for &index in &order {
                if failing[index] {
                    let error = OutputError::provisioning(format!("input-{index}"), "failed");
                    first_failure.get_or_insert_with(|| error.clone());
                    outputs[index].fail(error).unwrap();
                } else {
                    outputs[index].resolve(values[index]).unwrap();
                }
            }

            match first_failure {
                Some(error) => prop_assert_eq!(joined.try_get(), Some(Err(error))),
                None => prop_assert_eq!(joined.try_get(), Some(Ok(values))),
            }
        }

        /// Mapping before or after a join gives the same value.
        #[test]
        fn prop_map_commutes_with_zip(a in any::<u16>(), b in any::<u16>(), a_first in any::<bool>()) {
            let left: Output<u16> = Output::pending();
            let right: Output<u16> = Output::pending();

            let mapped_then_zipped = left.map(u32::from).zip(&right.map(u32::from)).map(|(x, y)| x + y);
            let zipped_then_mapped = left.zip(&right).map(|(x, y)| u32::from(x) + u32::from(y));

            if a_first {
                left.resolve(a).unwrap();
                right.resolve(b).unwrap();
            } else {
                right.resolve(b).unwrap();
                left.resolve(a).unwrap();
            }

            prop_assert_eq!(mapped_then_zipped.try_get(), zipped_then_mapped.try_get());
            prop_assert_eq!(zipped_then_mapped.try_get(), Some(Ok(u32::from(a) + u32::from(b))));
        }
    }
}
