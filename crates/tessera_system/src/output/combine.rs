//! Joining several Outputs into one.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use variadics_please::all_tuples;

use super::{Output, OutputError};

/// Join of several Outputs into a single Output of all their values.
///
/// Implemented for tuples of 2 to 8 Outputs. The joined Output resolves only
/// after the last input resolves, regardless of arrival order. It fails as
/// soon as any input fails; when several inputs fail, whichever failure is
/// delivered first wins and the order among them is unspecified.
///
/// # Example
///
/// ```
/// use tessera_system::output::{Combine, Output};
///
/// let name: Output<String> = Output::pending();
/// let port: Output<u16> = Output::pending();
/// let endpoint = (name.clone(), port.clone())
///     .combine()
///     .map(|(name, port)| format!("{name}:{port}"));
///
/// port.resolve(6379).unwrap();
/// name.resolve("redis".into()).unwrap();
/// assert_eq!(endpoint.try_get(), Some(Ok("redis:6379".to_string())));
/// ```
pub trait Combine {
    /// The joined value.
    type Value;

    /// Joins the inputs.
    fn combine(self) -> Output<Self::Value>;
}

/// Countdown shared by the continuations of one join.
struct Barrier<V> {
    target: Output<V>,
    remaining: AtomicUsize,
}

impl<V: Clone + Send + 'static> Barrier<V> {
    fn new(target: Output<V>, inputs: usize) -> Arc<Self> {
        Arc::new(Self {
            target,
            remaining: AtomicUsize::new(inputs),
        })
    }

    /// Records one resolved input; the last arrival builds the value.
    fn arrive(&self, finish: impl FnOnce() -> Option<V>) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1
            && let Some(value) = finish()
        {
            self.target.settle_once(Ok(value));
        }
    }

    fn fail(&self, error: &OutputError) {
        self.target.settle_once(Err(error.clone()));
    }
}

pub(super) fn join_all<T: Clone + Send + 'static>(inputs: Vec<Output<T>>) -> Output<Vec<T>> {
    let dependencies: BTreeSet<_> = inputs
        .iter()
        .flat_map(|input| input.dependencies().iter().copied())
        .collect();
    let joined = Output::with_dependencies(dependencies);
    if inputs.is_empty() {
        joined.settle_once(Ok(Vec::new()));
        return joined;
    }

    let barrier = Barrier::new(joined.clone(), inputs.len());
    let slots: Arc<Mutex<Vec<Option<T>>>> = Arc::new(Mutex::new(vec![None; inputs.len()]));

    for (index, input) in inputs.into_iter().enumerate() {
        let barrier = Arc::clone(&barrier);
        let slots = Arc::clone(&slots);
        input.on_settle(move |result| match result {
            Ok(value) => {
                slots.lock()[index] = Some(value.clone());
                barrier.arrive(|| slots.lock().iter_mut().map(Option::take).collect());
            }
            Err(error) => barrier.fail(error),
        });
    }
    joined
}

macro_rules! impl_combine_tuple {
    ($(($T:ident, $t:ident)),*) => {
        impl<$($T: Clone + Send + 'static),*> Combine for ($(Output<$T>,)*) {
            type Value = ($($T,)*);

            fn combine(self) -> Output<Self::Value> {
                let ($($t,)*) = self;

                let mut dependencies = BTreeSet::new();
                $(dependencies.extend($t.dependencies().iter().copied());)*
                let joined = Output::with_dependencies(dependencies);
                let barrier = Barrier::new(joined.clone(), [$(stringify!($t)),*].len());

                $(let $t = ($t, Arc::new(Mutex::new(None::<$T>)));)*
                let finish: Arc<dyn Fn() -> Option<Self::Value> + Send + Sync> = {
                    let slots = ($(Arc::clone(&$t.1),)*);
                    Arc::new(move || {
                        let ($($t,)*) = &slots;
                        Some(($($t.lock().take()?,)*))
                    })
                };

                $(
                    {
                        let (input, slot) = $t;
                        let barrier = Arc::clone(&barrier);
                        let finish = Arc::clone(&finish);
                        input.on_settle(move |result| match result {
                            Ok(value) => {
                                *slot.lock() = Some(value.clone());
                                barrier.arrive(&*finish);
                            }
                            Err(error) => barrier.fail(error),
                        });
                    }
                )*

                joined
            }
        }
    };
}

all_tuples!(impl_combine_tuple, 2, 8, T, t);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputState;

    #[test]
    fn combine_waits_for_every_input() {
        let a = Output::<i32>::pending();
        let b = Output::<String>::pending();
        let c = Output::<bool>::pending();
        let joined = (a.clone(), b.clone(), c.clone()).combine();

        a.resolve(1).unwrap();
        c.resolve(true).unwrap();
        assert_eq!(joined.state(), OutputState::Pending);

        b.resolve("two".into()).unwrap();
        assert_eq!(joined.try_get(), Some(Ok((1, "two".to_string(), true))));
    }

    #[test]
    fn combine_resolves_in_either_order() {
        for a_first in [true, false] {
            let a = Output::<i32>::pending();
            let b = Output::<i32>::pending();
            let joined = a.zip(&b);
            if a_first {
                a.resolve(1).unwrap();
                b.resolve(2).unwrap();
            } else {
                b.resolve(2).unwrap();
                a.resolve(1).unwrap();
            }
            assert_eq!(joined.try_get(), Some(Ok((1, 2))));
        }
    }

    #[test]
    fn combine_fails_when_any_input_fails() {
        let a = Output::<i32>::pending();
        let b = Output::<i32>::pending();
        let joined = a.zip(&b);

        let error = OutputError::address_unavailable("ingress list is empty");
        b.fail(error.clone()).unwrap();
        assert_eq!(joined.try_get(), Some(Err(error.clone())));

        a.resolve(1).unwrap();
        assert_eq!(joined.try_get(), Some(Err(error)));
    }

    #[test]
    fn first_failure_wins() {
        let a = Output::<i32>::pending();
        let b = Output::<i32>::pending();
        let joined = a.zip(&b);

        a.fail(OutputError::provisioning("a", "first")).unwrap();
        b.fail(OutputError::provisioning("b", "second")).unwrap();
        assert_eq!(
            joined.try_get(),
            Some(Err(OutputError::provisioning("a", "first")))
        );
    }

    #[test]
    fn combine_of_settled_inputs_settles_immediately() {
        let joined = (Output::resolved(1), Output::resolved('x')).combine();
        assert_eq!(joined.try_get(), Some(Ok((1, 'x'))));
    }

    #[test]
    fn all_preserves_input_order() {
        let inputs: Vec<Output<i32>> = (0..4).map(|_| Output::pending()).collect();
        let joined = Output::all(inputs.clone());

        for (i, input) in inputs.iter().enumerate().rev() {
            input.resolve(i as i32 * 10).unwrap();
        }
        assert_eq!(joined.try_get(), Some(Ok(vec![0, 10, 20, 30])));
    }

    #[test]
    fn all_of_nothing_resolves_empty() {
        let joined = Output::<i32>::all(Vec::new());
        assert_eq!(joined.try_get(), Some(Ok(Vec::new())));
    }

    #[test]
    fn join_unions_dependencies() {
        use crate::resource::ResourceId;

        let a = Output::<i32>::with_dependencies([ResourceId(0)]);
        let b = Output::<i32>::with_dependencies([ResourceId(2)]);
        let joined = a.zip(&b);
        assert!(joined.dependencies().contains(&ResourceId(0)));
        assert!(joined.dependencies().contains(&ResourceId(2)));
    }
}
