use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use strata::errors::{ErrorKind, StrataError};
use strata::future::{Future, Promise};
use strata_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_promise_completed_from_another_thread() {
    run_test(
        create_test_context,
        |_ctx| {
            let promise = Promise::new();
            let seen = Arc::new(AtomicBool::new(false));
            let seen_clone = seen.clone();
            let future = promise.future().on_success(move |value: &i32| {
                assert_eq!(*value, 42);
                seen_clone.store(true, Ordering::SeqCst);
            });

            let producer = promise.clone();
            let handle = thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                producer.success(42)
            });

            awaitility::at_most(Duration::from_secs(5)).until(|| seen.load(Ordering::SeqCst));
            assert!(handle.join().unwrap());
            assert!(!promise.success(7));
            assert_eq!(future.wait()?, 42);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_chain_across_pool() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let pool = db.pool().clone();
            let result = Future::spawn(db.pool(), || Ok(20))
                .map(|v| v + 1)
                .flat_map(move |v| Future::spawn(&pool, move || Ok(v * 2)))
                .wait()?;
            assert_eq!(result, 42);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sequence_keeps_input_order() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let futures = (0..8u64)
                .map(|i| {
                    Future::spawn(db.pool(), move || {
                        thread::sleep(Duration::from_millis(8 * (8 - i)));
                        Ok(i)
                    })
                })
                .collect();
            let values = Future::sequence(futures).wait()?;
            assert_eq!(values, (0..8).collect::<Vec<_>>());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sequence_reports_earliest_failure() {
    run_test(
        create_test_context,
        |_ctx| {
            let first = Promise::new();
            let second = Promise::new();
            let all = Future::sequence(vec![first.future(), second.future(), Future::successful(3)]);

            second.failure(StrataError::new("second", ErrorKind::NotFound));
            assert!(!all.is_completed());
            first.failure(StrataError::new("first", ErrorKind::InvalidOperation));

            let err = all.wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_first_completed_of_prefers_fastest() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let slow = Future::spawn(db.pool(), || {
                thread::sleep(Duration::from_millis(300));
                Ok("slow")
            });
            let fast = Future::spawn(db.pool(), || Ok("fast"));
            assert_eq!(Future::first_completed_of(vec![slow, fast]).wait()?, "fast");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_and_then_runs_in_order() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let log = Arc::new(Mutex::new(Vec::new()));
            let (a, b, c) = (log.clone(), log.clone(), log.clone());
            let value = Future::spawn(db.pool(), || Ok(1))
                .and_then(move |_| a.lock().push("first"))
                .and_then(move |_| b.lock().push("second"))
                .and_then(move |_| c.lock().push("third"))
                .wait()?;
            assert_eq!(value, 1);
            assert_eq!(*log.lock(), vec!["first", "second", "third"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failure_skips_map_and_recovers() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let mapped = Arc::new(AtomicBool::new(false));
            let mapped_clone = mapped.clone();
            let value = Future::spawn(db.pool(), || -> strata::errors::StrataResult<i32> {
                Err(StrataError::new("boom", ErrorKind::InternalError))
            })
            .map(move |v| {
                mapped_clone.store(true, Ordering::SeqCst);
                v
            })
            .recover(|err| if err.kind() == &ErrorKind::InternalError { -1 } else { 0 })
            .wait()?;
            assert_eq!(value, -1);
            assert!(!mapped.load(Ordering::SeqCst));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_spawn_after_close_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            db.close();
            let err = Future::spawn(db.pool(), || Ok(1)).wait().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreClosed);
            Ok(())
        },
        cleanup,
    )
}
