
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::time::timeout;
use txmq::{DrainHandle, KeyedQueue, QueueOptions, SerialQueue};

fn no_pacing() -> QueueOptions {
    QueueOptions {
        pacing: Duration::ZERO,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn operations_start_in_submission_order() {
    fixtures::init_tracing();

    let queue = SerialQueue::with_options(no_pacing()).arc();
    let started = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..20usize {
        let started = started.clone();
        handles.push(queue.enqueue(move || async move {
            started.lock().unwrap().push(i);
            // Yield mid-operation so any ordering bug would surface.
            tokio::task::yield_now().await;
            i
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.wait().await.unwrap(), i);
    }

    let order = started.lock().unwrap().clone();
    assert_eq!(order, (0..20).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_operation_does_not_stop_the_queue() {
    fixtures::init_tracing();

    let queue = SerialQueue::with_options(no_pacing()).arc();

    let first = queue.enqueue(|| async { Ok::<_, String>("first") });
    let second = queue.enqueue(|| async { Err::<&str, _>("nonce too low".to_string()) });
    let third = queue.enqueue(|| async { Ok::<_, String>("third") });

    assert_eq!(first.wait().await.unwrap(), Ok("first"));
    assert_eq!(
        second.wait().await.unwrap(),
        Err("nonce too low".to_string())
    );
    assert_eq!(
        third.wait().await.unwrap(),
        Ok("third"),
        "a failure must be delivered only to its own caller"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_operation_does_not_wedge_the_queue() {
    fixtures::init_tracing();

    let queue = SerialQueue::with_options(no_pacing()).arc();

    let boom = queue.enqueue(|| async { panic!("nonce bookkeeping bug") });
    let after = queue.enqueue(|| async { "still alive" });

    let lost = timeout(Duration::from_secs(2), boom.wait())
        .await
        .expect("panicked operation's handle must still settle");
    assert!(matches!(lost, Err(txmq::TxmqError::WorkerLost)));

    let after = timeout(Duration::from_secs(2), after.wait())
        .await
        .expect("worker must survive a panicking operation");
    assert_eq!(after.unwrap(), "still alive");

    queue.drain().await;
    assert!(queue.is_idle());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pacing_separates_consecutive_operations() {
    fixtures::init_tracing();

    let queue = SerialQueue::with_options(QueueOptions {
        pacing: Duration::from_millis(50),
    })
    .arc();
    let starts = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let starts = starts.clone();
        handles.push(queue.enqueue(move || async move {
            starts.lock().unwrap().push(Instant::now());
        }));
    }
    for handle in handles {
        handle.wait().await.unwrap();
    }

    let starts = starts.lock().unwrap();
    assert!(
        starts[2] - starts[0] >= Duration::from_millis(100),
        "worker must sleep the pacing delay between items"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_restarts_after_going_idle() {
    fixtures::init_tracing();

    let queue = SerialQueue::with_options(no_pacing()).arc();

    assert_eq!(queue.enqueue(|| async { 1 }).wait().await.unwrap(), 1);
    queue.drain().await;
    assert!(queue.is_idle());
    assert_eq!(queue.pending_count(), 0);

    assert_eq!(queue.enqueue(|| async { 2 }).wait().await.unwrap(), 2);
    queue.drain().await;
    assert!(queue.is_idle());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn drain_handle_waits_for_all_queues() {
    fixtures::init_tracing();

    let serial = SerialQueue::with_options(no_pacing()).arc();
    let keyed = KeyedQueue::with_options(no_pacing()).arc();

    for i in 0..10u64 {
        drop(serial.enqueue(move || async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            i
        }));
        drop(keyed.enqueue(i % 3, move || async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }));
    }

    let mut shutdown = DrainHandle::new();
    shutdown.add(serial.drain());
    shutdown.add(keyed.drain());
    assert_eq!(shutdown.queue_count(), 2);

    timeout(Duration::from_secs(5), shutdown.drain())
        .await
        .expect("queues did not drain");

    assert!(serial.is_idle());
    assert_eq!(keyed.active_keys(), 0);
}
