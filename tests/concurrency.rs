mod support;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use todo_store::task::{NewTask, Status};

use support::TestDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 10;

#[test]
fn concurrent_creates_get_distinct_ids() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    let store = Arc::new(dir.open()?);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|n| {
                        store
                            .create(NewTask::new(format!("worker {worker} task {n}")))
                            .map(|task| task.id)
                    })
                    .collect::<todo_store::Result<Vec<u64>>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for id in handle.join().expect("worker panicked")? {
            assert!(ids.insert(id), "id {id} handed out twice");
        }
    }

    let total = (THREADS * PER_THREAD) as u64;
    assert_eq!(ids, (1..=total).collect::<HashSet<_>>());

    drop(store);
    let reopened = dir.open()?;
    assert_eq!(reopened.len()?, THREADS * PER_THREAD);
    assert_eq!(dir.read_primary()?["last_id"], total);
    Ok(())
}

#[test]
fn concurrent_transitions_and_reads_stay_consistent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    let store = Arc::new(dir.open()?);
    for n in 0..THREADS {
        store.create(NewTask::new(format!("task {n}")))?;
    }
    let barrier = Arc::new(Barrier::new(THREADS * 2));

    let mut handles = Vec::new();
    for id in 1..=THREADS as u64 {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || -> todo_store::Result<()> {
            barrier.wait();
            store.complete(id)?;
            Ok(())
        }));
    }
    for _ in 0..THREADS {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || -> todo_store::Result<()> {
            barrier.wait();
            let stats = store.stats()?;
            assert_eq!(stats.total, THREADS);
            assert_eq!(stats.pending + stats.completed, THREADS);
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    let stats = store.stats()?;
    assert_eq!(stats.completed, THREADS);
    for task in store.list(&Default::default())? {
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.completed_at, Some(task.updated_at));
    }
    assert!(store.health_check().ok);
    Ok(())
}

#[test]
fn health_checks_during_writes_always_see_one_generation() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new()?;
    let store = Arc::new(dir.open()?);
    let barrier = Arc::new(Barrier::new(THREADS * 2));

    let mut writers = Vec::new();
    let mut checkers = Vec::new();
    for worker in 0..THREADS {
        {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            writers.push(thread::spawn(move || -> todo_store::Result<()> {
                barrier.wait();
                for n in 0..PER_THREAD {
                    store.create(NewTask::new(format!("worker {worker} task {n}")))?;
                }
                Ok(())
            }));
        }

        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        checkers.push(thread::spawn(move || {
            barrier.wait();
            (0..PER_THREAD)
                .map(|_| store.health_check())
                .filter(|report| !report.ok)
                .map(|report| report.details.issues)
                .collect::<Vec<_>>()
        }));
    }

    for handle in writers {
        handle.join().expect("writer panicked")?;
    }
    for handle in checkers {
        let failures = handle.join().expect("checker panicked");
        assert!(failures.is_empty(), "{failures:?}");
    }
    assert_eq!(store.len()?, THREADS * PER_THREAD);
    Ok(())
}
