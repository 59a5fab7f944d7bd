use propgraph_algo::par::reduce::{FloatSum, LogicalOr, Max, Sum};
use propgraph_algo::par::{do_all, do_all_mut_steal, do_all_steal, Threads};
use std::sync::atomic::{AtomicUsize, Ordering};

fn touch_counts(run: impl FnOnce(&[AtomicUsize])) -> Vec<usize> {
    let counts: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
    run(&counts);
    counts.iter().map(|c| c.load(Ordering::Relaxed)).collect()
}

#[test]
fn test_do_all_touches_every_element_once() {
    let pool = Threads::NumThreads(4).build();
    let counts = touch_counts(|counts| {
        do_all(&pool, counts.len(), |i| {
            counts[i].fetch_add(1, Ordering::Relaxed);
        })
    });
    assert!(counts.iter().all(|&c| c == 1));
}

#[test]
fn test_do_all_steal_touches_every_element_once() {
    let pool = Threads::NumThreads(4).build();
    let counts = touch_counts(|counts| {
        do_all_steal(&pool, counts.len(), 7, |i| {
            counts[i].fetch_add(1, Ordering::Relaxed);
        })
    });
    assert!(counts.iter().all(|&c| c == 1));
}

#[test]
fn test_do_all_on_degenerate_ranges() {
    // More threads than items, and an empty range.
    let pool = Threads::NumThreads(8).build();
    let touched = AtomicUsize::new(0);
    do_all(&pool, 3, |_| {
        touched.fetch_add(1, Ordering::Relaxed);
    });
    assert_eq!(touched.load(Ordering::Relaxed), 3);

    do_all(&pool, 0, |_| unreachable!());
    do_all_steal(&pool, 0, 16, |_| unreachable!());
}

#[test]
fn test_do_all_mut_steal() {
    let pool = Threads::NumThreads(4).build();
    let mut items: Vec<usize> = (0..500).collect();
    do_all_mut_steal(&pool, &mut items, 8, |item| *item *= 2);
    assert!(items.iter().enumerate().all(|(i, &v)| v == 2 * i));
}

#[test]
fn test_reducers_after_barrier() {
    let pool = Threads::NumThreads(4).build();
    let sum = Sum::<usize>::new(&pool);
    let float_sum = FloatSum::new(&pool);
    let max = Max::<u32>::new(&pool);
    let any = LogicalOr::new(&pool);

    do_all_steal(&pool, 256, 16, |i| {
        sum.update(i);
        float_sum.update(i as f64 / 2.0);
        max.update(i as u32);
        any.update(i == 255);
    });

    assert_eq!(sum.reduce(), 255 * 256 / 2);
    assert!((float_sum.reduce() - 255.0 * 256.0 / 4.0).abs() < 1E-9);
    assert_eq!(max.reduce(), Some(255));
    assert!(any.reduce());

    sum.reset();
    float_sum.reset();
    max.reset();
    any.reset();
    assert_eq!(sum.reduce(), 0);
    assert_eq!(float_sum.reduce(), 0.0);
    assert_eq!(max.reduce(), None);
    assert!(!any.reduce());
}

#[test]
fn test_reducer_updates_outside_pool() {
    let pool = Threads::NumThreads(2).build();
    let sum = Sum::<usize>::new(&pool);
    // The calling thread gets its own slot.
    sum.update(5);
    do_all(&pool, 10, |_| sum.update(1));
    assert_eq!(sum.reduce(), 15);
}
