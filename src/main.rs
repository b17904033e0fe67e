use balanced_pool::ThreadPool;
use std::time::Instant;

fn main() {
    env_logger::init();

    let pool = ThreadPool::new(0);
    println!("pool size: {}", pool.size());

    let now = Instant::now();
    let handles: Vec<_> = (0..1_000_000u64)
        .map(|i| pool.spawn(move || i).expect("pool shut down"))
        .collect();
    for handle in handles {
        let _ = handle.get();
    }
    println!("elapsed: {:?}", now.elapsed());

    let metrics = pool.metrics();
    println!(
        "spawned: {}, completed: {}, panicked: {}",
        metrics.total_spawned, metrics.completed_tasks, metrics.panicked_tasks
    );
}
