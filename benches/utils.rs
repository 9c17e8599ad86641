use criterion::Criterion;
use std::time::Duration;

/// Criterion setup shared by the conversion benchmarks. On unix, each benchmark is also profiled
/// into a flamegraph when run with `--profile-time`.
pub fn criterion() -> Criterion {
    let c = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(3))
        .configure_from_args();
    #[cfg(unix)]
    let c = {
        use pprof::criterion::{Output, PProfProfiler};
        c.with_profiler(PProfProfiler::new(997, Output::Flamegraph(None)))
    };
    c
}
