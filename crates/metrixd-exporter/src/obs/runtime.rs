//! Tokio runtime gauges, sampled on every scrape.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{IntGauge, Opts};
use tokio::runtime::Handle;

pub struct TokioRuntimeCollector {
    handle: Handle,
    workers: IntGauge,
    alive_tasks: IntGauge,
    global_queue_depth: IntGauge,
    descs: Vec<Desc>,
}

impl TokioRuntimeCollector {
    pub fn new(handle: Handle) -> prometheus::Result<Self> {
        let workers = IntGauge::with_opts(Opts::new(
            "tokio_runtime_workers",
            "Number of worker threads used by the Tokio runtime.",
        ))?;
        let alive_tasks = IntGauge::with_opts(Opts::new(
            "tokio_runtime_alive_tasks",
            "Number of tasks currently alive in the Tokio runtime.",
        ))?;
        let global_queue_depth = IntGauge::with_opts(Opts::new(
            "tokio_runtime_global_queue_depth",
            "Number of tasks waiting in the Tokio runtime's global queue.",
        ))?;

        let descs = [&workers, &alive_tasks, &global_queue_depth]
            .iter()
            .flat_map(|g| g.desc().into_iter().cloned())
            .collect();

        Ok(Self {
            handle,
            workers,
            alive_tasks,
            global_queue_depth,
            descs,
        })
    }
}

impl Collector for TokioRuntimeCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let m = self.handle.metrics();
        self.workers.set(m.num_workers() as i64);
        self.alive_tasks.set(m.num_alive_tasks() as i64);
        self.global_queue_depth.set(m.global_queue_depth() as i64);

        let mut out = Vec::with_capacity(3);
        out.extend(self.workers.collect());
        out.extend(self.alive_tasks.collect());
        out.extend(self.global_queue_depth.collect());
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reports_worker_count() {
        let c = TokioRuntimeCollector::new(Handle::current()).unwrap();
        assert_eq!(c.desc().len(), 3);

        let families = c.collect();
        let workers = families
            .iter()
            .find(|f| f.get_name() == "tokio_runtime_workers")
            .unwrap();
        assert_eq!(workers.get_metric()[0].get_gauge().get_value(), 2.0);
    }
}
