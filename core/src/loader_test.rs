#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::FutureExt;
    use futures::future::BoxFuture;

    use crate::catalog::{FixtureCatalog, FixtureName};
    use crate::context::RunContext;
    use crate::error::FetchError;
    use crate::loader::{LoadResult, Loader, LoaderOptions};
    use crate::sink::{Field, PresentationSink, SinkEvent, TableSink};
    use crate::source::ResourceSource;

    #[derive(Clone)]
    enum Reply {
        Body(String),
        Status(u16),
        Hang,
    }

    /// Source with canned replies that records when each fetch starts and ends.
    struct ScriptedSource {
        replies: HashMap<String, Reply>,
        log: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(replies: &[(&str, Reply)]) -> Self {
            ScriptedSource {
                replies: replies.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                log: Mutex::new(Vec::new()),
            }
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl ResourceSource for ScriptedSource {
        fn locate(&self, slug: &str) -> String {
            format!("mock://{slug}")
        }

        fn fetch<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
            async move {
                self.log.lock().unwrap().push(format!("start {slug}"));
                let reply = self.replies.get(slug).cloned().unwrap_or(Reply::Status(404));
                tokio::time::sleep(Duration::from_millis(5)).await;
                let outcome = match reply {
                    Reply::Body(body) => Ok(body),
                    Reply::Status(code) => Err(FetchError::Status(code)),
                    Reply::Hang => std::future::pending::<Result<String, FetchError>>().await,
                };
                self.log.lock().unwrap().push(format!("end {slug}"));
                outcome
            }
            .boxed()
        }
    }

    fn body(len: usize) -> Reply {
        Reply::Body("x".repeat(len))
    }

    fn context(names: &[&str]) -> RunContext {
        RunContext::new(FixtureCatalog::new(names.iter().copied()).expect("catalog"))
    }

    fn loader() -> Loader {
        Loader::new(LoaderOptions {
            timeout: Duration::from_secs(1),
            pacing: Duration::from_millis(100),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_items_load_strictly_in_catalog_order() {
        let source = ScriptedSource::new(&[("alpha", body(1)), ("beta", body(2)), ("gamma", body(3))]);
        let mut ctx = context(&["alpha", "beta", "gamma"]);
        let mut sink = TableSink::new();

        let report = loader().load_all(&mut ctx, &source, &mut sink).await;

        assert_eq!(
            source.log(),
            vec!["start alpha", "end alpha", "start beta", "end beta", "start gamma", "end gamma"]
        );
        let order: Vec<usize> = report.events.iter().map(|e| e.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_failure_does_not_stop_the_catalog() {
        let source = ScriptedSource::new(&[
            ("alpha", body(10)),
            ("beta", Reply::Status(404)),
            ("gamma", body(10)),
            ("delta", body(10)),
        ]);
        let mut ctx = context(&["alpha", "beta", "gamma", "delta"]);
        let mut sink = TableSink::new();

        let report = loader().load_all(&mut ctx, &source, &mut sink).await;

        assert_eq!(report.loaded_count(), 3);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.events[1].result,
            LoadResult::Failed {
                reason: FetchError::Status(404)
            }
        );
        let beta = FixtureName::new("beta");
        assert!(!ctx.loaded().contains(&beta));
        assert_eq!(sink.field(&Field::size(&beta)), Some("Error"));
        assert!(sink.statuses().contains(&"Please wait. Error loading mock://beta"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_marks_item_failed_and_advances() {
        let source = ScriptedSource::new(&[("alpha", body(4)), ("slow", Reply::Hang), ("gamma", body(6))]);
        let mut ctx = context(&["alpha", "slow", "gamma"]);
        let mut sink = TableSink::new();

        let report = loader().load_all(&mut ctx, &source, &mut sink).await;

        assert_eq!(
            report.events[1].result,
            LoadResult::Failed {
                reason: FetchError::Timeout(Duration::from_secs(1))
            }
        );
        assert!(report.events[2].result.is_loaded());
        assert_eq!(report.total_bytes, 10);
        assert!(sink.statuses().contains(&"Error: time out while loading slow"));
        assert_eq!(source.log(), vec!["start alpha", "end alpha", "start slow", "start gamma", "end gamma"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_bytes_sums_only_successful_items() {
        let source = ScriptedSource::new(&[("a", body(100)), ("b", Reply::Status(500)), ("c", body(250))]);
        let mut ctx = context(&["a", "b", "c"]);
        let mut sink = TableSink::new();

        let report = loader().load_all(&mut ctx, &source, &mut sink).await;

        assert_eq!(report.total_bytes, 350);
        assert_eq!(ctx.totals().total_bytes, 350);
        assert_eq!(sink.field(&Field::TotalSize), Some("0.3"));
        assert_eq!(sink.field(&Field::size(&FixtureName::new("c"))), Some("0.2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_totals_never_include_pending_items() {
        let source = ScriptedSource::new(&[("a", body(100)), ("b", Reply::Status(404)), ("c", body(250))]);
        let mut ctx = context(&["a", "b", "c"]);
        let mut sink = TableSink::new();

        let mut run = loader().begin(&mut ctx, &source, &mut sink);
        let mut running = Vec::new();
        let mut expected = 0u64;
        while let Some(event) = run.step().await {
            if let LoadResult::Loaded { bytes } = event.result {
                expected += bytes as u64;
            }
            running.push(expected);
        }
        assert!(run.is_finished());
        let report = run.finish().await;

        assert_eq!(running, vec![100, 100, 350]);
        assert_eq!(report.total_bytes, 350);
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_disabled_for_whole_load_phase() {
        let source = ScriptedSource::new(&[("a", body(1)), ("b", body(1))]);
        let mut ctx = context(&["a", "b"]);
        let mut sink = TableSink::new();

        loader().load_all(&mut ctx, &source, &mut sink).await;

        let events = sink.events();
        assert_eq!(events.first(), Some(&SinkEvent::Triggers(false)));
        assert_eq!(events.last(), Some(&SinkEvent::Triggers(true)));
        assert_eq!(sink.trigger_events(), vec![false, true]);
        assert_eq!(sink.status(), "Ready.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_after_completion_does_not_reenable_twice() {
        let source = ScriptedSource::new(&[("a", body(1))]);
        let mut ctx = context(&["a"]);
        let mut sink = TableSink::new();

        {
            let mut run = loader().begin(&mut ctx, &source, &mut sink);
            assert!(run.step().await.is_some());
            assert!(run.step().await.is_none());
            assert!(run.step().await.is_none());
        }
        assert_eq!(sink.trigger_events(), vec![false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_replaces_previous_totals() {
        let source = ScriptedSource::new(&[("a", body(100)), ("b", body(28))]);
        let mut ctx = context(&["a", "b"]);
        let mut sink = TableSink::new();
        let loader = loader();

        let first = loader.load_all(&mut ctx, &source, &mut sink).await;
        let second = loader.load_all(&mut ctx, &source, &mut sink).await;

        assert_eq!(first.total_bytes, 128);
        assert_eq!(second.total_bytes, 128);
        assert_eq!(ctx.totals().total_bytes, 128);
        assert_eq!(ctx.loaded().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_progress_and_pacing_applies() {
        let source = ScriptedSource::new(&[("First One", body(1)), ("second", body(1))]);
        let mut ctx = context(&["First One", "second"]);
        let mut sink = TableSink::new();

        let started = tokio::time::Instant::now();
        loader().load_all(&mut ctx, &source, &mut sink).await;

        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(
            sink.statuses(),
            vec!["Please wait. Loading First One (1 of 2)", "Please wait. Loading second (2 of 2)", "Ready."]
        );
        assert_eq!(source.log()[0], "start first-one");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_trait_object_receives_updates() {
        let source = ScriptedSource::new(&[("a", body(2048))]);
        let mut ctx = context(&["a"]);
        let mut table = TableSink::new();
        {
            let sink: &mut dyn PresentationSink = &mut table;
            loader().load_all(&mut ctx, &source, sink).await;
        }
        assert_eq!(table.field(&Field::size(&FixtureName::new("a"))), Some("2.0"));
    }
}
