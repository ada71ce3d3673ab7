fn main() {
    println!("Run `cargo test -p pipeline-tests` to execute the end-to-end pipeline tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{DateTime, Local, TimeZone};
    use serde::Deserialize;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use sensorboard_consumers::{
        ChannelSpec, RenderConsumer, ReportConsumer, Series, TextChart, Tick, View, spawn_periodic,
    };
    use sensorboard_history::{ChannelStore, Sample};
    use sensorboard_ingest::{Delivery, IngestError, IngestHandler, Subscriber, delivery_loop};
    use sensorboard_protocol::constants::DEFAULT_TOPICS;

    #[derive(Debug, Deserialize)]
    struct Fixture {
        messages: Vec<FixtureMessage>,
        expected: Expected,
    }

    #[derive(Debug, Deserialize)]
    struct FixtureMessage {
        topic: String,
        payload: String,
    }

    #[derive(Debug, Deserialize)]
    struct Expected {
        accepted: u64,
        discarded: u64,
        defaulted: u64,
        temperature: Vec<f64>,
        humidity: Vec<f64>,
    }

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> Fixture {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn specs() -> Vec<ChannelSpec> {
        vec![
            ChannelSpec::from_topic(DEFAULT_TOPICS[0], "Temperature", "°C").unwrap(),
            ChannelSpec::from_topic(DEFAULT_TOPICS[1], "Humidity", "%").unwrap(),
        ]
    }

    fn values(samples: &[Sample]) -> Vec<f64> {
        samples.iter().map(|s| s.value).collect()
    }

    #[derive(Clone, Default)]
    struct RecordingSubscriber(Arc<Mutex<Vec<String>>>);

    impl Subscriber for RecordingSubscriber {
        fn subscribe(&self, topic: &str) -> Result<(), IngestError> {
            self.0.lock().unwrap().push(topic.to_owned());
            Ok(())
        }
    }

    /// Replays a fixture through the delivery loop and returns the handler.
    async fn replay(fixture: &Fixture, capacity: usize) -> (Arc<IngestHandler>, RecordingSubscriber) {
        let store = Arc::new(ChannelStore::with_capacity(capacity));
        let handler = Arc::new(IngestHandler::new(store));
        let subscriber = RecordingSubscriber::default();
        let (tx, rx) = mpsc::channel(4);

        let ingest = tokio::spawn(delivery_loop(
            Arc::clone(&handler),
            subscriber.clone(),
            DEFAULT_TOPICS.map(String::from).to_vec(),
            rx,
            CancellationToken::new(),
        ));

        tx.send(Delivery::Connected).await.unwrap();
        for m in &fixture.messages {
            tx.send(Delivery::message(m.topic.as_str(), m.payload.as_bytes()))
                .await
                .unwrap();
        }
        drop(tx);
        ingest.await.unwrap();

        (handler, subscriber)
    }

    #[tokio::test]
    async fn fixture_replay_matches_expected_history() {
        let fixture = load_fixture("living_room.json");
        let (handler, subscriber) = replay(&fixture, 100).await;

        let stats = handler.stats();
        assert_eq!(stats.accepted, fixture.expected.accepted);
        assert_eq!(stats.discarded, fixture.expected.discarded);
        assert_eq!(stats.defaulted, fixture.expected.defaulted);

        let store = handler.store();
        assert_eq!(
            values(&store.snapshot("temperature")),
            fixture.expected.temperature
        );
        assert_eq!(values(&store.snapshot("humidity")), fixture.expected.humidity);
        assert_eq!(store.channel_ids(), vec!["humidity", "temperature"]);

        assert_eq!(*subscriber.0.lock().unwrap(), DEFAULT_TOPICS.map(String::from).to_vec());
    }

    #[tokio::test]
    async fn fixture_replay_respects_capacity() {
        let fixture = load_fixture("living_room.json");
        let (handler, _) = replay(&fixture, 2).await;

        let store = handler.store();
        assert_eq!(values(&store.snapshot("temperature")), vec![21.9, 22.1]);
        assert_eq!(values(&store.snapshot("humidity")), vec![0.0, 48.5]);
    }

    #[tokio::test]
    async fn consumers_read_replayed_history() {
        let fixture = load_fixture("living_room.json");
        let (handler, _) = replay(&fixture, 100).await;
        let store = Arc::clone(handler.store());

        let report = ReportConsumer::new(Arc::clone(&store), specs(), Vec::new());
        let line = report.line_at(at(0));
        assert!(
            line.ends_with("Temperature: 22.1 °C | Humidity: 48.5 %"),
            "{line}"
        );

        let chart = TextChart::new(Vec::new(), 40).with_ansi(false);
        let mut render = RenderConsumer::new(store, specs(), chart);
        render.tick();
        let frame = render.frame();
        assert_eq!(frame.len(), 2);
        assert_eq!(values(&frame[0].points), fixture.expected.temperature);
    }

    #[test]
    fn capacity_three_scenario_end_to_end() {
        let handler = IngestHandler::new(Arc::new(ChannelStore::with_capacity(3)));
        let topic = DEFAULT_TOPICS[0];
        for (t, v) in [(1, 20.0), (2, 21.0), (3, 22.0), (4, 23.0)] {
            handler.handle_at(topic, format!(r#"{{"value": {v}}}"#).as_bytes(), at(t));
        }

        let store = handler.store();
        assert_eq!(
            store.snapshot("temperature"),
            vec![
                Sample::new(at(2), 21.0),
                Sample::new(at(3), 22.0),
                Sample::new(at(4), 23.0),
            ]
        );
        assert_eq!(store.latest("temperature"), Some(Sample::new(at(4), 23.0)));
    }

    #[test]
    fn fresh_store_scenario() {
        let store = Arc::new(ChannelStore::new());
        assert!(store.snapshot_all().is_empty());
        assert_eq!(store.latest("humidity"), None);

        let report = ReportConsumer::new(Arc::clone(&store), specs(), Vec::new());
        assert!(report.line_at(at(0)).ends_with("Temperature: N/A °C | Humidity: N/A %"));
    }

    #[test]
    fn independent_stores_do_not_share_state() {
        let a = IngestHandler::new(Arc::new(ChannelStore::new()));
        let b = IngestHandler::new(Arc::new(ChannelStore::new()));

        a.handle(DEFAULT_TOPICS[0], br#"{"value": 19.5}"#);

        assert_eq!(a.store().snapshot("temperature").len(), 1);
        assert!(b.store().snapshot_all().is_empty());
    }

    /// View that checks every frame it is asked to draw.
    struct CheckingView {
        capacity: usize,
        frames: Arc<Mutex<u32>>,
    }

    impl View for CheckingView {
        fn clear(&mut self) {}

        fn draw(&mut self, series: &Series) {
            assert!(!series.points.is_empty());
            assert!(series.points.len() <= self.capacity);
            // Each channel is written in increasing order, so a consistent
            // snapshot is strictly increasing.
            for pair in series.points.windows(2) {
                assert!(pair[0].value < pair[1].value, "torn snapshot");
            }
        }

        fn present(&mut self) -> std::io::Result<()> {
            *self.frames.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn writer_and_consumers_run_concurrently() {
        const CAPACITY: usize = 20;
        const MESSAGES: usize = 2_000;

        let store = Arc::new(ChannelStore::with_capacity(CAPACITY));
        let handler = Arc::new(IngestHandler::new(Arc::clone(&store)));
        let cancel = CancellationToken::new();
        let frames = Arc::new(Mutex::new(0));

        let render = spawn_periodic(
            "render",
            RenderConsumer::new(
                Arc::clone(&store),
                specs(),
                CheckingView {
                    capacity: CAPACITY,
                    frames: Arc::clone(&frames),
                },
            ),
            Duration::from_millis(1),
            cancel.clone(),
        );
        let report = spawn_periodic(
            "report",
            ReportConsumer::new(Arc::clone(&store), specs(), Vec::new()),
            Duration::from_millis(3),
            cancel.clone(),
        );

        let (tx, rx) = mpsc::channel(64);
        let ingest = tokio::spawn(delivery_loop(
            Arc::clone(&handler),
            RecordingSubscriber::default(),
            Vec::new(),
            rx,
            cancel.clone(),
        ));

        for i in 0..MESSAGES {
            let topic = DEFAULT_TOPICS[i % 2];
            tx.send(Delivery::message(topic, format!(r#"{{"value": {i}}}"#)))
                .await
                .unwrap();
            if i % 100 == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        }
        drop(tx);
        ingest.await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        render.await.unwrap();
        let report = report.await.unwrap();

        assert_eq!(handler.stats().accepted, MESSAGES as u64);
        assert!(*frames.lock().unwrap() > 0);
        let temps = store.snapshot("temperature");
        assert_eq!(temps.len(), CAPACITY);
        assert_eq!(temps.last().unwrap().value, (MESSAGES - 2) as f64);
        assert_eq!(
            store.latest("humidity").unwrap().value,
            (MESSAGES - 1) as f64
        );

        let out = String::from_utf8(report.into_inner()).unwrap();
        assert!(out.lines().count() > 0);
    }
}
