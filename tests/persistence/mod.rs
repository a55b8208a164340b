use kv_watch::ChangeBroker;
use kv_watch::FileStore;
use kv_watch::KvStore;
use kv_watch::Settings;
use kv_watch::StorageBackend;

use crate::commons::call;
use crate::commons::Recorder;

#[test]
fn test_file_store_state_replays_after_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("prefs.bin");

    {
        let broker = ChangeBroker::new(FileStore::open(&path).unwrap());
        let prefs = broker.scope("prefs.");
        prefs.set("theme", "dark");
        prefs.set_json("recent", &vec!["a.txt", "b.txt"]).unwrap();
    }

    let broker = ChangeBroker::new(FileStore::open(&path).unwrap());
    let prefs = broker.scope("prefs.");
    let recorder = Recorder::default();
    let _watch = prefs.watch("theme", recorder.callback(), true);

    assert_eq!(recorder.calls(), vec![call("theme", Some("dark"), Some("dark"))]);
    assert_eq!(prefs.json::<Vec<String>>("recent"), Some(vec!["a.txt".to_string(), "b.txt".to_string()]));
}

#[test]
fn test_broker_from_settings_clears_file_store() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.storage.backend = StorageBackend::File;
    settings.storage.path = temp_dir.path().join("nested").join("kv.bin");
    let settings = settings.validate().unwrap();

    let broker = ChangeBroker::from_settings(&settings).unwrap();
    broker.root().set("a", "1");
    broker.root().set("b", "2");

    let recorder = Recorder::default();
    let _watch = broker.root().watch("*", recorder.callback(), false);
    broker.store().clear().unwrap();

    assert_eq!(
        recorder.calls(),
        vec![call("a", None, Some("1")), call("b", None, Some("2"))]
    );
    assert!(FileStore::open(&settings.storage.path).unwrap().keys().unwrap().is_empty());
}

#[test]
fn test_metrics_are_exported() {
    let broker = ChangeBroker::new(kv_watch::MemoryStore::new());
    let recorder = Recorder::default();
    let _watch = broker.root().watch("*", recorder.callback(), false);
    broker.root().set("k", "v");

    let text = kv_watch::metrics::gather_metrics();

    assert!(text.contains("kv_watch_events_dispatched"));
    assert!(text.contains("kv_watch_callbacks_invoked"));
    assert_eq!(recorder.len(), 1);
}
