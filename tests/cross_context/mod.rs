//! Two or more contexts sharing one in-memory backing, as browser tabs share
//! origin storage.

use kv_watch::spawn_remote_listener;
use kv_watch::ChangeBroker;
use kv_watch::MemoryBacking;
use tokio_util::sync::CancellationToken;

use crate::commons::call;
use crate::commons::enable_logger;
use crate::commons::Recorder;

#[tokio::test]
async fn test_listener_delivers_changes_from_other_context() {
    enable_logger();
    let backing = MemoryBacking::new();
    let (writer_store, _writer_rx) = backing.context();
    let (reader_store, reader_rx) = backing.context();
    let writer = ChangeBroker::new(writer_store);
    let reader = ChangeBroker::new(reader_store);

    let seen_by_reader = Recorder::default();
    let seen_by_writer = Recorder::default();
    let _reader_watch = reader.scope("todo:").watch("*", seen_by_reader.callback(), false);
    let _writer_watch = writer.scope("todo:").watch("*", seen_by_writer.callback(), false);

    let token = CancellationToken::new();
    let listener = spawn_remote_listener(reader.clone(), reader_rx, token.clone());

    let todos = writer.scope("todo:");
    todos.set("1", "buy milk");
    todos.set("1", "buy oat milk");
    todos.remove("1");

    assert!(seen_by_reader.wait_for(3).await);
    token.cancel();
    listener.await.unwrap();

    let expected = vec![
        call("1", Some("buy milk"), None),
        call("1", Some("buy oat milk"), Some("buy milk")),
        call("1", None, Some("buy oat milk")),
    ];
    assert_eq!(seen_by_reader.calls(), expected);
    assert_eq!(seen_by_writer.calls(), expected);
}

#[tokio::test]
async fn test_remote_clear_reaches_every_scope() {
    let backing = MemoryBacking::new();
    let (writer_store, _writer_rx) = backing.context();
    let (reader_store, mut reader_rx) = backing.context();
    let writer = ChangeBroker::new(writer_store);
    let reader = ChangeBroker::new(reader_store);

    writer.scope("a:").set("x", "1");
    writer.scope("b:").set("y", "2");
    reader.pump(&mut reader_rx);

    let in_a = Recorder::default();
    let in_b = Recorder::default();
    let _a = reader.scope("a:").watch("*", in_a.callback(), false);
    let _b = reader.scope("b:").watch("*", in_b.callback(), false);

    writer.root().clear();
    assert_eq!(reader.pump(&mut reader_rx), 1);

    assert_eq!(in_a.calls(), vec![call("x", None, Some("1"))]);
    assert_eq!(in_b.calls(), vec![call("y", None, Some("2"))]);
}

#[tokio::test]
async fn test_three_contexts_each_hear_the_others() {
    let backing = MemoryBacking::new();
    let mut tabs = Vec::new();
    for _ in 0..3 {
        let (store, receiver) = backing.context();
        tabs.push((ChangeBroker::new(store), receiver));
    }
    assert_eq!(backing.context_count(), 3);

    let recorders: Vec<Recorder> = (0..3).map(|_| Recorder::default()).collect();
    let _watches: Vec<_> = tabs
        .iter()
        .zip(&recorders)
        .map(|((broker, _), recorder)| broker.watch("", "shared", recorder.callback(), false))
        .collect();

    tabs[0].0.root().set("shared", "from-0");
    for (broker, receiver) in tabs.iter_mut() {
        broker.pump(receiver);
    }

    for recorder in &recorders {
        assert_eq!(recorder.calls(), vec![call("shared", Some("from-0"), None)]);
    }
}
