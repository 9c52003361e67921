//! Integration tests for Context Helper

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use context_helper::runtime::ReactiveRuntime;
use context_helper::{
    aggregate, create_atomic_context_helper, create_context_helper, Component, ContextError,
    ErrorBoundary, Selected, View,
};

aggregate! {
    #[derive(Debug)]
    pub struct Document => DocumentProps {
        pub title: String,
        pub words: u32,
        pub saved: bool,
    }
}

fn draft() -> Document {
    Document {
        title: "Untitled".to_string(),
        words: 0,
        saved: false,
    }
}

#[test]
fn simple_context_integration() {
    ReactiveRuntime::scope(|| {
        let (provider, use_document, channel) = create_context_helper("Document", draft());
        assert_eq!(channel.label(), "DocumentContext");

        let titles = Arc::new(Mutex::new(Vec::new()));
        let header = Component::new("Header", {
            let titles = titles.clone();
            move || {
                let document = use_document.use_context()?;
                titles.lock().unwrap().push(document.title);
                Ok(())
            }
        });
        let node = provider.mount(vec![header.clone()]);

        node.render(DocumentProps {
            title: Some("Notes".to_string()),
            ..Default::default()
        })
        .unwrap();
        node.render(DocumentProps {
            title: Some("Notes".to_string()),
            words: Some(12),
            ..Default::default()
        })
        .unwrap();

        // The whole aggregate is one value, so any field change re-renders.
        assert_eq!(header.render_count(), 2);
        assert_eq!(*titles.lock().unwrap(), ["Notes", "Notes"]);
        assert_eq!(node.value().words, 12);
    });
}

#[test]
fn missing_provider_reaches_error_boundary() {
    ReactiveRuntime::scope(|| {
        let (_, use_document, _) = create_context_helper("Document", draft());
        let orphan = Component::new("Orphan", move || use_document.use_context().map(|_| ()));
        let boundary = ErrorBoundary::new("App", vec![orphan.clone()]);

        boundary.update().unwrap();

        assert!(!orphan.is_mounted());
        let err = boundary.last_error().unwrap();
        assert_eq!(err, ContextError::missing_provider("Document"));
        assert_eq!(
            err.to_string(),
            "useDocument must be used within a DocumentProvider"
        );
    });
}

#[test]
fn atomic_context_integration() {
    ReactiveRuntime::scope(|| {
        let (provider, use_document, channels) = create_atomic_context_helper("Document", draft());
        assert_eq!(
            channels.iter().map(|(_, c)| c.label().to_string()).collect::<Vec<_>>(),
            [
                "DocumentContext.title",
                "DocumentContext.words",
                "DocumentContext.saved"
            ]
        );

        let counter = Arc::new(Mutex::new(None::<Selected>));
        let word_count = Component::new("WordCount", {
            let counter = counter.clone();
            let use_document = use_document.clone();
            move || {
                *counter.lock().unwrap() = Some(use_document.select(&["words"]));
                Ok(())
            }
        });
        let save_indicator = Component::new("SaveIndicator", {
            let use_document = use_document.clone();
            move || {
                use_document.select(&["saved"]);
                Ok(())
            }
        });
        let node = provider.mount(vec![word_count.clone(), save_indicator.clone()]);

        node.render(DocumentProps::default()).unwrap();
        for words in 1..=3 {
            node.render(DocumentProps {
                words: Some(words),
                ..Default::default()
            })
            .unwrap();
        }

        assert_eq!(word_count.render_count(), 4);
        assert_eq!(save_indicator.render_count(), 1);
        let selected = counter.lock().unwrap().clone().unwrap();
        assert_eq!(selected.get::<u32>("words"), Some(3));
        assert_eq!(selected.len(), 1);
    });
}

#[test]
fn channel_map_supports_direct_subscription() {
    ReactiveRuntime::scope(|| {
        let (provider, _, channels) = create_atomic_context_helper("Document", draft());
        let saved = channels.typed::<bool>("saved").unwrap();

        let renders = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let watcher = Component::new("Watcher", {
            let renders = renders.clone();
            let last = last.clone();
            move || {
                renders.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = Some(saved.read());
                Ok(())
            }
        });
        let node = provider.mount(vec![watcher]);

        node.render(DocumentProps::default()).unwrap();
        node.render(DocumentProps {
            title: Some("Renamed".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(renders.load(Ordering::SeqCst), 1);

        node.render(DocumentProps {
            saved: Some(true),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(renders.load(Ordering::SeqCst), 2);
        assert_eq!(*last.lock().unwrap(), Some(true));
    });
}

#[test]
fn sibling_providers_are_independent() {
    ReactiveRuntime::scope(|| {
        let (provider, use_document, _) = create_atomic_context_helper("Document", draft());

        let make_reader = |name: &'static str, sink: Arc<Mutex<Option<String>>>| {
            let use_document = use_document.clone();
            Component::new(name, move || {
                *sink.lock().unwrap() = use_document.select(&["title"]).get::<String>("title");
                Ok(())
            })
        };
        let left_title = Arc::new(Mutex::new(None));
        let right_title = Arc::new(Mutex::new(None));
        let left = provider.mount(vec![make_reader("Left", left_title.clone())]);
        let right = provider.mount(vec![make_reader("Right", right_title.clone())]);

        left.render(DocumentProps {
            title: Some("left".to_string()),
            ..Default::default()
        })
        .unwrap();
        right.render(DocumentProps::default()).unwrap();

        assert_eq!(left_title.lock().unwrap().as_deref(), Some("left"));
        assert_eq!(right_title.lock().unwrap().as_deref(), Some("Untitled"));
    });
}

#[test]
fn consumer_reads_enclosing_provider_across_runtimes() {
    let (provider, use_document, _) = create_context_helper("Document", draft());
    let outer_runtime = ReactiveRuntime::new();
    let consumer_runtime = ReactiveRuntime::new();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (reader, elsewhere) = ReactiveRuntime::with_runtime(consumer_runtime, || {
        let reader = Component::new("Reader", {
            let seen = seen.clone();
            move || {
                seen.lock().unwrap().push(use_document.use_context()?.words);
                Ok(())
            }
        });
        // Publishes into the consumer's runtime without enclosing it.
        let elsewhere = provider.mount(vec![]);
        (reader, elsewhere)
    });
    let enclosing = ReactiveRuntime::with_runtime(outer_runtime, || {
        provider.mount(vec![reader.clone()])
    });

    elsewhere
        .render(DocumentProps {
            words: Some(99),
            ..Default::default()
        })
        .unwrap();
    enclosing
        .render(DocumentProps {
            words: Some(5),
            ..Default::default()
        })
        .unwrap();
    enclosing
        .render(DocumentProps {
            words: Some(6),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), [5, 6]);
    assert_eq!(reader.render_count(), 2);
}
