//! Demonstration of per-field subscriptions with an atomic context

use std::sync::Arc;

use context_helper::{aggregate, create_atomic_context_helper, Component, View};

aggregate! {
    #[derive(Debug)]
    pub struct Player => PlayerProps {
        pub track: String,
        pub position: u32,
        pub volume: u8,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Atomic Player Context ===\n");

    let (provider, use_player, channels) = create_atomic_context_helper(
        "Player",
        Player {
            track: "Intro".to_string(),
            position: 0,
            volume: 50,
        },
    );
    for (key, channel) in channels.iter() {
        println!("   field {key:<8} -> {}", channel.label());
    }

    let title = Component::new("Title", {
        let use_player = use_player.clone();
        move || {
            let selected = use_player.select(&["track"]);
            println!("   [Title] {:?}", selected.get::<String>("track"));
            Ok(())
        }
    });
    let progress = Component::new("Progress", {
        let use_player = use_player.clone();
        move || {
            let selected = use_player.select(&["position"]);
            println!("   [Progress] {:?}s", selected.get::<u32>("position"));
            Ok(())
        }
    });
    let mixer = Component::new("Mixer", {
        let use_player = use_player.clone();
        move || {
            // "balance" is not a field: it is logged and comes back undefined.
            let selected = use_player.select(&["volume", "balance"]);
            println!(
                "   [Mixer] volume {:?}, balance defined: {}",
                selected.get::<u8>("volume"),
                selected.is_defined("balance")
            );
            Ok(())
        }
    });
    let children: Vec<Arc<dyn View>> = vec![title.clone(), progress.clone(), mixer.clone()];
    let node = provider.mount(children);

    println!("\n1. First render");
    node.render(PlayerProps::default()).expect("render player");

    println!("\n2. Playback advances: only Progress re-renders");
    for position in [1, 2, 3] {
        node.render(PlayerProps {
            position: Some(position),
            ..Default::default()
        })
        .expect("render player");
    }

    println!("\n3. Volume change: only Mixer re-renders");
    node.render(PlayerProps {
        position: Some(3),
        volume: Some(80),
        ..Default::default()
    })
    .expect("render player");

    println!(
        "\n   Renders: Title {}, Progress {}, Mixer {}",
        title.render_count(),
        progress.render_count(),
        mixer.render_count()
    );
}
