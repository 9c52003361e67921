//! Demonstration of a simple context shared by a settings panel

use context_helper::{aggregate, create_context_helper, Component, ErrorBoundary, View};

aggregate! {
    #[derive(Debug)]
    pub struct Settings => SettingsProps {
        pub theme: String,
        pub font_size: u32,
        pub notifications: bool,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Settings Panel ===\n");

    let (provider, use_settings, channel) = create_context_helper(
        "Settings",
        Settings {
            theme: "light".to_string(),
            font_size: 14,
            notifications: true,
        },
    );
    println!("1. Created {} with channel {}", provider.display_name(), channel.label());

    let preview = Component::new("Preview", {
        let use_settings = use_settings.clone();
        move || {
            let settings = use_settings.use_context()?;
            println!(
                "   [Preview] {} theme at {}px",
                settings.theme, settings.font_size
            );
            Ok(())
        }
    });
    let toggles = Component::new("Toggles", {
        let use_settings = use_settings.clone();
        move || {
            let settings = use_settings.use_context()?;
            println!("   [Toggles] notifications: {}", settings.notifications);
            Ok(())
        }
    });
    let node = provider.mount(vec![preview.clone(), toggles.clone()]);

    println!("\n2. First render mounts both consumers");
    node.render(SettingsProps::default()).expect("render settings");

    println!("\n3. Re-render with identical props: nothing re-renders");
    node.render(SettingsProps::default()).expect("render settings");

    println!("\n4. Switch to the dark theme: every consumer re-renders");
    node.render(SettingsProps {
        theme: Some("dark".to_string()),
        ..Default::default()
    })
    .expect("render settings");

    println!(
        "\n   Preview rendered {} times, Toggles {} times",
        preview.render_count(),
        toggles.render_count()
    );

    println!("\n5. A consumer outside the provider hits the error boundary");
    let orphan = Component::new("Orphan", move || use_settings.use_context().map(|_| ()));
    let boundary = ErrorBoundary::new("App", vec![orphan]);
    boundary.update().expect("boundary never fails");
    if let Some(err) = boundary.last_error() {
        println!("   Caught: {err}");
    }
}
