use super::Aggregate;
use crate::channel::Channel;
use crate::component::{Provider, Publisher};
use crate::error::{ContextError, Result};
use crate::runtime::{Frame, ReactiveRuntime};
use std::sync::Arc;

/// Publishes the whole merged aggregate on one channel.
struct WholeValue<A> {
    channel: Channel<A>,
}

impl<A: Aggregate> Publisher<A> for WholeValue<A> {
    fn publish(&self, runtime: &ReactiveRuntime, slot: usize, value: &A) -> Option<Frame> {
        Some(self.channel.publish(runtime, slot, value.clone()))
    }
}

/// Reads the value published by the nearest provider of a simple context.
pub struct ContextAccessor<A> {
    prefix: Arc<str>,
    channel: Channel<A>,
}

impl<A: Aggregate> ContextAccessor<A> {
    /// Read the nearest provider's value.
    ///
    /// Fails with [`ContextError::MissingProvider`] when no provider
    /// encloses the caller, or when the nearest value is unset.
    pub fn use_context(&self) -> Result<A> {
        match self.channel.lookup() {
            Some(value) if !value.is_unset() => Ok(value),
            _ => Err(ContextError::missing_provider(&*self.prefix)),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl<A> Clone for ContextAccessor<A> {
    fn clone(&self) -> Self {
        Self {
            prefix: Arc::clone(&self.prefix),
            channel: self.channel.clone(),
        }
    }
}

/// Create a context that publishes one aggregate value as a unit.
///
/// Returns the provider definition, the accessor, and the channel. The
/// provider publishes `default` merged with its props; every consumer of
/// the accessor re-renders whenever the merged value changes.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use context_helper::{aggregate, create_context_helper, Component, View};
///
/// aggregate! {
///     #[derive(Debug)]
///     pub struct Session => SessionProps {
///         pub user: String,
///         pub admin: bool,
///     }
/// }
///
/// let (provider, use_session, channel) =
///     create_context_helper("Session", Session { user: "guest".into(), admin: false });
/// assert_eq!(channel.label(), "SessionContext");
///
/// let seen = Arc::new(Mutex::new(None));
/// let consumer = Component::new("Badge", {
///     let seen = seen.clone();
///     move || {
///         *seen.lock().unwrap() = Some(use_session.use_context()?);
///         Ok(())
///     }
/// });
///
/// let node = provider.mount(vec![consumer]);
/// node.render(SessionProps { user: Some("ada".into()), ..Default::default() }).unwrap();
///
/// let session = seen.lock().unwrap().clone().unwrap();
/// assert_eq!(session, Session { user: "ada".into(), admin: false });
/// ```
pub fn create_context_helper<A: Aggregate>(
    prefix: &str,
    default: A,
) -> (Provider<A>, ContextAccessor<A>, Channel<A>) {
    let channel = Channel::new(format!("{prefix}Context"), default.clone());
    let publisher: Arc<dyn Publisher<A>> = Arc::new(WholeValue {
        channel: channel.clone(),
    });
    let provider = Provider::new(format!("{prefix}Provider"), default, vec![publisher]);
    let accessor = ContextAccessor {
        prefix: Arc::from(prefix),
        channel: channel.clone(),
    };

    (provider, accessor, channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, View};
    use std::sync::Mutex;

    crate::aggregate! {
        #[derive(Debug)]
        struct Theme => ThemeProps {
            mode: String,
            contrast: u8,
        }
    }

    fn light() -> Theme {
        Theme {
            mode: "light".to_string(),
            contrast: 1,
        }
    }

    /// Wraps a possibly-empty name; empty counts as unset.
    #[derive(Clone, Debug, Default, PartialEq)]
    struct Name(String);

    impl Aggregate for Name {
        type Props = Option<String>;

        fn merge(&self, props: &Option<String>) -> Self {
            props.clone().map(Name).unwrap_or_else(|| self.clone())
        }

        fn is_unset(&self) -> bool {
            self.0.is_empty()
        }
    }

    fn recording<A: Aggregate>(
        accessor: ContextAccessor<A>,
    ) -> (Arc<Component>, Arc<Mutex<Vec<Result<A>>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let component = Component::new("Consumer", {
            let log = log.clone();
            move || {
                log.lock().unwrap().push(accessor.use_context());
                Ok(())
            }
        });
        (component, log)
    }

    #[test]
    fn labels_follow_prefix() {
        let (provider, accessor, channel) = create_context_helper("Theme", light());
        assert_eq!(channel.label(), "ThemeContext");
        assert_eq!(provider.display_name(), "ThemeProvider");
        assert_eq!(provider.channel_count(), 1);
        assert_eq!(accessor.prefix(), "Theme");
        assert_eq!(channel.default_value(), light());
    }

    #[test]
    fn accessor_without_provider_fails() {
        let (_, accessor, _) = create_context_helper("Theme", light());
        assert_eq!(
            accessor.use_context(),
            Err(ContextError::MissingProvider {
                prefix: "Theme".to_string()
            })
        );
    }

    #[test]
    fn provider_publishes_merged_value() {
        ReactiveRuntime::scope(|| {
            let (provider, accessor, _) = create_context_helper("Theme", light());
            let (consumer, log) = recording(accessor);
            let node = provider.mount(vec![consumer.clone()]);

            node.render(ThemeProps {
                contrast: Some(3),
                ..Default::default()
            })
            .unwrap();

            let expected = Theme {
                mode: "light".to_string(),
                contrast: 3,
            };
            assert_eq!(node.value(), expected);
            assert_eq!(log.lock().unwrap().as_slice(), [Ok(expected)]);
        });
    }

    #[test]
    fn consumers_rerender_only_when_value_changes() {
        ReactiveRuntime::scope(|| {
            let (provider, accessor, _) = create_context_helper("Theme", light());
            let (consumer, log) = recording(accessor);
            let node = provider.mount(vec![consumer.clone()]);

            node.render(ThemeProps::default()).unwrap();
            node.render(ThemeProps::default()).unwrap();
            assert_eq!(consumer.render_count(), 1);

            node.render(ThemeProps {
                mode: Some("dark".to_string()),
                ..Default::default()
            })
            .unwrap();
            assert_eq!(consumer.render_count(), 2);
            assert_eq!(
                log.lock().unwrap().last().cloned(),
                Some(Ok(Theme {
                    mode: "dark".to_string(),
                    contrast: 1
                }))
            );
        });
    }

    #[test]
    fn nearest_provider_wins() {
        ReactiveRuntime::scope(|| {
            let (provider, accessor, _) = create_context_helper("Theme", light());
            let (consumer, log) = recording(accessor);
            let inner = provider.mount(vec![consumer.clone()]);
            inner
                .render(ThemeProps {
                    mode: Some("inner".to_string()),
                    ..Default::default()
                })
                .unwrap();
            log.lock().unwrap().clear();
            consumer.invalidate();

            let outer = provider.mount(vec![inner.clone()]);
            outer
                .render(ThemeProps {
                    mode: Some("outer".to_string()),
                    ..Default::default()
                })
                .unwrap();

            let seen = log.lock().unwrap().clone();
            assert_eq!(
                seen,
                [Ok(Theme {
                    mode: "inner".to_string(),
                    contrast: 1
                })]
            );
        });
    }

    // An unset published value is indistinguishable from a missing
    // provider, so a provider whose merged value is unset still fails.
    #[test]
    fn unset_value_reports_missing_provider_even_under_provider() {
        ReactiveRuntime::scope(|| {
            let (provider, accessor, _) = create_context_helper("Name", Name::default());
            let (consumer, log) = recording(accessor);
            let node = provider.mount(vec![consumer.clone()]);

            node.render(None).unwrap();
            assert_eq!(
                log.lock().unwrap().as_slice(),
                [Err(ContextError::missing_provider("Name"))]
            );

            node.render(Some("ada".to_string())).unwrap();
            assert_eq!(
                log.lock().unwrap().last().cloned(),
                Some(Ok(Name("ada".to_string())))
            );
        });
    }

    #[test]
    fn missing_provider_propagates_from_render() {
        ReactiveRuntime::scope(|| {
            let (_, accessor, _) = create_context_helper("Theme", light());
            let consumer = Component::new("Orphan", move || accessor.use_context().map(|_| ()));
            assert_eq!(
                consumer.update(),
                Err(ContextError::missing_provider("Theme"))
            );
        });
    }
}
