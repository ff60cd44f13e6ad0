//! Name-based command and event factories.
//!
//! A registry maps names to types that deserialize from the untyped payload
//! with `serde_json`. Registering `Deposit` under `"account/deposit"` makes
//! `new_command("account/deposit", json!({"amount": 5}))` return a boxed
//! `Deposit`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::command::{Command, CommandFactory};
use crate::error::BoxError;
use crate::event::{Event, EventFactory};

/// Errors raised by [`CommandRegistry`] and [`EventRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("name already registered: {0}")]
    AlreadyRegistered(String),

    /// The payload did not deserialize into the registered type.
    #[error("invalid payload for {name}: {source}")]
    InvalidPayload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

type Constructor<T> = Box<dyn Fn(Value) -> Result<T, serde_json::Error> + Send + Sync>;

struct Constructors<T> {
    by_name: HashMap<String, Constructor<T>>,
}

impl<T> Default for Constructors<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }
}

impl<T> Constructors<T> {
    fn insert(&mut self, name: String, constructor: Constructor<T>) -> Result<(), RegistryError> {
        match self.by_name.entry(name) {
            Entry::Occupied(entry) => Err(RegistryError::AlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(constructor);
                Ok(())
            }
        }
    }

    /// Returns `None` when `name` is unknown.
    fn build(&self, name: &str, data: Value) -> Option<Result<T, RegistryError>> {
        let constructor = self.by_name.get(name)?;
        Some(
            constructor(data).map_err(|source| RegistryError::InvalidPayload {
                name: name.to_string(),
                source,
            }),
        )
    }

    fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A [`CommandFactory`] backed by registered command types.
pub struct CommandRegistry<A> {
    commands: Constructors<Box<dyn Command<A>>>,
}

impl<A: 'static> CommandRegistry<A> {
    pub fn new() -> Self {
        Self {
            commands: Constructors::default(),
        }
    }

    /// Registers `C` under `name`.
    pub fn register<C>(&mut self, name: impl Into<String>) -> Result<&mut Self, RegistryError>
    where
        C: Command<A> + DeserializeOwned + 'static,
    {
        self.commands.insert(
            name.into(),
            Box::new(|data| {
                serde_json::from_value::<C>(data)
                    .map(|command| Box::new(command) as Box<dyn Command<A>>)
            }),
        )?;
        Ok(self)
    }

    /// Returns the registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.commands.names()
    }
}

impl<A: 'static> Default for CommandRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> CommandFactory<A> for CommandRegistry<A> {
    type Command = Box<dyn Command<A>>;

    fn new_command(&self, name: &str, data: Value) -> Result<Self::Command, BoxError> {
        match self.commands.build(name, data) {
            Some(built) => Ok(built?),
            None => Err(RegistryError::UnknownCommand(name.to_string()).into()),
        }
    }
}

/// An [`EventFactory`] backed by registered event types.
pub struct EventRegistry<A> {
    events: Constructors<Box<dyn Event<A>>>,
}

impl<A: 'static> EventRegistry<A> {
    pub fn new() -> Self {
        Self {
            events: Constructors::default(),
        }
    }

    /// Registers `E` under `name`.
    pub fn register<E>(&mut self, name: impl Into<String>) -> Result<&mut Self, RegistryError>
    where
        E: Event<A> + DeserializeOwned + 'static,
    {
        self.events.insert(
            name.into(),
            Box::new(|data| {
                serde_json::from_value::<E>(data)
                    .map(|event| Box::new(event) as Box<dyn Event<A>>)
            }),
        )?;
        Ok(self)
    }

    /// Returns the registered event names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.events.names()
    }
}

impl<A: 'static> Default for EventRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> EventFactory<A> for EventRegistry<A> {
    type Event = Box<dyn Event<A>>;

    fn new_event(&self, name: &str, data: Value) -> Result<Self::Event, BoxError> {
        match self.events.build(name, data) {
            Some(built) => Ok(built?),
            None => Err(RegistryError::UnknownEvent(name.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::aggregate::AggregateRef;
    use crate::context::CommandContext;
    use crate::fakes::{Counter, incremented};
    use crate::record::EventRecord;

    #[derive(Debug, Deserialize)]
    struct Bump {
        by: i64,
    }

    impl Command<Counter> for Bump {
        fn is_valid(&self) -> bool {
            self.by > 0
        }

        fn execute(
            &self,
            aggregate: &AggregateRef<Counter>,
            _context: &CommandContext,
        ) -> Result<Vec<EventRecord<Counter>>, BoxError> {
            Ok(vec![incremented(aggregate, self.by)])
        }
    }

    #[derive(Debug, Deserialize)]
    struct Incremented {
        by: i64,
    }

    impl Event<Counter> for Incremented {
        fn is_valid(&self) -> bool {
            true
        }

        fn apply(&self, record: &EventRecord<Counter>) {
            record.aggregate().update(|c| c.value += self.by);
        }
    }

    #[test]
    fn builds_registered_command_from_payload() {
        let mut registry = CommandRegistry::<Counter>::new();
        registry.register::<Bump>("counter/bump").unwrap();

        let command = registry.new_command("counter/bump", json!({"by": 4})).unwrap();
        assert!(command.is_valid());

        let counter = AggregateRef::new(Counter::default());
        let records = command.execute(&counter, &CommandContext::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data(), &json!({"by": 4}));
    }

    #[test]
    fn builds_registered_event_and_applies_it() {
        let mut registry = EventRegistry::<Counter>::new();
        registry.register::<Incremented>("counter/incremented").unwrap();

        let counter = AggregateRef::new(Counter::default());
        let record = incremented(&counter, 6);
        let event = registry
            .new_event(record.name(), record.data().clone())
            .unwrap();
        event.apply(&record);

        assert_eq!(counter.read().value, 6);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = CommandRegistry::<Counter>::new();
        let err = registry.new_command("counter/reset", json!({})).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::UnknownCommand(name)) if name == "counter/reset"
        ));

        let events = EventRegistry::<Counter>::new();
        let err = events.new_event("counter/reset", json!({})).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::UnknownEvent(_))
        ));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let mut registry = CommandRegistry::<Counter>::new();
        registry.register::<Bump>("counter/bump").unwrap();

        let err = registry
            .new_command("counter/bump", json!({"by": "lots"}))
            .unwrap_err();
        match err.downcast_ref::<RegistryError>() {
            Some(RegistryError::InvalidPayload { name, .. }) => assert_eq!(name, "counter/bump"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = EventRegistry::<Counter>::new();
        registry
            .register::<Incremented>("counter/incremented")
            .unwrap()
            .register::<Incremented>("counter/other")
            .unwrap();

        let err = registry
            .register::<Incremented>("counter/incremented")
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RegistryError::AlreadyRegistered(name) if name == "counter/incremented"
        ));
        assert_eq!(registry.names(), vec!["counter/incremented", "counter/other"]);
    }
}
