use std::sync::Arc;

use reconcile::{Dispatcher, LogNotifier, Notifier};
use serde::{Deserialize, Serialize};
use stalker_core::{EventFilter, EventType};

use crate::error::{AppError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
}

/// One notification sink. An empty `events` list enables every event type.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

impl NotifierConfig {
    pub fn filter(&self) -> Result<EventFilter> {
        if self.events.is_empty() {
            return Ok(EventFilter::default());
        }
        let events = self
            .events
            .iter()
            .map(|name| {
                EventType::parse(name)
                    .ok_or_else(|| AppError::InvalidInput(format!("unknown event type: {name}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EventFilter::only(&events))
    }
}

pub fn build_dispatcher(notifiers: &[NotifierConfig]) -> Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();
    for config in notifiers {
        let notifier: Arc<dyn Notifier> = match config.kind {
            NotifierKind::Log => Arc::new(LogNotifier),
        };
        dispatcher.add_sink(notifier, config.filter()?);
    }
    Ok(dispatcher)
}
