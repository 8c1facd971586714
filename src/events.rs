use std::collections::VecDeque;

use bevy::log::warn;
use serde::Serialize;

use crate::components::ActorId;

const MAX_EVENTS: usize = 500;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GameEvent {
    pub name: &'static str,
    pub data: serde_json::Value,
    pub frame: u64,
    pub source: Option<ActorId>,
}

/// Bounded log of gameplay events, oldest dropped first.
#[derive(Default, Debug)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    /// Frame of the last overflow warning; one per frame at most.
    warned_on: Option<u64>,
}

impl GameEventBus {
    pub fn emit(&mut self, name: &'static str, data: serde_json::Value, source: Option<ActorId>) {
        if self.recent.len() >= MAX_EVENTS {
            self.recent.pop_front();
            self.dropped_events += 1;
            if self.warned_on != Some(self.frame) {
                self.warned_on = Some(self.frame);
                warn!(
                    "[tileworld events] Log full on frame {}, dropping oldest ({} dropped so far)",
                    self.frame, self.dropped_events
                );
            }
        }
        self.recent.push_back(GameEvent {
            name,
            data,
            frame: self.frame,
            source,
        });
    }

    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a GameEvent> + 'a {
        self.recent.iter().filter(move |e| e.name == name)
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.recent.drain(..).collect()
    }
}
