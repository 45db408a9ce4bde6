// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Numbered on-screen debug text
//!
//! Entities post text into slots on their [`DebugMessageComponent`]. Each
//! frame the [`DebugMessageSystem`] clears the shared [`DebugBoard`] and
//! copies every posted message onto it. Slots past the board's size are
//! logged and dropped.

use crate::ecs::{ComponentKind, ComponentMask, Entity, FrameContext, System, World};
use crate::error::CoreError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::warn;

/// Messages an entity wants shown, keyed by slot
#[derive(Debug, Clone, Default)]
pub struct DebugMessageComponent {
    messages: BTreeMap<usize, String>,
}

impl DebugMessageComponent {
    /// Create a component with no messages
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text shown in `slot`, replacing any previous text
    pub fn post(&mut self, slot: usize, text: impl Into<String>) {
        self.messages.insert(slot, text.into());
    }

    /// Stop showing `slot`
    pub fn clear_slot(&mut self, slot: usize) {
        self.messages.remove(&slot);
    }

    /// Posted messages in slot order
    pub fn messages(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.messages.iter().map(|(slot, text)| (*slot, text.as_str()))
    }
}

/// Shared view of the current frame's debug text
#[derive(Debug, Clone)]
pub struct DebugBoard(Rc<RefCell<Vec<Option<String>>>>);

impl DebugBoard {
    /// Board with `slots` empty slots
    pub fn new(slots: usize) -> Self {
        DebugBoard(Rc::new(RefCell::new(vec![None; slots])))
    }

    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.0.borrow().len()
    }

    /// Text in `slot`, if any
    pub fn get(&self, slot: usize) -> Option<String> {
        self.0.borrow().get(slot).cloned().flatten()
    }

    /// Copy of every slot
    pub fn snapshot(&self) -> Vec<Option<String>> {
        self.0.borrow().clone()
    }

    fn clear(&self) {
        self.0.borrow_mut().iter_mut().for_each(|slot| *slot = None);
    }

    fn write(&self, slot: usize, text: &str) -> bool {
        match self.0.borrow_mut().get_mut(slot) {
            Some(entry) => {
                *entry = Some(text.to_owned());
                true
            }
            None => false,
        }
    }
}

/// Collects posted messages onto the [`DebugBoard`]
#[derive(Debug)]
pub struct DebugMessageSystem {
    board: DebugBoard,
}

impl DebugMessageSystem {
    /// Create a system writing to a new board of `slots` slots
    pub fn new(slots: usize) -> Self {
        DebugMessageSystem {
            board: DebugBoard::new(slots),
        }
    }

    /// Handle to the board this system writes
    pub fn board(&self) -> DebugBoard {
        self.board.clone()
    }
}

impl System for DebugMessageSystem {
    fn name(&self) -> &str {
        "debug_message"
    }

    fn mask(&self) -> ComponentMask {
        ComponentMask::empty().with(ComponentKind::DebugMessage)
    }

    fn pre_process(&mut self, _world: &mut World, _frame: &FrameContext<'_>) {
        self.board.clear();
    }

    fn process_entity(
        &mut self,
        world: &mut World,
        entity: Entity,
        _frame: &FrameContext<'_>,
    ) -> Result<(), CoreError> {
        let messages = world.require::<DebugMessageComponent>(entity)?;
        for (slot, text) in messages.messages() {
            if !self.board.write(slot, text) {
                warn!(
                    entity = %entity,
                    slot,
                    slots = self.board.slot_count(),
                    "debug_slot_out_of_range"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ButtonStates;
    use crate::ecs::system::run_system;

    #[test]
    fn test_messages_reach_board() {
        let mut world = World::new();
        let mut messages = DebugMessageComponent::new();
        messages.post(1, "vx=3");
        world.spawn().with(messages).id();

        let mut system = DebugMessageSystem::new(4);
        let board = system.board();
        let input = ButtonStates::new();
        let stats = run_system(&mut system, &mut world, &FrameContext::new(0.016, 0, &input));

        assert_eq!(stats.failed, 0);
        assert_eq!(board.get(1).as_deref(), Some("vx=3"));
        assert_eq!(board.get(0), None);
    }

    #[test]
    fn test_out_of_range_slot_is_skipped() {
        let mut world = World::new();
        let mut messages = DebugMessageComponent::new();
        messages.post(0, "ok");
        messages.post(9, "lost");
        world.spawn().with(messages).id();

        let mut system = DebugMessageSystem::new(2);
        let board = system.board();
        let input = ButtonStates::new();
        let stats = run_system(&mut system, &mut world, &FrameContext::new(0.016, 0, &input));

        assert_eq!(stats.processed, 1);
        assert_eq!(board.snapshot(), vec![Some("ok".to_string()), None]);
    }

    #[test]
    fn test_board_cleared_each_frame() {
        let mut world = World::new();
        let mut messages = DebugMessageComponent::new();
        messages.post(0, "once");
        let entity = world.spawn().with(messages).id();

        let mut system = DebugMessageSystem::new(1);
        let board = system.board();
        let input = ButtonStates::new();
        run_system(&mut system, &mut world, &FrameContext::new(0.016, 0, &input));
        world.get_mut::<DebugMessageComponent>(entity).unwrap().clear_slot(0);
        run_system(&mut system, &mut world, &FrameContext::new(0.016, 1, &input));

        assert_eq!(board.get(0), None);
    }
}
