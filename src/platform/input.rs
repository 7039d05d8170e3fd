//! Input queue
//!
//! Devices push requests at any time; the frame driver hands them to the
//! next tick in arrival order. The tick itself enforces the cooldown.

use std::collections::VecDeque;

use crate::sim::{Ability, InputRequest, TickInput};

/// Requests beyond this many are dropped until the next tick
const QUEUE_LIMIT: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    pending: VecDeque<InputRequest>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: InputRequest) {
        if self.pending.len() >= QUEUE_LIMIT {
            log::debug!("Input queue full, dropping {:?}", request);
            return;
        }
        self.pending.push_back(request);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Everything queued so far, as input for one tick
    pub fn take(&mut self) -> TickInput {
        TickInput {
            requests: self.pending.drain(..).collect(),
        }
    }
}

/// Keyboard mapping shared by the browser and native front ends
pub fn request_for_key(key: &str) -> Option<InputRequest> {
    let request = match key {
        "ArrowUp" | "w" | "W" => InputRequest::forward(),
        "ArrowDown" | "s" | "S" => InputRequest::back(),
        "ArrowLeft" | "a" | "A" => InputRequest::left(),
        "ArrowRight" | "d" | "D" => InputRequest::right(),
        "Shift" => InputRequest::Dash { dx: 0.0, dz: 1.0 },
        "e" | "E" => InputRequest::Ability(Ability::Tongue),
        "q" | "Q" => InputRequest::Ability(Ability::Croak),
        _ => return None,
    };
    Some(request)
}
