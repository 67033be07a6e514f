// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use revq_dialect::dialect::Register;

/// Identifies one push of the control stack. Ids are never reused, so a binding
/// made under a frame can tell whether that frame is still open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

#[derive(Clone, Copy, Debug)]
struct Frame {
    id: FrameId,
    control: Register,
}

/// Stack of active control bits. The innermost frame's register already folds in
/// every enclosing condition.
#[derive(Clone, Debug, Default)]
pub struct ControlStack {
    frames: Vec<Frame>,
    next: FrameId,
}

impl ControlStack {
    pub fn push(&mut self, control: Register) -> FrameId {
        let id = self.next;
        self.next = FrameId(id.0 + 1);
        self.frames.push(Frame { id, control });
        id
    }

    pub fn pop(&mut self) -> Option<FrameId> {
        self.frames.pop().map(|frame| frame.id)
    }

    /// The control bit guarding emission, if any.
    #[must_use]
    pub fn current(&self) -> Option<Register> {
        self.frames.last().map(|frame| frame.control)
    }

    #[must_use]
    pub fn frame(&self) -> Option<FrameId> {
        self.frames.last().map(|frame| frame.id)
    }

    #[must_use]
    pub fn is_active(&self, id: FrameId) -> bool {
        self.frames.iter().any(|frame| frame.id == id)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
