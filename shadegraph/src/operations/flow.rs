//! Structured selection and loop blocks
//!
//! Both blocks are built eagerly (labels allocated, operands recorded) and
//! written later, when the event registry replays their boundaries.

use spirv_headers::{LoopControl, Op, SelectionControl, Word};

use crate::builder::Builder;
use crate::errors::*;
use crate::graph::Value;
use crate::pointer::Pointer;
use crate::types::TypeName;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum IfState {
    Built,
    HeaderWritten,
    ElseWritten,
    Ended,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct IfBlock {
    pub condition: Value,
    pub then_label: Word,
    pub else_label: Word,
    pub merge_label: Word,
    pub has_else: bool,
    pub state: IfState,
}

impl IfBlock {
    pub fn new(condition: Value, builder: &mut impl Builder) -> Self {
        Self {
            condition,
            then_label: builder.get_id(),
            else_label: builder.get_id(),
            merge_label: builder.get_id(),
            has_else: false,
            state: IfState::Built,
        }
    }

    /// Open the selection and its then block
    pub fn write_begin(&mut self, condition: Word, builder: &mut impl Builder) -> Result<()> {
        if self.state != IfState::Built {
            bail!(ErrorKind::ControlFlow("if header written twice"));
        }

        let false_label = if self.has_else {
            self.else_label
        } else {
            self.merge_label
        };

        builder.push_instruction(
            Op::SelectionMerge,
            &[self.merge_label, SelectionControl::NONE.bits()],
        );
        builder.push_instruction(
            Op::BranchConditional,
            &[condition, self.then_label, false_label],
        );
        builder.push_instruction(Op::Label, &[self.then_label]);

        self.state = IfState::HeaderWritten;
        Ok(())
    }

    /// Close the then block and open the else block
    pub fn write_else(&mut self, builder: &mut impl Builder) -> Result<()> {
        if self.state != IfState::HeaderWritten {
            bail!(ErrorKind::ControlFlow("else block outside of an if"));
        }

        builder.push_instruction(Op::Branch, &[self.merge_label]);
        builder.push_instruction(Op::Label, &[self.else_label]);

        self.state = IfState::ElseWritten;
        Ok(())
    }

    /// Close the selection and continue in its merge block
    pub fn write_end(&mut self, builder: &mut impl Builder) -> Result<()> {
        match self.state {
            IfState::HeaderWritten | IfState::ElseWritten => {}
            _ => bail!(ErrorKind::ControlFlow("end of an if that was not started")),
        }

        builder.push_instruction(Op::Branch, &[self.merge_label]);
        builder.push_instruction(Op::Label, &[self.merge_label]);

        self.state = IfState::Ended;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum LoopState {
    Built,
    StartWritten,
    EndWritten,
}

/// Counting loop over `start..end` with an integer counter variable
#[derive(Copy, Clone, Debug)]
pub(crate) struct ForLoop {
    pub start: Value,
    pub end: Value,
    pub step: Value,
    pub counter: Pointer,

    pub header: Word,
    pub check: Word,
    pub body: Word,
    pub increment: Word,
    pub post: Word,

    pub state: LoopState,
}

impl ForLoop {
    pub fn new(
        start: Value,
        end: Value,
        step: Value,
        counter: Pointer,
        builder: &mut impl Builder,
    ) -> Self {
        Self {
            start,
            end,
            step,
            counter,
            header: builder.get_id(),
            check: builder.get_id(),
            body: builder.get_id(),
            increment: builder.get_id(),
            post: builder.get_id(),
            state: LoopState::Built,
        }
    }

    /// Initialize the counter, write the loop header and the bound check,
    /// and open the body block
    pub fn write_start(
        &mut self,
        start: Word,
        end: Word,
        counter: Word,
        builder: &mut impl Builder,
    ) -> Result<()> {
        if self.state != LoopState::Built {
            bail!(ErrorKind::ControlFlow("loop header written twice"));
        }

        let int_type = builder.register_type(&TypeName::int())?;
        let bool_type = builder.register_type(&TypeName::Bool)?;

        builder.push_instruction(Op::Store, &[counter, start]);
        builder.push_instruction(Op::Branch, &[self.header]);

        // Header
        builder.push_instruction(Op::Label, &[self.header]);
        builder.push_instruction(
            Op::LoopMerge,
            &[self.post, self.increment, LoopControl::NONE.bits()],
        );
        builder.push_instruction(Op::Branch, &[self.check]);

        // Check
        builder.push_instruction(Op::Label, &[self.check]);
        let current = builder.get_id();
        builder.push_instruction(Op::Load, &[int_type, current, counter]);
        let in_range = builder.get_id();
        builder.push_instruction(Op::SLessThan, &[bool_type, in_range, current, end]);
        builder.push_instruction(Op::BranchConditional, &[in_range, self.body, self.post]);

        // Body
        builder.push_instruction(Op::Label, &[self.body]);

        self.state = LoopState::StartWritten;
        Ok(())
    }

    /// Close the body, write the increment block and continue after the loop
    pub fn write_end(&mut self, step: Word, counter: Word, builder: &mut impl Builder) -> Result<()> {
        if self.state != LoopState::StartWritten {
            bail!(ErrorKind::ControlFlow("end of a loop that was not started"));
        }

        let int_type = builder.register_type(&TypeName::int())?;

        builder.push_instruction(Op::Branch, &[self.increment]);

        // Increment
        builder.push_instruction(Op::Label, &[self.increment]);
        let current = builder.get_id();
        builder.push_instruction(Op::Load, &[int_type, current, counter]);
        let next = builder.get_id();
        builder.push_instruction(Op::IAdd, &[int_type, next, current, step]);
        builder.push_instruction(Op::Store, &[counter, next]);
        builder.push_instruction(Op::Branch, &[self.header]);

        // Post
        builder.push_instruction(Op::Label, &[self.post]);

        self.state = LoopState::EndWritten;
        Ok(())
    }

    fn write_jump(&self, target: Word, label: Word, builder: &mut impl Builder) -> Result<()> {
        if self.state != LoopState::StartWritten {
            bail!(ErrorKind::ControlFlow("jump outside of a loop body"));
        }

        // code following the jump is unreachable but still needs a block
        builder.push_instruction(Op::Branch, &[target]);
        builder.push_instruction(Op::Label, &[label]);
        Ok(())
    }

    pub fn write_break(&self, label: Word, builder: &mut impl Builder) -> Result<()> {
        self.write_jump(self.post, label, builder)
    }

    pub fn write_continue(&self, label: Word, builder: &mut impl Builder) -> Result<()> {
        self.write_jump(self.increment, label, builder)
    }
}
