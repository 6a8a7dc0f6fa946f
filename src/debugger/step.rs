use crate::debugger::breakpoint::TemporaryStop;
use crate::debugger::engine::{Engine, StepOutcome};
use crate::debugger::error::Error;
use crate::debugger::register::Register;
use crate::debugger::state::DebugState;
use crate::debugger::{insn, Debugger};
use crate::rvd_debug;

impl<E: Engine> Debugger<E> {
    fn ensure_debug(&self) -> Result<(), Error> {
        match self.state {
            DebugState::Debug(_) => Ok(()),
            ref state => Err(Error::NotInDebugMode(state.status())),
        }
    }

    /// Publish the snapshot of a finished operation. The temporary stop
    /// never outlives the operation that set it.
    pub(super) fn settle(&mut self, outcome: StepOutcome) -> Result<(), Error> {
        self.temporary = None;
        let state = match outcome {
            StepOutcome::Continuing => DebugState::Debug(self.capture(true)?),
            StepOutcome::Stopped => DebugState::Stopped(self.capture(false)?),
            StepOutcome::Fault(err) => DebugState::Error(self.capture(true)?, err),
        };
        self.transition(state);
        Ok(())
    }

    /// Execute until exit or fault, breakpoints are not consulted.
    pub(super) fn run_free(&mut self) -> Result<StepOutcome, Error> {
        loop {
            match self.binding.step()? {
                StepOutcome::Continuing => continue,
                outcome => return Ok(outcome),
            }
        }
    }

    /// Execute until exit, fault, a breakpoint or the temporary stop.
    fn run_to_stop(&mut self) -> Result<StepOutcome, Error> {
        loop {
            let outcome = self.binding.step()?;
            if outcome != StepOutcome::Continuing {
                return Ok(outcome);
            }

            let pc = self.binding.pc()?;
            if let Some(stop) = self.temporary {
                if stop.matches(pc, self.binding.register(Register::Sp)?) {
                    rvd_debug!("temporary stop reached at {pc:#010x}");
                    return Ok(outcome);
                }
            }
            if self.breakpoints.contains(pc) {
                rvd_debug!("breakpoint reached at {pc:#010x}");
                return Ok(outcome);
            }
        }
    }

    /// Execute exactly one instruction.
    pub fn step_into(&mut self) -> Result<(), Error> {
        self.ensure_debug()?;
        let result = self.step_into_inner();
        self.guard(result)
    }

    fn step_into_inner(&mut self) -> Result<(), Error> {
        self.rebuild_breakpoints();
        let outcome = self.binding.step()?;
        self.settle(outcome)
    }

    /// Step program, proceeding through subroutine calls.
    ///
    /// If the current instruction is a call, run until control returns to the
    /// next instruction in the same stack frame (the stack pointer must match,
    /// so a recursive call passing the same address does not stop). Any other
    /// instruction is a single step.
    pub fn step_over(&mut self) -> Result<(), Error> {
        self.ensure_debug()?;
        let result = self.step_over_inner();
        self.guard(result)
    }

    fn step_over_inner(&mut self) -> Result<(), Error> {
        self.rebuild_breakpoints();
        let pc = self.binding.pc()?;
        let word = self.binding.load_word(pc, 4)?;

        let outcome = match insn::decode_call(word) {
            Some(call) => {
                self.temporary = Some(TemporaryStop {
                    address: call.return_address(pc),
                    stack_pointer: Some(self.binding.register(Register::Sp)?),
                });
                self.run_to_stop()?
            }
            None => self.binding.step()?,
        };
        self.settle(outcome)
    }

    /// Run until the current function returns to its caller.
    ///
    /// The return address is the one recorded for the innermost call, the live
    /// `ra` value is used when there is no recorded call.
    pub fn step_out(&mut self) -> Result<(), Error> {
        self.ensure_debug()?;
        let result = self.step_out_inner();
        self.guard(result)
    }

    fn step_out_inner(&mut self) -> Result<(), Error> {
        self.rebuild_breakpoints();
        let recorded = self
            .backtrace()
            .and_then(|frames| frames.last())
            .map(|frame| frame.return_address);
        let address = match recorded {
            Some(addr) => addr,
            None => self.binding.register(Register::Ra)?,
        };

        self.temporary = Some(TemporaryStop {
            address,
            stack_pointer: None,
        });
        let outcome = self.run_to_stop()?;
        self.settle(outcome)
    }

    /// Run until the next breakpoint, exit or fault.
    pub fn continue_execution(&mut self) -> Result<(), Error> {
        self.ensure_debug()?;
        let result = self.continue_inner();
        self.guard(result)
    }

    fn continue_inner(&mut self) -> Result<(), Error> {
        self.rebuild_breakpoints();
        let outcome = self.run_to_stop()?;
        self.settle(outcome)
    }
}
