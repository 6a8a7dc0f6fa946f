pub mod asm;

use engine::TeachingEngine;
use rvdebug::config::SessionConfig;
use rvdebug::debugger::{
    AssembleError, DebugState, Debugger, DebuggerBuilder, EventHook, Register, Status,
};
use std::cell::RefCell;
use std::sync::{Arc, Once};

#[derive(Clone, Default)]
pub struct TestInfo {
    pub statuses: Arc<RefCell<Vec<Status>>>,
    pub assemble_errors: Arc<RefCell<Vec<AssembleError>>>,
}

#[derive(Default)]
pub struct TestHooks {
    info: TestInfo,
}

impl TestHooks {
    pub fn new(info: TestInfo) -> Self {
        Self { info }
    }
}

impl EventHook for TestHooks {
    fn on_state_change(&self, state: &DebugState) {
        self.info.statuses.borrow_mut().push(state.status());
    }

    fn on_assemble_error(&self, error: &AssembleError) {
        self.info.assemble_errors.borrow_mut().push(error.clone());
    }
}

pub fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn debugger_with(info: TestInfo, config: SessionConfig) -> Debugger<TeachingEngine> {
    init_logger();
    DebuggerBuilder::new()
        .with_hooks(TestHooks::new(info))
        .with_config(config)
        .build(TeachingEngine::instantiate)
}

pub fn debugger(info: TestInfo) -> Debugger<TeachingEngine> {
    debugger_with(info, SessionConfig::default())
}

pub fn reg(dbg: &Debugger<TeachingEngine>, name: &str) -> u32 {
    let register = Register::from_name(name).unwrap();
    dbg.read_register(register).unwrap()
}

pub fn pc(dbg: &Debugger<TeachingEngine>) -> u32 {
    dbg.state().snapshot().unwrap().pc
}

pub fn console(dbg: &Debugger<TeachingEngine>) -> String {
    dbg.state().snapshot().unwrap().console.clone()
}

#[macro_export]
macro_rules! assert_status {
    ($dbg:expr, $status:expr) => {
        assert_eq!($dbg.status(), $status, "state: {:?}", $dbg.state())
    };
}
