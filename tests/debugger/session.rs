use crate::common::engine::TeachingEngine;
use crate::common::{console, debugger, init_logger, reg, TestInfo};
use crate::{assert_status, CALL_PROG};
use rvdebug::debugger::memory::LinearMemory;
use rvdebug::debugger::{
    DebugState, DebuggerBuilder, Error, Register, Status, MAX_MEMORY_READ,
};

const SUM_PROG: &str = "main:
    li a0, 5
    li a1, 7
    add a0, a0, a1
    emu_exit
";

const PRINT_PROG: &str = "main:
    li a0, 72   # 'H'
    li a7, 11
    ecall
    li a0, 105
    ecall
    li a0, 42
    li a7, 1
    ecall
    emu_exit
";

const STORE_PROG: &str = "main:
    li t0, 0x10000000
    li t1, 0x11223344
    sw t1, 4(t0)
    emu_exit
";

const BROKEN_PROG: &str = "main:
    li a0, 1
    j nowhere
";

#[test]
fn test_run_to_exit() {
    let info = TestInfo::default();
    let mut debugger = debugger(info.clone());

    debugger.run(SUM_PROG).unwrap();
    assert_status!(debugger, Status::Stopped);
    assert_eq!(reg(&debugger, "a0"), 12);
    assert_eq!(console(&debugger), "Program exited\n");
    assert_eq!(*info.statuses.borrow(), vec![Status::Running, Status::Stopped]);

    let snapshot = debugger.state().snapshot().unwrap();
    assert_eq!(snapshot.version, 2);
    assert_eq!(debugger.version(), 2);
    assert_eq!(snapshot.instructions, 5);
}

#[test]
fn test_rerun_starts_from_scratch() {
    let mut debugger = debugger(TestInfo::default());

    debugger.run(PRINT_PROG).unwrap();
    let first = debugger.state().clone();
    debugger.run(PRINT_PROG).unwrap();

    assert_eq!(console(&debugger), "Hi42\nProgram exited\n");
    let (DebugState::Stopped(a), DebugState::Stopped(b)) = (first, debugger.state()) else {
        panic!("both runs must exit");
    };
    assert_eq!(a.instructions, b.instructions);
    assert_eq!(a.registers, b.registers);
    assert!(b.version > a.version);
}

#[test]
fn test_assemble_error() {
    let info = TestInfo::default();
    let mut debugger = debugger(info.clone());

    let err = debugger.run(BROKEN_PROG).unwrap_err();
    let Error::Assemble(err) = err else {
        panic!("expect assemble error");
    };
    assert_eq!(err.line, 3);
    assert_eq!(err.message, "undefined label `nowhere`");
    assert_eq!(err.to_string(), "line 3: undefined label `nowhere`");

    assert_status!(debugger, Status::Idle);
    assert_eq!(info.assemble_errors.borrow().len(), 1);
    assert_eq!(*info.statuses.borrow(), vec![Status::Idle]);
    assert!(matches!(
        debugger.read_register(Register::A0),
        Err(Error::NotAssembled)
    ));
}

#[test]
fn test_assemble_error_ends_debug_session() {
    let mut debugger = debugger(TestInfo::default());
    debugger.start_debug(CALL_PROG).unwrap();
    assert_status!(debugger, Status::Debug);

    assert!(debugger.start_debug(BROKEN_PROG).is_err());
    assert_status!(debugger, Status::Idle);
    assert!(debugger.backtrace().is_none());
}

#[test]
fn test_quit() {
    let info = TestInfo::default();
    let mut debugger = debugger(info.clone());

    debugger.quit();
    assert_eq!(debugger.version(), 0);

    debugger.start_debug(CALL_PROG).unwrap();
    debugger.step_into().unwrap();
    debugger.quit();
    assert_status!(debugger, Status::Idle);
    assert_eq!(
        *info.statuses.borrow(),
        vec![Status::Debug, Status::Debug, Status::Idle]
    );
    assert!(matches!(
        debugger.read_memory(0x1000_0000, 4),
        Err(Error::NotAssembled)
    ));
}

#[test]
fn test_lint() {
    let info = TestInfo::default();
    let mut debugger = debugger(info.clone());

    assert_eq!(debugger.lint(SUM_PROG).unwrap(), None);
    assert_status!(debugger, Status::Idle);

    let err = debugger.lint(BROKEN_PROG).unwrap().unwrap();
    assert_eq!(err.line, 3);
    // same text again, answered from cache
    assert_eq!(debugger.lint(BROKEN_PROG).unwrap(), Some(err));
    assert_eq!(info.assemble_errors.borrow().len(), 1);
}

#[test]
fn test_lint_skipped_while_debugging() {
    let info = TestInfo::default();
    let mut debugger = debugger(info.clone());
    debugger.start_debug(CALL_PROG).unwrap();
    debugger.step_into().unwrap();

    assert_eq!(debugger.lint(BROKEN_PROG).unwrap(), None);
    assert_status!(debugger, Status::Debug);
    assert!(info.assemble_errors.borrow().is_empty());

    // session untouched
    debugger.step_into().unwrap();
    assert_eq!(debugger.current_line(), Some(7));
}

#[test]
fn test_lint_after_stop_drops_session() {
    let info = TestInfo::default();
    let mut debugger = debugger(info.clone());
    debugger.run(SUM_PROG).unwrap();
    assert_status!(debugger, Status::Stopped);

    // new build replaces the stopped program
    assert_eq!(debugger.lint(PRINT_PROG).unwrap(), None);
    assert_status!(debugger, Status::Idle);
    assert!(debugger.state().snapshot().is_none());
    assert!(matches!(
        debugger.read_memory(0x1000_0000, 4),
        Err(Error::NotAssembled)
    ));
    assert!(info.assemble_errors.borrow().is_empty());
}

#[test]
fn test_console_output() {
    let mut debugger = debugger(TestInfo::default());

    debugger.run(PRINT_PROG).unwrap();
    assert_eq!(console(&debugger), "Hi42\nProgram exited\n");
}

#[test]
fn test_memory_and_last_write() {
    let mut debugger = debugger(TestInfo::default());
    debugger.start_debug(STORE_PROG).unwrap();

    // lui+addi, lui+addi, sw
    for _ in 0..5 {
        debugger.step_into().unwrap();
    }
    let snapshot = debugger.state().snapshot().unwrap();
    assert_eq!(snapshot.last_write.memory, Some((0x1000_0004, 4)));
    assert_eq!(snapshot.last_write.register, None);
    assert_eq!(
        debugger.read_memory(0x1000_0004, 4).unwrap(),
        vec![0x44, 0x33, 0x22, 0x11]
    );

    // unmapped target memory reads as zero
    assert_eq!(debugger.read_memory(0x100, 2).unwrap(), vec![0, 0]);
}

#[test]
fn test_memory_read_limit() {
    let mut debugger = debugger(TestInfo::default());
    debugger.run(STORE_PROG).unwrap();

    assert!(matches!(
        debugger.read_memory(0x1000_0000, 0xffff_ffff),
        Err(Error::MemoryReadTooLarge {
            len: 0xffff_ffff,
            max: MAX_MEMORY_READ
        })
    ));
    // not fatal
    assert_status!(debugger, Status::Stopped);

    let bytes = debugger.read_memory(0x1000_0000, MAX_MEMORY_READ).unwrap();
    assert_eq!(bytes.len(), MAX_MEMORY_READ);
    assert_eq!(&bytes[4..8], &[0x44, 0x33, 0x22, 0x11]);
}

#[test]
fn test_engine_load_failure() {
    init_logger();
    let mut debugger = DebuggerBuilder::new().build(
        |_: &mut LinearMemory| -> anyhow::Result<TeachingEngine> {
            Err(anyhow::anyhow!("module not found"))
        },
    );

    assert!(matches!(debugger.run(SUM_PROG), Err(Error::EngineLoad(_))));
    assert_status!(debugger, Status::Idle);
    assert!(matches!(
        debugger.start_debug(SUM_PROG),
        Err(Error::EngineLoad(_))
    ));
}
