use super::{BreakpointCommand, Command, CommandError, CommandResult};

pub const RUN_COMMAND: &str = "run";
pub const RUN_COMMAND_SHORT: &str = "r";
pub const DEBUG_COMMAND: &str = "debug";
pub const DEBUG_COMMAND_SHORT: &str = "d";
pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const STEP_INTO_COMMAND: &str = "stepinto";
pub const STEP_INTO_COMMAND_SHORT: &str = "step";
pub const STEP_OVER_COMMAND: &str = "stepover";
pub const STEP_OVER_COMMAND_SHORT: &str = "next";
pub const STEP_OUT_COMMAND: &str = "stepout";
pub const STEP_OUT_COMMAND_SHORT: &str = "finish";
pub const BREAK_COMMAND: &str = "break";
pub const BREAK_COMMAND_SHORT: &str = "b";
pub const DELETE_COMMAND: &str = "delete";
pub const REGISTER_COMMAND: &str = "register";
pub const REGISTER_COMMAND_SHORT: &str = "reg";
pub const MEMORY_COMMAND: &str = "memory";
pub const MEMORY_COMMAND_SHORT: &str = "mem";
pub const BACKTRACE_COMMAND: &str = "backtrace";
pub const BACKTRACE_COMMAND_SHORT: &str = "bt";
pub const QUIT_COMMAND: &str = "quit";
pub const QUIT_COMMAND_SHORT: &str = "q";

/// Bytes shown by `memory <addr>` without explicit length.
pub const DEFAULT_MEMORY_LEN: usize = 64;

use chumsky::error::Rich;
use chumsky::prelude::{choice, end, just};
use chumsky::{extra, text, Boxed, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

pub fn hex<'a>() -> impl chumsky::Parser<'a, &'a str, u32, Err<'a>> + Clone {
    let prefix = just("0x").or(just("0X"));
    prefix
        .ignore_then(
            text::digits(16)
                .at_least(1)
                .to_slice()
                .try_map(|s: &str, span| {
                    u32::from_str_radix(s, 16).map_err(|e| Rich::custom(span, e))
                }),
        )
        .padded()
        .labelled("hexidecimal number")
}

pub fn decimal<'a>() -> impl chumsky::Parser<'a, &'a str, u32, Err<'a>> + Clone {
    text::int(10)
        .try_map(|s: &str, span| s.parse::<u32>().map_err(|e| Rich::custom(span, e)))
        .padded()
        .labelled("decimal number")
}

/// Hexadecimal with `0x` prefix or decimal.
pub fn number<'a>() -> impl chumsky::Parser<'a, &'a str, u32, Err<'a>> + Clone {
    choice((hex(), decimal()))
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: chumsky::Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse input string into command.
    pub fn parse(input: &str) -> CommandResult<Command> {
        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|errors| {
                let message = errors
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                CommandError::Parsing(message)
            })
    }

    fn parser<'a>() -> impl chumsky::Parser<'a, &'a str, Command, Err<'a>> {
        let op = |sym| just(sym).padded();
        let op2 = |full, short| op(full).or(op(short));

        let run = op2(RUN_COMMAND, RUN_COMMAND_SHORT).to(Command::Run);
        let debug = op2(DEBUG_COMMAND, DEBUG_COMMAND_SHORT).to(Command::StartDebug);
        let r#continue = op2(CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT).to(Command::Continue);
        let step_into = op2(STEP_INTO_COMMAND, STEP_INTO_COMMAND_SHORT).to(Command::StepInto);
        let step_over = op2(STEP_OVER_COMMAND, STEP_OVER_COMMAND_SHORT).to(Command::StepOver);
        let step_out = op2(STEP_OUT_COMMAND, STEP_OUT_COMMAND_SHORT).to(Command::StepOut);
        let backtrace = op2(BACKTRACE_COMMAND, BACKTRACE_COMMAND_SHORT).to(Command::PrintBacktrace);
        let quit = op2(QUIT_COMMAND, QUIT_COMMAND_SHORT).to(Command::Quit);

        let r#break = op2(BREAK_COMMAND, BREAK_COMMAND_SHORT)
            .ignore_then(number().or_not())
            .map(|line| match line {
                Some(line) => Command::Breakpoint(BreakpointCommand::Add(line)),
                None => Command::Breakpoint(BreakpointCommand::Info),
            })
            .boxed();

        let delete = op(DELETE_COMMAND)
            .ignore_then(number())
            .map(|line| Command::Breakpoint(BreakpointCommand::Remove(line)))
            .boxed();

        let register = op2(REGISTER_COMMAND, REGISTER_COMMAND_SHORT)
            .ignore_then(text::ident().padded().or_not())
            .map(|name: Option<&str>| Command::PrintRegister(name.map(ToOwned::to_owned)))
            .boxed();

        let memory = op2(MEMORY_COMMAND, MEMORY_COMMAND_SHORT)
            .ignore_then(number().then(number().or_not()))
            .map(|(addr, len)| Command::PrintMemory {
                addr,
                len: len.map(|len| len as usize).unwrap_or(DEFAULT_MEMORY_LEN),
            })
            .boxed();

        choice((
            command(RUN_COMMAND, run),
            command(DEBUG_COMMAND, debug),
            command(CONTINUE_COMMAND, r#continue),
            command(STEP_INTO_COMMAND, step_into),
            command(STEP_OVER_COMMAND, step_over),
            command(STEP_OUT_COMMAND, step_out),
            command(BACKTRACE_COMMAND, backtrace),
            command(BREAK_COMMAND, r#break),
            command(DELETE_COMMAND, delete),
            command(REGISTER_COMMAND, register),
            command(MEMORY_COMMAND, memory),
            command(QUIT_COMMAND, quit),
        ))
        .map_err(|e| {
            let span = e.span();
            if span.start == 0 && span.end == 0 {
                Rich::custom(*e.span(), "unknown command")
            } else {
                e
            }
        })
    }
}

#[test]
fn test_hex_parser() {
    struct TestCase {
        string: &'static str,
        result: Result<u32, ()>,
    }
    let cases = vec![
        TestCase {
            string: "0x123AA",
            result: Ok(0x123aa),
        },
        TestCase {
            string: "  0X7fffeff0 ",
            result: Ok(0x7fff_eff0),
        },
        TestCase {
            string: "  0x 123AA ",
            result: Err(()),
        },
        TestCase {
            string: "  123AA ",
            result: Err(()),
        },
        TestCase {
            string: "0x100000000",
            result: Err(()),
        },
    ];

    for tc in cases {
        let expr = hex().parse(tc.string).into_result();
        assert_eq!(expr.map_err(|_| ()), tc.result, "{}", tc.string);
    }
}

#[test]
fn test_number_parser() {
    struct TestCase {
        string: &'static str,
        result: Result<u32, ()>,
    }
    let cases = vec![
        TestCase {
            string: "12",
            result: Ok(12),
        },
        TestCase {
            string: " 0x10 ",
            result: Ok(16),
        },
        TestCase {
            string: "4294967296",
            result: Err(()),
        },
        TestCase {
            string: "twelve",
            result: Err(()),
        },
    ];

    for tc in cases {
        let expr = number().then_ignore(end()).parse(tc.string).into_result();
        assert_eq!(expr.map_err(|_| ()), tc.result, "{}", tc.string);
    }
}

#[test]
fn test_command_parser() {
    struct TestCase {
        inputs: Vec<&'static str>,
        command_matcher: fn(result: CommandResult<Command>),
    }
    let cases = vec![
        TestCase {
            inputs: vec!["next", "stepover", "  next "],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::StepOver),
        },
        TestCase {
            inputs: vec!["finish", "  stepout "],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::StepOut),
        },
        TestCase {
            inputs: vec!["step", "stepinto"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::StepInto),
        },
        TestCase {
            inputs: vec!["c", "continue"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::Continue),
        },
        TestCase {
            inputs: vec!["r", "run"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::Run),
        },
        TestCase {
            inputs: vec!["d", "debug"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::StartDebug),
        },
        TestCase {
            inputs: vec!["q", "quit"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::Quit),
        },
        TestCase {
            inputs: vec!["b 12", "break 0xc", " break  12 "],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(BreakpointCommand::Add(12))
                )
            },
        },
        TestCase {
            inputs: vec!["b", "break"],
            command_matcher: |result| {
                assert_eq!(result.unwrap(), Command::Breakpoint(BreakpointCommand::Info))
            },
        },
        TestCase {
            inputs: vec!["delete 3"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::Breakpoint(BreakpointCommand::Remove(3))
                )
            },
        },
        TestCase {
            inputs: vec!["reg a0", "register a0"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::PrintRegister(Some("a0".to_string()))
                )
            },
        },
        TestCase {
            inputs: vec!["reg", "register"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::PrintRegister(None)),
        },
        TestCase {
            inputs: vec!["mem 0x10000000 16", "memory 0x10000000 0x10"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::PrintMemory {
                        addr: 0x1000_0000,
                        len: 16
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["memory 0x7fffeff0"],
            command_matcher: |result| {
                assert_eq!(
                    result.unwrap(),
                    Command::PrintMemory {
                        addr: 0x7fff_eff0,
                        len: DEFAULT_MEMORY_LEN
                    }
                )
            },
        },
        TestCase {
            inputs: vec!["bt", "backtrace"],
            command_matcher: |result| assert_eq!(result.unwrap(), Command::PrintBacktrace),
        },
        TestCase {
            inputs: vec!["", "jump 4", "b twelve", "next 2", "delete", "mem", "reg a0 a1"],
            command_matcher: |result| {
                assert!(matches!(result.unwrap_err(), CommandError::Parsing(_)))
            },
        },
    ];

    for case in cases {
        for input in case.inputs {
            let result = Command::parse(input);
            (case.command_matcher)(result);
        }
    }
}
